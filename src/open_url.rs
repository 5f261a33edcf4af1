use anyhow::{Context, Result};
use std::process::Command;
use tracing::{info, warn};

/// Host's default handler for URLs that leave the in-app browser.
pub trait ExternalOpener {
    fn open(&self, url: &str) -> Result<()>;
}

pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        info!(url, "opening in system browser");
        if let Err(err) = open::that(url) {
            warn!(url, error = %err, "default handler failed, trying firefox");
            Command::new("firefox")
                .arg(url)
                .spawn()
                .with_context(|| format!("no handler could open {}", url))?;
        }
        Ok(())
    }
}
