//! Navigation policy for the in-app browser surface.

use crate::open_url::ExternalOpener;
use crate::widget::{SelectedUrl, CLOSE_WINDOW_CHANNEL};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    LinkActivated,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Load in the same surface.
    Allow,
    /// Cancelled in the surface and handed to the external handler.
    OpenExternally(Url),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    CloseRequested,
}

pub struct BrowserSession<'a> {
    current: Url,
    intercept_external_links: bool,
    opener: &'a dyn ExternalOpener,
}

impl<'a> BrowserSession<'a> {
    pub fn open(url: &SelectedUrl, intercept_external_links: bool, opener: &'a dyn ExternalOpener) -> Self {
        Self {
            current: url.as_url().clone(),
            intercept_external_links,
            opener,
        }
    }

    pub fn current(&self) -> &Url {
        &self.current
    }

    pub fn on_navigation(&mut self, target: &str, kind: NavigationKind) -> NavigationDecision {
        let target = match self.current.join(target) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => {
                debug!(link = target, "cancelling navigation to unsupported url");
                return NavigationDecision::Cancel;
            }
        };
        let external = target.host_str() != self.current.host_str();
        if kind == NavigationKind::LinkActivated && self.intercept_external_links && external {
            if let Err(err) = self.opener.open(target.as_str()) {
                warn!(url = %target, error = %err, "external handler failed");
            }
            return NavigationDecision::OpenExternally(target);
        }
        self.current = target;
        NavigationDecision::Allow
    }

    /// Handle a message posted by page script. Only `closeWindow` is
    /// recognized; with interception on, an http(s) URL body is opened
    /// externally before the surface closes.
    pub fn on_script_message(&mut self, name: &str, body: &str) -> Option<BrowserEvent> {
        if name != CLOSE_WINDOW_CHANNEL {
            debug!(name, "ignoring script message");
            return None;
        }
        if self.intercept_external_links {
            if let Ok(url) = SelectedUrl::parse(body) {
                if let Err(err) = self.opener.open(url.as_str()) {
                    warn!(url = %url, error = %err, "external handler failed");
                }
            }
        }
        Some(BrowserEvent::CloseRequested)
    }
}
