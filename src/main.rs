use anyhow::Result;
use console::Term;
use std::env;
use storeez_widget::{config, host};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let mut config_override: Option<String> = None;
    let mut widget_override: Option<String> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_override = args.next(),
            "--widget" => widget_override = args.next(),
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            other => tracing::warn!(arg = other, "ignoring unknown argument"),
        }
    }

    let cfg = config::load(config_override, widget_override)?;
    let _ = Term::stdout().clear_screen();
    host::run(&cfg).await
}

fn print_help() {
    println!("storeez-widget");
    println!("Usage: storeez-widget [--widget <id>] [--config <path>]");
    println!("  --widget <id>    Widget identifier to load (overrides widget_id in config)");
    println!("  --config <path>  Path to a config.toml");
    println!("Set RUST_LOG=debug for verbose logs on stderr.");
}
