use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.storeez.app/widget/";
pub const DEFAULT_HOME_URL: &str = "https://google.com";

/// Presentation parameters shared by every widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub image_size: u16,
    pub stroke_color: String,
    pub text_width: u16,
    pub placeholder_asset: String,
    pub intercept_external_links: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            image_size: 100,
            stroke_color: "blue".into(),
            text_width: 100,
            placeholder_asset: "ico_placeholder".into(),
            intercept_external_links: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Unset keeps the HTTP client's default.
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("storeez-widget/", env!("CARGO_PKG_VERSION")).into(),
            connect_timeout_secs: None,
            timeout_secs: None,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub widget_id: Option<String>,
    pub api_base: Option<String>,
    pub home_url: Option<String>,
    pub probe_previews: Option<bool>,
    pub header: Option<String>,
    pub appearance: WidgetConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub widget_id: Option<String>,
    pub api_base: Url,
    pub home_url: String,
    pub probe_previews: bool,
    pub header: Option<String>,
    pub appearance: WidgetConfig,
    pub http: HttpConfig,
}

impl RuntimeConfig {
    fn from_app(parsed: AppConfig) -> Result<Self> {
        let base = parsed.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        let api_base = Url::parse(base).with_context(|| format!("invalid api_base: {}", base))?;
        Ok(Self {
            widget_id: parsed.widget_id,
            api_base,
            home_url: parsed.home_url.unwrap_or_else(|| DEFAULT_HOME_URL.into()),
            probe_previews: parsed.probe_previews.unwrap_or(true),
            header: parsed.header,
            appearance: parsed.appearance,
            http: parsed.http,
        })
    }
}

pub fn parse(txt: &str) -> Result<RuntimeConfig> {
    let parsed: AppConfig = toml::from_str(txt).context("failed to parse toml")?;
    RuntimeConfig::from_app(parsed)
}

/// Resolve configuration from an explicit path, the default location, or
/// built-in defaults, then apply the `--widget` override.
pub fn load(config_override: Option<String>, widget_override: Option<String>) -> Result<RuntimeConfig> {
    let mut cfg = match config_override {
        Some(path_str) => read_file(Path::new(&path_str))?,
        None => match default_config_path() {
            Some(path) if path.is_file() => read_file(&path)?,
            _ => RuntimeConfig::from_app(AppConfig::default())?,
        },
    };
    if widget_override.is_some() {
        cfg.widget_id = widget_override;
    }
    Ok(cfg)
}

fn read_file(path: &Path) -> Result<RuntimeConfig> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse(&txt).with_context(|| format!("invalid config: {}", path.display()))
}

fn default_config_path() -> Option<PathBuf> {
    let mut p = if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else {
        let mut home = PathBuf::from(env::var("HOME").ok()?);
        home.push(".config");
        home
    };
    p.push("storeez-widget");
    p.push("config.toml");
    Some(p)
}
