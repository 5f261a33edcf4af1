use crate::api::{ImagePhase, Story};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("story url is not a valid http(s) url: {0}")]
    InvalidUrl(String),
    #[error("no story with id {0}")]
    UnknownStory(String),
}

/// Absolute http(s) URL accepted for the in-app browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedUrl(Url);

impl SelectedUrl {
    pub fn parse(raw: &str) -> Result<Self, SelectionError> {
        let url = Url::parse(raw.trim()).map_err(|_| SelectionError::InvalidUrl(raw.to_string()))?;
        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(Self(url)),
            _ => Err(SelectionError::InvalidUrl(raw.to_string())),
        }
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SelectedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Progress of the most recent fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed,
}

/// What the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPhase {
    Loading,
    Loaded,
    Error,
    BrowserOpen,
}

#[derive(Debug, Clone)]
pub struct WidgetState {
    pub(crate) items: Vec<Story>,
    pub(crate) selected_url: SelectedUrl,
    pub(crate) browser_visible: bool,
    pub(crate) status: LoadStatus,
    pub(crate) previews: HashMap<String, ImagePhase>,
}

impl WidgetState {
    pub fn new(home_url: SelectedUrl) -> Self {
        Self {
            items: Vec::new(),
            selected_url: home_url,
            browser_visible: false,
            status: LoadStatus::Loading,
            previews: HashMap::new(),
        }
    }

    pub fn items(&self) -> &[Story] {
        &self.items
    }

    pub fn selected_url(&self) -> &SelectedUrl {
        &self.selected_url
    }

    pub fn browser_visible(&self) -> bool {
        self.browser_visible
    }

    pub fn phase(&self) -> WidgetPhase {
        if self.browser_visible {
            return WidgetPhase::BrowserOpen;
        }
        match self.status {
            LoadStatus::Loading => WidgetPhase::Loading,
            LoadStatus::Loaded => WidgetPhase::Loaded,
            LoadStatus::Failed => WidgetPhase::Error,
        }
    }

    pub fn preview_phase(&self, story_id: &str) -> ImagePhase {
        self.previews.get(story_id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_url_accepts_http_only() {
        assert!(SelectedUrl::parse("https://x.test").is_ok());
        assert!(SelectedUrl::parse("http://x.test/a?b=c").is_ok());
        assert!(SelectedUrl::parse("").is_err());
        assert!(SelectedUrl::parse("not a url").is_err());
        assert!(SelectedUrl::parse("javascript:alert(1)").is_err());
        assert!(SelectedUrl::parse("file:///etc/passwd").is_err());
    }

    #[test]
    fn fresh_state_is_loading() {
        let state = WidgetState::new(SelectedUrl::parse("https://google.com").unwrap());
        assert_eq!(state.phase(), WidgetPhase::Loading);
        assert!(state.items().is_empty());
        assert_eq!(state.preview_phase("1"), ImagePhase::NotLoaded);
    }
}
