//! Access to the Storeez widget API.

mod fetch;
mod model;

pub use fetch::{endpoint, HttpStoryFetcher};
pub use model::{ImagePhase, Story, WidgetResponse};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("failed to decode widget response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response body exceeded {limit} bytes")]
    TooLarge { limit: usize },
    #[error("response body was empty")]
    EmptyBody,
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("widget id must not be empty")]
pub struct WidgetIdError;

/// Identifier of a widget configured on the Storeez backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(raw: impl Into<String>) -> Result<Self, WidgetIdError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WidgetIdError);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of stories and preview images for a widget.
///
/// Implementations are stateless from the widget's point of view: every call
/// is independent, nothing is cached and nothing is retried.
#[async_trait]
pub trait StoryFetcher: Send + Sync {
    async fn fetch(&self, widget_id: &WidgetId) -> Result<Vec<Story>, FetchError>;

    /// Resolve a preview image; failures map to [`ImagePhase::Failed`].
    async fn load_preview(&self, url: &str) -> ImagePhase;
}
