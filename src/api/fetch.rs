use super::model::{ImagePhase, Story, WidgetResponse};
use super::{FetchError, StoryFetcher, WidgetId};
use crate::config::HttpConfig;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Build the widget endpoint by appending `widget_id` as a single escaped
/// path segment of `base`.
pub fn endpoint(base: &Url, widget_id: &WidgetId) -> Result<Url, url::ParseError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .push(widget_id.as_str());
    Ok(url)
}

pub struct HttpStoryFetcher {
    client: Client,
    base: Url,
    max_body_bytes: usize,
}

impl HttpStoryFetcher {
    pub fn new(base: Url, http: &HttpConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(http.user_agent.as_str()).gzip(true);
        if let Some(secs) = http.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base,
            max_body_bytes: http.max_body_bytes,
        })
    }

    async fn read_capped(&self, resp: Response) -> Result<Vec<u8>, FetchError> {
        let mut stream = resp.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if buf.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_body_bytes,
                });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}

#[async_trait]
impl StoryFetcher for HttpStoryFetcher {
    async fn fetch(&self, widget_id: &WidgetId) -> Result<Vec<Story>, FetchError> {
        let url = endpoint(&self.base, widget_id)?;
        debug!(%url, "fetching widget");
        let resp = self.client.get(url).send().await?;
        // Any non-2xx is a failed fetch; the body is not inspected.
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = self.read_capped(resp).await?;
        decode_stories(&body)
    }

    async fn load_preview(&self, url: &str) -> ImagePhase {
        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(url, error = %err, "preview request failed");
                return ImagePhase::Failed;
            }
        };
        if !resp.status().is_success() {
            warn!(url, status = resp.status().as_u16(), "preview unavailable");
            return ImagePhase::Failed;
        }
        // Servers that omit the content type get the benefit of the doubt.
        let is_image = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(true);
        if is_image {
            ImagePhase::Loaded
        } else {
            ImagePhase::Failed
        }
    }
}

fn decode_stories(body: &[u8]) -> Result<Vec<Story>, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FetchError::EmptyBody);
    }
    let resp: WidgetResponse = serde_json::from_slice(body)?;
    Ok(resp.stories)
}
