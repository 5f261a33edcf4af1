use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "previewUrl")]
    pub preview_url: String,
}

/// Load state of a story's preview image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePhase {
    #[default]
    NotLoaded,
    Loaded,
    Failed,
}

/// Envelope returned by the widget endpoint.
#[derive(Debug, Deserialize)]
pub struct WidgetResponse {
    pub stories: Vec<Story>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_field_names() {
        let body = r#"{"stories":[{"id":"1","url":"https://x.test","title":"T1","previewUrl":"https://img/1.png"}]}"#;
        let resp: WidgetResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.stories.len(), 1);
        assert_eq!(resp.stories[0].preview_url, "https://img/1.png");
        assert_eq!(resp.stories[0].title, "T1");
    }

    #[test]
    fn missing_field_is_rejected() {
        let body = r#"{"stories":[{"id":"1","url":"https://x.test","title":"T1"}]}"#;
        assert!(serde_json::from_str::<WidgetResponse>(body).is_err());
    }
}
