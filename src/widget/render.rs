//! Declarative rendering of [`WidgetState`] into a host-agnostic tree.
//!
//! The tree carries no pixels: hosts decide how a cell, a placeholder or the
//! browser surface look. What the tree does fix is behavior, every tappable
//! region of a cell maps to the same [`WidgetAction`].

use super::state::{WidgetPhase, WidgetState};
use crate::api::{ImagePhase, Story};
use crate::config::WidgetConfig;

pub const CLOSE_WINDOW_CHANNEL: &str = "closeWindow";
pub const CAPTION_MAX_LINES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetAction {
    SelectStory(String),
    CloseBrowser,
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapRegion {
    Image,
    Caption,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageContent {
    Remote(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub phase: ImagePhase,
    pub content: ImageContent,
    pub size: u16,
    pub stroke_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryCell {
    pub id: String,
    pub image: PreviewImage,
    pub caption: Vec<String>,
    pub on_tap: WidgetAction,
}

impl StoryCell {
    pub fn tap(&self, _region: TapRegion) -> &WidgetAction {
        &self.on_tap
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSurface {
    pub url: String,
    pub close_label: &'static str,
    pub on_close: WidgetAction,
    pub message_channel: &'static str,
    pub intercept_external_links: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetTree {
    pub phase: WidgetPhase,
    pub cells: Vec<StoryCell>,
    pub browser: Option<BrowserSurface>,
    pub retry: Option<WidgetAction>,
}

pub fn render(state: &WidgetState, config: &WidgetConfig) -> WidgetTree {
    let phase = state.phase();
    let cells = state
        .items()
        .iter()
        .map(|story| render_cell(story, state.preview_phase(&story.id), config))
        .collect();
    let browser = (phase == WidgetPhase::BrowserOpen).then(|| BrowserSurface {
        url: state.selected_url().to_string(),
        close_label: "Close",
        on_close: WidgetAction::CloseBrowser,
        message_channel: CLOSE_WINDOW_CHANNEL,
        intercept_external_links: config.intercept_external_links,
    });
    let retry = (phase == WidgetPhase::Error).then_some(WidgetAction::Reload);
    WidgetTree {
        phase,
        cells,
        browser,
        retry,
    }
}

fn render_cell(story: &Story, phase: ImagePhase, config: &WidgetConfig) -> StoryCell {
    let content = match phase {
        ImagePhase::Loaded => ImageContent::Remote(story.preview_url.clone()),
        ImagePhase::NotLoaded | ImagePhase::Failed => {
            ImageContent::Placeholder(config.placeholder_asset.clone())
        }
    };
    StoryCell {
        id: story.id.clone(),
        image: PreviewImage {
            phase,
            content,
            size: config.image_size,
            stroke_color: config.stroke_color.clone(),
        },
        caption: wrap_caption(&story.title, config.text_width as usize, CAPTION_MAX_LINES),
        on_tap: WidgetAction::SelectStory(story.id.clone()),
    }
}

/// Word-wrap `text` into at most `max_lines` lines of `width` columns,
/// ending the last line with an ellipsis when text was cut.
pub fn wrap_caption(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        // Words wider than a line are split hard.
        while chars.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let len = chars.len();
        if len == 0 {
            continue;
        }
        let needed = if current_len == 0 { len } else { current_len + 1 + len };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += len;
    }
    if current_len > 0 {
        lines.push(current);
    }

    if max_lines > 0 && lines.len() > max_lines {
        let overflow = lines.split_off(max_lines - 1).join(" ");
        let mut last: String = overflow.chars().take(width.saturating_sub(1)).collect();
        last.push('…');
        lines.push(last);
    } else if max_lines == 0 {
        lines.clear();
    }
    lines
}
