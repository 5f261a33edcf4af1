use super::state::{LoadStatus, SelectedUrl, SelectionError, WidgetState};
use crate::api::{ImagePhase, Story, WidgetId};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Handle for one fetch issued by [`WidgetViewModel::on_mount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub widget_id: WidgetId,
    pub generation: u64,
}

/// Single-writer owner of [`WidgetState`].
///
/// Results are tagged with the generation of the mount that requested them;
/// anything older than the latest mount is dropped.
#[derive(Debug)]
pub struct WidgetViewModel {
    widget_id: WidgetId,
    state: WidgetState,
    generation: u64,
}

impl WidgetViewModel {
    pub fn new(widget_id: WidgetId, home_url: SelectedUrl) -> Self {
        Self {
            widget_id,
            state: WidgetState::new(home_url),
            generation: 0,
        }
    }

    pub fn widget_id(&self) -> &WidgetId {
        &self.widget_id
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn on_mount(&mut self) -> FetchTicket {
        self.generation += 1;
        self.state.items.clear();
        self.state.previews.clear();
        self.state.browser_visible = false;
        self.state.status = LoadStatus::Loading;
        debug!(widget = %self.widget_id, generation = self.generation, "mounted");
        FetchTicket {
            widget_id: self.widget_id.clone(),
            generation: self.generation,
        }
    }

    /// Apply a fetch outcome. Returns `false` when the result is stale.
    pub fn on_fetch_result(&mut self, generation: u64, stories: Option<Vec<Story>>) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale fetch result");
            return false;
        }
        match stories {
            Some(stories) => {
                let items = dedupe_by_id(stories);
                info!(widget = %self.widget_id, count = items.len(), "stories loaded");
                self.state.items = items;
                self.state.status = LoadStatus::Loaded;
            }
            None => {
                self.state.items.clear();
                self.state.status = LoadStatus::Failed;
            }
        }
        self.state.previews.clear();
        true
    }

    pub fn on_image_phase(&mut self, generation: u64, story_id: &str, phase: ImagePhase) -> bool {
        if generation != self.generation || !self.state.items.iter().any(|s| s.id == story_id) {
            return false;
        }
        self.state.previews.insert(story_id.to_string(), phase);
        true
    }

    pub fn on_story_selected(&mut self, story: &Story) -> Result<(), SelectionError> {
        let url = SelectedUrl::parse(&story.url).inspect_err(|_| {
            warn!(story = %story.id, url = %story.url, "refusing to open malformed story url");
        })?;
        self.state.selected_url = url;
        self.state.browser_visible = true;
        Ok(())
    }

    pub fn select_story(&mut self, story_id: &str) -> Result<(), SelectionError> {
        let story = self
            .state
            .items
            .iter()
            .find(|s| s.id == story_id)
            .cloned()
            .ok_or_else(|| SelectionError::UnknownStory(story_id.to_string()))?;
        self.on_story_selected(&story)
    }

    /// Hide the browser. The strip always comes back as `Loaded`, whatever
    /// the fetch status was when the browser opened.
    pub fn on_browser_closed(&mut self) {
        self.state.browser_visible = false;
        self.state.status = LoadStatus::Loaded;
    }
}

/// Keep the first story for each id, preserving response order.
fn dedupe_by_id(stories: Vec<Story>) -> Vec<Story> {
    let mut seen: HashSet<String> = HashSet::with_capacity(stories.len());
    let total = stories.len();
    let items: Vec<Story> = stories
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect();
    if items.len() != total {
        warn!(dropped = total - items.len(), "duplicate story ids in response");
    }
    items
}
