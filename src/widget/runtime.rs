use super::render::{render, WidgetAction, WidgetTree};
use super::state::SelectionError;
use super::view_model::{FetchTicket, WidgetViewModel};
use crate::api::{ImagePhase, Story, StoryFetcher};
use crate::config::WidgetConfig;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Preview requests allowed in flight at once.
pub const PREVIEW_CONCURRENCY: usize = 4;

/// Completion of background work, delivered to the owner of the runtime.
#[derive(Debug)]
pub enum WidgetUpdate {
    Stories {
        generation: u64,
        stories: Option<Vec<Story>>,
    },
    Preview {
        generation: u64,
        story_id: String,
        phase: ImagePhase,
    },
}

/// Drives a [`WidgetViewModel`] from the UI-update context.
///
/// Network work runs on spawned tasks; their results come back through a
/// channel and are only applied inside [`next_update`](Self::next_update) or
/// [`drain_updates`](Self::drain_updates), so the state has a single writer.
pub struct WidgetRuntime {
    model: WidgetViewModel,
    fetcher: Arc<dyn StoryFetcher>,
    config: WidgetConfig,
    probe_previews: bool,
    tx: mpsc::UnboundedSender<WidgetUpdate>,
    rx: mpsc::UnboundedReceiver<WidgetUpdate>,
    previews: Option<JoinHandle<()>>,
}

impl WidgetRuntime {
    pub fn new(
        model: WidgetViewModel,
        fetcher: Arc<dyn StoryFetcher>,
        config: WidgetConfig,
        probe_previews: bool,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            model,
            fetcher,
            config,
            probe_previews,
            tx,
            rx,
            previews: None,
        }
    }

    pub fn model(&self) -> &WidgetViewModel {
        &self.model
    }

    pub fn render(&self) -> WidgetTree {
        render(self.model.state(), &self.config)
    }

    pub fn mount(&mut self) {
        // Previews of the previous load are useless once the list is replaced.
        self.cancel_preview_probes();
        let FetchTicket {
            widget_id,
            generation,
        } = self.model.on_mount();
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let stories = match fetcher.fetch(&widget_id).await {
                Ok(stories) => Some(stories),
                Err(err) => {
                    warn!(widget = %widget_id, error = %err, "widget fetch failed");
                    None
                }
            };
            let _ = tx.send(WidgetUpdate::Stories { generation, stories });
        });
    }

    /// Wait for the next update and apply it. Returns `false` if it was stale.
    pub async fn next_update(&mut self) -> bool {
        match self.rx.recv().await {
            Some(update) => self.apply(update),
            None => false,
        }
    }

    /// Apply every update that has already arrived without waiting.
    pub fn drain_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.rx.try_recv() {
            if self.apply(update) {
                applied += 1;
            }
        }
        applied
    }

    pub fn dispatch(&mut self, action: &WidgetAction) -> Result<(), SelectionError> {
        match action {
            WidgetAction::SelectStory(id) => self.model.select_story(id),
            WidgetAction::CloseBrowser => {
                self.model.on_browser_closed();
                Ok(())
            }
            WidgetAction::Reload => {
                self.mount();
                Ok(())
            }
        }
    }

    fn apply(&mut self, update: WidgetUpdate) -> bool {
        match update {
            WidgetUpdate::Stories { generation, stories } => {
                let loaded = stories.is_some();
                let applied = self.model.on_fetch_result(generation, stories);
                if applied && loaded && self.probe_previews {
                    self.spawn_preview_probes(generation);
                }
                applied
            }
            WidgetUpdate::Preview {
                generation,
                story_id,
                phase,
            } => self.model.on_image_phase(generation, &story_id, phase),
        }
    }

    fn cancel_preview_probes(&mut self) {
        if let Some(handle) = self.previews.take() {
            handle.abort();
        }
    }

    /// Probe every preview from one task, at most [`PREVIEW_CONCURRENCY`]
    /// requests at a time.
    fn spawn_preview_probes(&mut self, generation: u64) {
        self.cancel_preview_probes();
        let jobs: Vec<(String, String)> = self
            .model
            .state()
            .items()
            .iter()
            .map(|s| (s.id.clone(), s.preview_url.clone()))
            .collect();
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        self.previews = Some(tokio::spawn(async move {
            let mut results = stream::iter(jobs)
                .map(|(story_id, preview_url)| {
                    let fetcher = Arc::clone(&fetcher);
                    async move {
                        let phase = fetcher.load_preview(&preview_url).await;
                        (story_id, phase)
                    }
                })
                .buffer_unordered(PREVIEW_CONCURRENCY);
            while let Some((story_id, phase)) = results.next().await {
                debug!(story = %story_id, ?phase, "preview resolved");
                let update = WidgetUpdate::Preview {
                    generation,
                    story_id,
                    phase,
                };
                if tx.send(update).is_err() {
                    break;
                }
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FetchError, HttpStoryFetcher, WidgetId};
    use crate::config::HttpConfig;
    use crate::widget::state::{SelectedUrl, WidgetPhase};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use url::Url;

    #[derive(Default)]
    struct FakeFetcher {
        stories: Option<Vec<Story>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl StoryFetcher for FakeFetcher {
        async fn fetch(&self, _widget_id: &WidgetId) -> Result<Vec<Story>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.stories.clone().ok_or(FetchError::EmptyBody)
        }

        async fn load_preview(&self, _url: &str) -> ImagePhase {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            ImagePhase::Loaded
        }
    }

    fn runtime(stories: Option<Vec<Story>>, probe: bool) -> (WidgetRuntime, Arc<FakeFetcher>) {
        let fetcher = Arc::new(FakeFetcher {
            stories,
            ..FakeFetcher::default()
        });
        let model = WidgetViewModel::new(
            WidgetId::new("abc123").unwrap(),
            SelectedUrl::parse("https://google.com").unwrap(),
        );
        let rt = WidgetRuntime::new(model, fetcher.clone(), WidgetConfig::default(), probe);
        (rt, fetcher)
    }

    fn story(id: &str) -> Story {
        Story {
            id: id.into(),
            url: format!("https://{id}.test/"),
            title: format!("T{id}"),
            preview_url: format!("https://img/{id}.png"),
        }
    }

    #[tokio::test]
    async fn mount_loads_stories() {
        let (mut rt, fetcher) = runtime(Some(vec![story("1"), story("2")]), false);
        rt.mount();
        assert_eq!(rt.render().phase, WidgetPhase::Loading);
        assert!(rt.next_update().await);
        let tree = rt.render();
        assert_eq!(tree.phase, WidgetPhase::Loaded);
        assert_eq!(tree.cells.len(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_then_reload() {
        let (mut rt, fetcher) = runtime(None, false);
        rt.mount();
        rt.next_update().await;
        let tree = rt.render();
        assert_eq!(tree.phase, WidgetPhase::Error);
        let retry = tree.retry.expect("retry action");
        rt.dispatch(&retry).unwrap();
        assert_eq!(rt.render().phase, WidgetPhase::Loading);
        rt.next_update().await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(rt.render().phase, WidgetPhase::Error);
    }

    #[tokio::test]
    async fn remount_discards_first_result() {
        let (mut rt, _fetcher) = runtime(Some(vec![story("1")]), false);
        rt.mount();
        rt.mount();
        let first = rt.next_update().await;
        let second = rt.next_update().await;
        // Both tasks carry distinct generations; exactly one is current.
        assert!(first ^ second);
        assert_eq!(rt.render().phase, WidgetPhase::Loaded);
        assert_eq!(rt.model().generation(), 2);
    }

    #[tokio::test]
    async fn previews_are_probed_after_load() {
        let (mut rt, _fetcher) = runtime(Some(vec![story("1"), story("2")]), true);
        rt.mount();
        rt.next_update().await;
        rt.next_update().await;
        rt.next_update().await;
        let tree = rt.render();
        assert!(tree.cells.iter().all(|c| c.image.phase == ImagePhase::Loaded));
    }

    #[tokio::test]
    async fn preview_probes_are_bounded() {
        let stories: Vec<Story> = (0..20).map(|i| story(&i.to_string())).collect();
        let (mut rt, fetcher) = runtime(Some(stories), true);
        rt.mount();
        rt.next_update().await;
        for _ in 0..20 {
            assert!(rt.next_update().await);
        }
        let tree = rt.render();
        assert!(tree.cells.iter().all(|c| c.image.phase == ImagePhase::Loaded));
        let max = fetcher.max_in_flight.load(Ordering::SeqCst);
        assert!(max >= 1 && max <= PREVIEW_CONCURRENCY, "max in flight was {max}");
    }

    #[tokio::test]
    async fn remount_cancels_pending_probes() {
        let stories: Vec<Story> = (0..20).map(|i| story(&i.to_string())).collect();
        let (mut rt, _fetcher) = runtime(Some(stories), true);
        rt.mount();
        rt.next_update().await;
        let first = rt.previews.as_ref().map(|h| h.abort_handle()).expect("probe task");
        rt.mount();
        assert!(rt.previews.is_none());
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(first.is_finished());
        // Only the new mount's fetch result is waiting.
        assert!(rt.next_update().await);
        assert_eq!(rt.model().generation(), 2);
    }

    #[tokio::test]
    async fn unreachable_api_shows_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let base = Url::parse(&format!("http://{addr}/widget/")).unwrap();
        let fetcher = HttpStoryFetcher::new(base, &HttpConfig::default()).unwrap();
        let model = WidgetViewModel::new(
            WidgetId::new("abc123").unwrap(),
            SelectedUrl::parse("https://google.com").unwrap(),
        );
        let mut rt = WidgetRuntime::new(model, Arc::new(fetcher), WidgetConfig::default(), true);
        rt.mount();
        assert!(rt.next_update().await);
        let tree = rt.render();
        assert_eq!(tree.phase, WidgetPhase::Error);
        assert!(tree.cells.is_empty());
        assert!(tree.browser.is_none());
    }

    #[tokio::test]
    async fn dispatch_select_and_close() {
        let (mut rt, _fetcher) = runtime(Some(vec![story("1")]), false);
        rt.mount();
        rt.next_update().await;
        let tap = rt.render().cells[0].on_tap.clone();
        rt.dispatch(&tap).unwrap();
        let tree = rt.render();
        assert_eq!(tree.phase, WidgetPhase::BrowserOpen);
        let browser = tree.browser.expect("browser");
        rt.dispatch(&browser.on_close).unwrap();
        assert_eq!(rt.render().phase, WidgetPhase::Loaded);
        assert_eq!(rt.render().cells.len(), 1);
        assert_eq!(rt.drain_updates(), 0);
    }
}
