//! Widget lifecycle: state, transitions, rendering and the async driver.

mod render;
mod runtime;
mod state;
mod view_model;

pub use render::{
    render, wrap_caption, BrowserSurface, ImageContent, PreviewImage, StoryCell, TapRegion,
    WidgetAction, WidgetTree, CLOSE_WINDOW_CHANNEL,
};
pub use runtime::{WidgetRuntime, WidgetUpdate};
pub use state::{SelectedUrl, SelectionError, WidgetPhase, WidgetState};
pub use view_model::{FetchTicket, WidgetViewModel};
