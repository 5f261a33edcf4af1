//! Terminal host: mounts the widget, draws the render tree and feeds user
//! input back as widget actions.

use crate::api::HttpStoryFetcher;
use crate::api::WidgetId;
use crate::browser::{BrowserEvent, BrowserSession, NavigationDecision, NavigationKind};
use crate::config::RuntimeConfig;
use crate::open_url::{ExternalOpener, SystemOpener};
use crate::ui::{browser_lines, cell_label, prompt_index, MenuChoice};
use crate::widget::{BrowserSurface, SelectedUrl, WidgetPhase, WidgetRuntime, WidgetViewModel};
use anyhow::{anyhow, Context, Result};
use dialoguer::Input;
use std::sync::Arc;
use tracing::{info, warn};

enum Flow {
    Continue,
    Quit,
}

pub async fn run(cfg: &RuntimeConfig) -> Result<()> {
    let raw_id = cfg
        .widget_id
        .clone()
        .ok_or_else(|| anyhow!("no widget id configured (use --widget <id> or widget_id in config.toml)"))?;
    let widget_id = WidgetId::new(raw_id)?;
    let home = SelectedUrl::parse(&cfg.home_url).context("invalid home_url")?;
    let fetcher = HttpStoryFetcher::new(cfg.api_base.clone(), &cfg.http)?;

    let model = WidgetViewModel::new(widget_id, home);
    let mut runtime = WidgetRuntime::new(model, Arc::new(fetcher), cfg.appearance.clone(), cfg.probe_previews);
    let opener = SystemOpener;

    info!(widget = %runtime.model().widget_id(), "mounting widget");
    runtime.mount();

    loop {
        // Pick up preview phases that resolved while the user was in a menu.
        runtime.drain_updates();
        let tree = runtime.render();
        let flow = match (&tree.browser, tree.phase) {
            (Some(surface), _) => browser_view(&mut runtime, surface, &opener)?,
            (None, WidgetPhase::Loading) => {
                // Nothing to select yet; block until the fetch reports back.
                println!("Loading stories...");
                runtime.next_update().await;
                Flow::Continue
            }
            (None, _) => strip_view(&mut runtime, cfg.header.as_deref())?,
        };
        if let Flow::Quit = flow {
            break;
        }
    }
    Ok(())
}

fn strip_view(runtime: &mut WidgetRuntime, header: Option<&str>) -> Result<Flow> {
    let tree = runtime.render();
    let labels: Vec<String> = tree.cells.iter().map(cell_label).collect();
    let prompt = match (&tree.retry, labels.is_empty()) {
        (Some(_), _) => "Could not load stories (r = reload, q = quit)",
        (None, true) => "No stories (r = reload, q = quit)",
        (None, false) => "Stories (select to open, r = reload, q = quit)",
    };
    match prompt_index(prompt, &labels, header, &['r']) {
        Ok(MenuChoice::Index(i)) => {
            if let Some(cell) = tree.cells.get(i) {
                if let Err(err) = runtime.dispatch(&cell.on_tap) {
                    warn!(story = %cell.id, error = %err, "story not opened");
                }
            }
            Ok(Flow::Continue)
        }
        Ok(MenuChoice::Hotkey('r')) => {
            runtime.mount();
            Ok(Flow::Continue)
        }
        Ok(MenuChoice::Back | MenuChoice::Quit) => Ok(Flow::Quit),
        Ok(MenuChoice::Hotkey(_)) => Ok(Flow::Continue),
        Err(err) => {
            warn!(error = %err, "invalid selection");
            Ok(Flow::Continue)
        }
    }
}

fn browser_view(runtime: &mut WidgetRuntime, surface: &BrowserSurface, opener: &dyn ExternalOpener) -> Result<Flow> {
    let url = SelectedUrl::parse(&surface.url)?;
    let mut session = BrowserSession::open(&url, surface.intercept_external_links, opener);
    loop {
        // The surface may have navigated away from the story url.
        let mut lines = browser_lines(surface);
        lines[1] = format!("  {}", session.current());
        let header = lines.join("\n");
        let choice = prompt_index(
            "c = close, o = open in system browser, l = follow link, m = post script message",
            &[],
            Some(&header),
            &['c', 'o', 'l', 'm'],
        );
        match choice {
            Ok(MenuChoice::Hotkey('c') | MenuChoice::Back) => break,
            Ok(MenuChoice::Quit) => return Ok(Flow::Quit),
            Ok(MenuChoice::Hotkey('o')) => {
                if let Err(err) = opener.open(session.current().as_str()) {
                    warn!(error = %err, "could not open externally");
                }
            }
            Ok(MenuChoice::Hotkey('l')) => {
                let target: String = Input::new().with_prompt("Link").interact_text()?;
                if let NavigationDecision::Cancel = session.on_navigation(&target, NavigationKind::LinkActivated) {
                    warn!(link = %target, "navigation cancelled");
                }
            }
            Ok(MenuChoice::Hotkey('m')) => {
                let name: String = Input::new().with_prompt("Channel").interact_text()?;
                let body: String = Input::new().with_prompt("Body").allow_empty(true).interact_text()?;
                if let Some(BrowserEvent::CloseRequested) = session.on_script_message(&name, &body) {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "invalid selection"),
        }
    }
    // Every exit path except quit goes through the close affordance.
    runtime.dispatch(&surface.on_close)?;
    Ok(Flow::Continue)
}
