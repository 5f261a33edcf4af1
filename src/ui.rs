use crate::util::sanitize::sanitize_for_terminal;
use crate::widget::{BrowserSurface, ImageContent, StoryCell};
use anyhow::{anyhow, Result};
use console::{style, Key, Term};
use dialoguer::Input;

#[derive(Debug, PartialEq, Eq)]
pub enum MenuChoice {
    Back,
    Quit,
    Hotkey(char),
    Index(usize),
}

/// One line per cell: image marker followed by the caption lines.
pub fn cell_label(cell: &StoryCell) -> String {
    let marker = match &cell.image.content {
        ImageContent::Remote(_) => style("(●)").cyan().to_string(),
        ImageContent::Placeholder(_) => style("(○)").dim().to_string(),
    };
    let caption: Vec<String> = cell
        .caption
        .iter()
        .map(|line| sanitize_for_terminal(line))
        .collect();
    format!("{} {}", marker, caption.join(" / "))
}

pub fn browser_lines(surface: &BrowserSurface) -> Vec<String> {
    let mut lines = vec![
        format!("{}  [{}]", style("In-app browser").bold(), surface.close_label),
        format!("  {}", sanitize_for_terminal(&surface.url)),
    ];
    if surface.intercept_external_links {
        lines.push(style("  outbound links open in the system browser").dim().to_string());
    }
    lines
}

/// Show `labels` and read one choice. `hotkeys` are single letters that are
/// returned as [`MenuChoice::Hotkey`] in addition to `b`/`q`.
pub fn prompt_index(
    prompt: &str,
    labels: &[String],
    header: Option<&str>,
    hotkeys: &[char],
) -> Result<MenuChoice> {
    let term = Term::stdout();
    let _ = term.clear_screen();
    if let Some(h) = header {
        println!("{}", h);
    }
    println!("{}", prompt);
    for (i, it) in labels.iter().enumerate() {
        println!("{}: {}", i + 1, it);
    }

    match term.read_key()? {
        Key::ArrowUp | Key::ArrowDown | Key::Home | Key::End if !labels.is_empty() => {
            arrow_select(&term, prompt, labels, header)
        }
        Key::Char(c) if is_command(c, hotkeys) => Ok(command(c)),
        Key::Escape => Ok(MenuChoice::Back),
        Key::Char(c) if !c.is_control() => {
            let input: String = Input::new()
                .with_prompt("Selection")
                .allow_empty(true)
                .with_initial_text(c.to_string())
                .interact_text()?;
            parse_selection(&input, labels.len(), hotkeys)
        }
        _ => {
            let input: String = Input::new()
                .with_prompt("Selection")
                .allow_empty(true)
                .interact_text()?;
            parse_selection(&input, labels.len(), hotkeys)
        }
    }
}

fn is_command(c: char, hotkeys: &[char]) -> bool {
    let c = c.to_ascii_lowercase();
    c == 'b' || c == 'q' || hotkeys.contains(&c)
}

fn command(c: char) -> MenuChoice {
    match c.to_ascii_lowercase() {
        'b' => MenuChoice::Back,
        'q' => MenuChoice::Quit,
        other => MenuChoice::Hotkey(other),
    }
}

pub fn parse_selection(input: &str, len: usize, hotkeys: &[char]) -> Result<MenuChoice> {
    let s = input.trim();
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if is_command(c, hotkeys) {
            return Ok(command(c));
        }
    }
    let idx: usize = s.parse().map_err(|_| anyhow!("invalid selection"))?;
    if idx == 0 || idx > len {
        return Err(anyhow!("out of range"));
    }
    Ok(MenuChoice::Index(idx - 1))
}

fn arrow_select(term: &Term, prompt: &str, labels: &[String], header: Option<&str>) -> Result<MenuChoice> {
    let mut sel: usize = 0;
    loop {
        term.clear_screen()?;
        if let Some(h) = header {
            println!("{}", h);
        }
        println!("{}", prompt);
        for (i, it) in labels.iter().enumerate() {
            let cursor = if i == sel { ">" } else { " " };
            println!("{} {}: {}", cursor, i + 1, it);
        }
        match term.read_key()? {
            Key::ArrowUp | Key::ArrowLeft => sel = sel.saturating_sub(1),
            Key::ArrowDown | Key::ArrowRight => sel = (sel + 1).min(labels.len() - 1),
            Key::Home => sel = 0,
            Key::End => sel = labels.len() - 1,
            Key::Enter => return Ok(MenuChoice::Index(sel)),
            Key::Char('q') | Key::Char('Q') => return Ok(MenuChoice::Quit),
            Key::Char('b') | Key::Char('B') | Key::Escape => return Ok(MenuChoice::Back),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ImagePhase;
    use crate::widget::{PreviewImage, WidgetAction};

    #[test]
    fn parses_numbers_and_commands() {
        assert_eq!(parse_selection(" 2 ", 3, &[]).unwrap(), MenuChoice::Index(1));
        assert_eq!(parse_selection("Q", 3, &[]).unwrap(), MenuChoice::Quit);
        assert_eq!(parse_selection("b", 3, &[]).unwrap(), MenuChoice::Back);
        assert_eq!(parse_selection("r", 3, &['r']).unwrap(), MenuChoice::Hotkey('r'));
        assert!(parse_selection("r", 3, &[]).is_err());
        assert!(parse_selection("0", 3, &[]).is_err());
        assert!(parse_selection("4", 3, &[]).is_err());
    }

    #[test]
    fn cell_label_strips_escapes() {
        let cell = StoryCell {
            id: "1".into(),
            image: PreviewImage {
                phase: ImagePhase::NotLoaded,
                content: ImageContent::Placeholder("ico_placeholder".into()),
                size: 100,
                stroke_color: "blue".into(),
            },
            caption: vec!["\x1b[2Jline one".into(), "two".into()],
            on_tap: WidgetAction::SelectStory("1".into()),
        };
        let label = console::strip_ansi_codes(&cell_label(&cell)).into_owned();
        assert_eq!(label, "(○) line one / two");
    }
}
