use regex::Regex;
use std::sync::OnceLock;

fn ansi_csi() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;?]*[ -/]*[@-~]").ok())
        .as_ref()
}

/// Strip escape sequences and control characters from API-provided text
/// before it reaches the terminal. Whitespace runs collapse to one space.
pub fn sanitize_for_terminal(s: &str) -> String {
    let no_ansi = match ansi_csi() {
        Some(re) => re.replace_all(s, " ").into_owned(),
        None => s.to_string(),
    };
    no_ansi
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_escapes_and_controls() {
        assert_eq!(sanitize_for_terminal("\x1b[31mRed\x1b[0m title"), "Red title");
        assert_eq!(sanitize_for_terminal("a\nb\tc\x07d"), "a b c d");
        assert_eq!(sanitize_for_terminal("  plain  "), "plain");
    }
}
