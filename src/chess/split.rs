use regex::Regex;
use std::sync::LazyLock;

// A blank line directly followed by the next game's `[Event` tag.
static GAME_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n\[Event").expect("valid game boundary regex"));

const EVENT_TAG_PREFIX_LEN: usize = "[Event".len();

/// Splits pasted text holding one or more PGN games into per-game fragments.
///
/// Fragments are trimmed; empty ones are dropped. Text without a boundary
/// yields a single fragment. A leading byte order mark is ignored.
pub fn split_multiple_pgns(text: &str) -> Vec<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut fragments = Vec::new();
    let mut start = 0;

    for boundary in GAME_BOUNDARY_RE.find_iter(text) {
        let next_start = boundary.end() - EVENT_TAG_PREFIX_LEN;
        push_fragment(&mut fragments, &text[start..next_start]);
        start = next_start;
    }
    push_fragment(&mut fragments, &text[start..]);

    fragments
}

fn push_fragment<'a>(fragments: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        fragments.push(trimmed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME_A: &str = "[Event \"Live Chess\"]\n[Site \"Chess.com\"]\n\n1. e4 e5 1-0";
    const GAME_B: &str = concat!(
        "[Event \"Rated blitz game\"]\n",
        "[Site \"https://lichess.org/abc123\"]\n",
        "\n1. d4 d5 0-1"
    );

    #[test]
    fn test_split_empty_input() {
        assert!(split_multiple_pgns("").is_empty());
        assert!(split_multiple_pgns("  \n\n \t").is_empty());
    }

    #[test]
    fn test_split_single_game_without_boundary() {
        let text = format!("\n  {GAME_A}  \n");
        assert_eq!(split_multiple_pgns(&text), vec![GAME_A]);
    }

    #[test]
    fn test_split_two_games() {
        let text = format!("{GAME_A}\n\n{GAME_B}\n");
        assert_eq!(split_multiple_pgns(&text), vec![GAME_A, GAME_B]);
    }

    #[test]
    fn test_split_blank_line_before_movetext_is_not_a_boundary() {
        let fragments = split_multiple_pgns(GAME_A);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].ends_with("1-0"));
    }

    #[test]
    fn test_split_handles_crlf_and_extra_blank_lines() {
        let a = GAME_A.replace('\n', "\r\n");
        let b = GAME_B.replace('\n', "\r\n");
        let text = format!("{a}\r\n\r\n\r\n{b}");
        let fragments = split_multiple_pgns(&text);
        assert_eq!(fragments, vec![a.as_str(), b.as_str()]);
    }

    #[test]
    fn test_split_drops_leading_byte_order_mark() {
        let text = format!("\u{feff}{GAME_A}\n\n{GAME_B}");
        assert_eq!(split_multiple_pgns(&text), vec![GAME_A, GAME_B]);
    }

    #[test]
    fn test_split_requires_event_tag_after_blank_line() {
        let text = format!("{GAME_A}\n\n[Site \"orphan\"]");
        assert_eq!(split_multiple_pgns(&text).len(), 1);
    }
}
