use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TAG_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*\[(\w+)\s+"(.*)"\]"#).expect("valid header tag regex"));

/// Header tags of a single PGN game, keyed by tag name.
///
/// Built line by line from `[Key "Value"]` tags. Lines that are not tags are
/// ignored, and a repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    tags: HashMap<String, String>,
}

impl Headers {
    pub fn parse(pgn: &str) -> Self {
        let mut tags = HashMap::new();
        for line in pgn.lines() {
            if let Some(caps) = TAG_LINE_RE.captures(line) {
                tags.insert(caps[1].to_string(), caps[2].to_string());
            }
        }
        Self { tags }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// First present tag among `keys`.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Integer tag, `default` when absent or unparsable.
    pub fn int_or(&self, key: &str, default: i32) -> i32 {
        self.optional_int(key).unwrap_or(default)
    }

    pub fn optional_int(&self, key: &str) -> Option<i32> {
        self.get(key)?.trim().parse().ok()
    }
}

/// Value of the `Result` tag in raw PGN text, if any.
pub fn result_tag(pgn: &str) -> Option<String> {
    Headers::parse(pgn).get("Result").map(str::to_string)
}
