use std::path::PathBuf;

/// Why a pasted PGN fragment could not become a canonical game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no header tags found")]
    NoHeaders,
    #[error("missing Site header")]
    MissingSite,
    #[error("Chess.com game without a Link header")]
    MissingLink,
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to open file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to initialize zstd decoder for '{path}': {source}")]
    Zstd {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Invalid compression value '{0}'. Supported values: 'auto' or 'zstd'.")]
    Compression(String),
    #[error("No input files matched '{0}'")]
    NoMatches(String),
}

/// Collects per-fragment failure messages of a batch into one line.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorAccumulator, ParseError};

    #[test]
    fn test_push_single_message() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("fragment 1: missing Site header");

        assert_eq!(
            accumulator.take().as_deref(),
            Some("fragment 1: missing Site header")
        );
    }

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("fragment 1: no header tags found");
        accumulator.push("fragment 3: missing Site header");

        assert_eq!(
            accumulator.take().as_deref(),
            Some("fragment 1: no header tags found; fragment 3: missing Site header")
        );
    }

    #[test]
    fn test_take_consumes_accumulator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("error");

        assert_eq!(accumulator.take().as_deref(), Some("error"));
        assert!(accumulator.is_empty());
        assert!(accumulator.take().is_none());
    }

    #[test]
    fn test_parse_error_messages() {
        assert_eq!(ParseError::MissingLink.to_string(), "Chess.com game without a Link header");
        assert_eq!(ParseError::NoHeaders.to_string(), "no header tags found");
    }
}
