use super::error::InputError;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zstd::stream::read::Decoder as ZstdDecoder;

/// Marker for reading pasted text from standard input.
pub const STDIN_PATH: &str = "-";

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionMode {
    /// Plain text, or zstd when the file name ends in `.zst`.
    #[default]
    Auto,
    Zstd,
}

impl CompressionMode {
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else if normalized.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Err(InputError::Compression(normalized.to_string()))
        }
    }

    fn is_zstd_for(self, path: &Path) -> bool {
        match self {
            Self::Zstd => true,
            Self::Auto => path.extension().is_some_and(|ext| ext == "zst"),
        }
    }
}

/// Pasted PGN text together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnText {
    pub source: String,
    pub text: String,
}

/// Expands a single path or a glob pattern (`*` / `?`) into input paths.
pub fn expand_paths(pattern: &str) -> Result<Vec<PathBuf>, InputError> {
    if pattern.contains('*') || pattern.contains('?') {
        let paths: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|source| InputError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .collect();

        if paths.is_empty() {
            return Err(InputError::NoMatches(pattern.to_string()));
        }
        Ok(paths)
    } else {
        Ok(vec![PathBuf::from(pattern)])
    }
}

fn open_input_stream(
    path: &Path,
    compression: CompressionMode,
) -> Result<Box<dyn Read>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    if compression.is_zstd_for(path) {
        ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as Box<dyn Read>)
            .map_err(|source| InputError::Zstd {
                path: path.to_path_buf(),
                source,
            })
    } else {
        Ok(Box::new(file))
    }
}

fn read_file(path: &Path, compression: CompressionMode) -> Result<String, InputError> {
    let mut input = open_input_stream(path, compression)?;
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(strip_bom(text))
}

fn strip_bom(text: String) -> String {
    match text.strip_prefix(BYTE_ORDER_MARK) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Reads every input named by `pattern`.
///
/// A single path must be readable. When a pattern matches several files,
/// unreadable ones are logged and skipped.
pub fn read_pgn_inputs(
    pattern: &str,
    compression: CompressionMode,
) -> Result<Vec<PgnText>, InputError> {
    if pattern == STDIN_PATH {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|source| InputError::Read {
                path: PathBuf::from(STDIN_PATH),
                source,
            })?;
        return Ok(vec![PgnText {
            source: STDIN_PATH.to_string(),
            text: strip_bom(text),
        }]);
    }

    let paths = expand_paths(pattern)?;
    let mut inputs = Vec::with_capacity(paths.len());

    for path in &paths {
        match read_file(path, compression) {
            Ok(text) => {
                debug!(path = %path.display(), bytes = text.len(), "read PGN input");
                inputs.push(PgnText {
                    source: path.display().to_string(),
                    text,
                });
            }
            Err(err) => {
                if paths.len() == 1 {
                    return Err(err);
                }
                warn!("{err}");
            }
        }
    }

    Ok(inputs)
}
