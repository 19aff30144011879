use super::headers::Headers;
use super::types::Platform;

pub fn detect_platform(site: &str) -> Platform {
    if site.contains("Chess.com") {
        Platform::ChessCom
    } else if site.contains("https://lichess.org") {
        Platform::Lichess
    } else {
        Platform::Unknown
    }
}

/// Canonical URL of a pasted game: Chess.com games carry it in `Link`,
/// Lichess games in `Site`. For unknown sites the `Site` value is the best
/// available identity and deduplication is not guaranteed.
pub fn canonical_url<'a>(platform: Platform, headers: &'a Headers) -> Option<&'a str> {
    match platform {
        Platform::ChessCom => headers.get("Link"),
        Platform::Lichess | Platform::Unknown => headers.get("Site"),
    }
}
