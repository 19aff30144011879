use super::types::{UserColor, UserResult};

/// PGN `Result` code as seen from one side of the board.
pub fn result_for_color(pgn_result: Option<&str>, color: UserColor) -> UserResult {
    let Some(code) = pgn_result.map(str::trim) else {
        return UserResult::Unknown;
    };

    match (code, color) {
        ("1/2-1/2", UserColor::White | UserColor::Black) => UserResult::Draw,
        ("1-0", UserColor::White) | ("0-1", UserColor::Black) => UserResult::Win,
        ("0-1", UserColor::White) | ("1-0", UserColor::Black) => UserResult::Loss,
        _ => UserResult::Unknown,
    }
}

/// Case-insensitive match of `username` against both players.
pub fn color_for_username(username: &str, white: &str, black: &str) -> UserColor {
    let username = username.trim();
    if username.is_empty() {
        return UserColor::None;
    }

    let me = username.to_lowercase();
    if white.to_lowercase() == me {
        UserColor::White
    } else if black.to_lowercase() == me {
        UserColor::Black
    } else {
        UserColor::None
    }
}

/// Username-matched attribution for platform imports.
///
/// Without a `Result` tag nothing is attributed, not even the color.
pub fn determine_by_username(
    pgn_result: Option<&str>,
    username: &str,
    white: &str,
    black: &str,
) -> (UserResult, UserColor) {
    if pgn_result.is_none() {
        return (UserResult::Unknown, UserColor::None);
    }

    let color = color_for_username(username, white, black);
    (result_for_color(pgn_result, color), color)
}
