use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse speed bucket derived from base thinking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeClass {
    Bullet,
    Blitz,
    Rapid,
    Classical,
    Unknown,
}

impl TimeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullet => "bullet",
            Self::Blitz => "blitz",
            Self::Rapid => "rapid",
            Self::Classical => "classical",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a platform speed label onto a bucket. Labels outside the bucket
    /// set (`daily`, `correspondence`) return `None`.
    pub fn from_platform_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "ultrabullet" | "bullet" => Some(Self::Bullet),
            "blitz" => Some(Self::Blitz),
            "rapid" => Some(Self::Rapid),
            "classical" => Some(Self::Classical),
            _ => None,
        }
    }
}

impl fmt::Display for TimeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome from the configured user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserResult {
    Win,
    Loss,
    Draw,
    Unknown,
}

impl fmt::Display for UserResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserColor {
    White,
    Black,
    None,
}

impl fmt::Display for UserColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::White => "white",
            Self::Black => "black",
            Self::None => "none",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    ChessCom,
    Lichess,
    Unknown,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ChessCom => "Chess.com",
            Self::Lichess => "Lichess",
            Self::Unknown => "unknown",
        })
    }
}

/// Manual game-type override offered for pasted games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    Rated,
    Casual,
    Guest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub rating: i32,
    pub username: String,
    #[serde(default)]
    pub rating_diff: Option<i32>,
}

/// Source-agnostic game record produced by the normalizer.
///
/// Serialized field names follow the proxy's wire format, which mixes
/// snake_case (`time_control`, `time_class`) with camelCase (`userResult`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalGame {
    pub id: String,
    pub url: String,
    pub pgn: String,
    pub time_control: String,
    pub time_class: TimeClass,
    pub rated: bool,
    #[serde(rename = "isGuest", default, skip_serializing_if = "Option::is_none")]
    pub is_guest: Option<bool>,
    pub white: PlayerInfo,
    pub black: PlayerInfo,
    #[serde(rename = "userResult")]
    pub user_result: UserResult,
    #[serde(rename = "userColor")]
    pub user_color: UserColor,
    #[serde(rename = "endTime")]
    pub end_time: i64,
}

impl CanonicalGame {
    pub fn platform(&self) -> Platform {
        if self.url.contains("lichess.org") {
            Platform::Lichess
        } else if self.url.contains("chess.com") {
            Platform::ChessCom
        } else {
            Platform::Unknown
        }
    }

    /// Player entry on the user's side, if a color is known.
    pub fn user_player(&self) -> Option<&PlayerInfo> {
        match self.user_color {
            UserColor::White => Some(&self.white),
            UserColor::Black => Some(&self.black),
            UserColor::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CanonicalGame {
        CanonicalGame {
            id: "https://lichess.org/abc123".to_string(),
            url: "https://lichess.org/abc123".to_string(),
            pgn: "[Event \"Rated blitz game\"]".to_string(),
            time_control: "180+2".to_string(),
            time_class: TimeClass::Blitz,
            rated: true,
            is_guest: None,
            white: PlayerInfo {
                rating: 1500,
                username: "alice".to_string(),
                rating_diff: Some(7),
            },
            black: PlayerInfo {
                rating: 1480,
                username: "bob".to_string(),
                rating_diff: None,
            },
            user_result: UserResult::Win,
            user_color: UserColor::White,
            end_time: 1_700_000_000,
        }
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["time_class"], "blitz");
        assert_eq!(json["userResult"], "win");
        assert_eq!(json["userColor"], "white");
        assert_eq!(json["endTime"], 1_700_000_000);
        assert_eq!(json["white"]["ratingDiff"], 7);
        assert!(json["black"]["ratingDiff"].is_null());
        assert!(json.get("isGuest").is_none());
    }

    #[test]
    fn test_platform_from_url() {
        let mut game = sample();
        assert_eq!(game.platform(), Platform::Lichess);
        game.url = "https://www.chess.com/game/live/1".to_string();
        assert_eq!(game.platform(), Platform::ChessCom);
        game.url = "?".to_string();
        assert_eq!(game.platform(), Platform::Unknown);
    }

    #[test]
    fn test_time_class_platform_labels() {
        assert_eq!(TimeClass::from_platform_label("ultraBullet"), Some(TimeClass::Bullet));
        assert_eq!(TimeClass::from_platform_label("rapid"), Some(TimeClass::Rapid));
        assert_eq!(TimeClass::from_platform_label("daily"), None);
        assert_eq!(TimeClass::from_platform_label("correspondence"), None);
    }

    #[test]
    fn test_user_player_follows_color() {
        let mut game = sample();
        assert_eq!(game.user_player().map(|p| p.username.as_str()), Some("alice"));
        game.user_color = UserColor::None;
        assert!(game.user_player().is_none());
    }
}
