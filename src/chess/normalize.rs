//! Normalization of the three game sources into [`CanonicalGame`].
//!
//! Platform imports (Chess.com, Lichess) attribute color and result by
//! matching the configured username. Pasted PGN leaves the color unset; it
//! is assigned later by the user (see [`crate::session::ImportSession::assign_color`]).

use super::endtime::resolve_end_time;
use super::error::{ErrorAccumulator, ParseError};
use super::headers::{Headers, result_tag};
use super::outcome::determine_by_username;
use super::platform::{canonical_url, detect_platform};
use super::split::split_multiple_pgns;
use super::timecontrol::{self, UNKNOWN_TIME_CONTROL};
use super::types::{CanonicalGame, Platform, PlayerInfo, TimeClass, UserColor, UserResult};
use crate::settings::Settings;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const UNKNOWN_TAG: &str = "unknown";
const ANONYMOUS_PLAYER: &str = "Anonymous";

/// Inputs the normalizer needs besides the raw game.
#[derive(Debug, Clone, Default)]
pub struct NormalizeContext {
    pub chess_com_username: String,
    pub lichess_username: String,
    /// Fixed clock for end-time fallbacks; `None` reads the system clock.
    pub now: Option<DateTime<Local>>,
}

impl NormalizeContext {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            chess_com_username: settings.chess_com_username.clone(),
            lichess_username: settings.lichess_username.clone(),
            now: None,
        }
    }

    pub fn with_now(mut self, now: DateTime<Local>) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Local> {
        self.now.unwrap_or_else(Local::now)
    }
}

/// Anything that can be turned into a canonical game record.
pub trait RawGameSource {
    fn normalize(&self, ctx: &NormalizeContext) -> Result<CanonicalGame, ParseError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessComPlayer {
    pub rating: i32,
    pub result: String,
    pub username: String,
}

/// One entry of a Chess.com monthly archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessComGame {
    pub url: String,
    pub pgn: String,
    pub time_control: String,
    pub end_time: i64,
    pub rated: bool,
    pub time_class: String,
    pub white: ChessComPlayer,
    pub black: ChessComPlayer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LichessClock {
    pub initial: u32,
    pub increment: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LichessUserRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LichessPlayer {
    pub user: Option<LichessUserRef>,
    pub rating: Option<i32>,
    pub rating_diff: Option<i32>,
    pub ai_level: Option<u8>,
}

impl LichessPlayer {
    fn username(&self) -> String {
        match (&self.user, self.ai_level) {
            (Some(user), _) => user.name.clone(),
            (None, Some(level)) => format!("AI level {level}"),
            (None, None) => ANONYMOUS_PLAYER.to_string(),
        }
    }

    fn to_player_info(&self) -> PlayerInfo {
        let rating_diff = self.rating_diff.filter(|diff| *diff != 0);
        PlayerInfo {
            rating: self.rating.unwrap_or(0) + rating_diff.unwrap_or(0),
            username: self.username(),
            rating_diff,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LichessPlayers {
    pub white: LichessPlayer,
    pub black: LichessPlayer,
}

/// One line of the Lichess ND-JSON game export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LichessGame {
    pub id: String,
    pub rated: bool,
    pub speed: String,
    pub last_move_at: i64,
    pub clock: Option<LichessClock>,
    pub players: LichessPlayers,
    pub pgn: String,
}

impl LichessGame {
    pub fn url(&self) -> String {
        format!("https://lichess.org/{}", self.id)
    }
}

/// Raw text of one pasted PGN game.
#[derive(Debug, Clone, Copy)]
pub struct PastedPgn<'a>(pub &'a str);

fn is_guest_name(name: &str) -> bool {
    name.starts_with("Guest") || name == ANONYMOUS_PLAYER
}

fn is_guest_game(white: &str, black: &str) -> bool {
    is_guest_name(white) || is_guest_name(black)
}

// Derived from the clock; the platform label only fills in when the clock
// cannot be read.
fn api_time_class(label: &str, time_control: &str) -> TimeClass {
    match timecontrol::classify_time_control(time_control) {
        TimeClass::Unknown => TimeClass::from_platform_label(label).unwrap_or(TimeClass::Unknown),
        class => class,
    }
}

impl ChessComGame {
    fn to_canonical(&self, ctx: &NormalizeContext) -> CanonicalGame {
        let result = result_tag(&self.pgn);
        let (user_result, user_color) = determine_by_username(
            result.as_deref(),
            &ctx.chess_com_username,
            &self.white.username,
            &self.black.username,
        );

        let time_control = if self.time_control.trim().is_empty() {
            UNKNOWN_TIME_CONTROL.to_string()
        } else {
            timecontrol::normalize_time_control(&self.time_control)
        };

        CanonicalGame {
            id: self.url.clone(),
            url: self.url.clone(),
            pgn: self.pgn.clone(),
            time_class: api_time_class(&self.time_class, &time_control),
            time_control,
            rated: self.rated,
            is_guest: Some(is_guest_game(&self.white.username, &self.black.username)),
            white: PlayerInfo {
                rating: self.white.rating,
                username: self.white.username.clone(),
                rating_diff: None,
            },
            black: PlayerInfo {
                rating: self.black.rating,
                username: self.black.username.clone(),
                rating_diff: None,
            },
            user_result,
            user_color,
            end_time: self.end_time,
        }
    }
}

impl RawGameSource for ChessComGame {
    fn normalize(&self, ctx: &NormalizeContext) -> Result<CanonicalGame, ParseError> {
        Ok(self.to_canonical(ctx))
    }
}

impl LichessGame {
    fn to_canonical(&self, ctx: &NormalizeContext) -> CanonicalGame {
        let white = self.players.white.to_player_info();
        let black = self.players.black.to_player_info();

        let result = result_tag(&self.pgn);
        let (user_result, user_color) = determine_by_username(
            result.as_deref(),
            &ctx.lichess_username,
            &white.username,
            &black.username,
        );

        let time_control = match self.clock {
            Some(clock) => timecontrol::from_clock(clock.initial, clock.increment),
            None => UNKNOWN_TIME_CONTROL.to_string(),
        };
        let url = self.url();

        CanonicalGame {
            id: url.clone(),
            url,
            pgn: self.pgn.clone(),
            time_class: api_time_class(&self.speed, &time_control),
            time_control,
            rated: self.rated,
            is_guest: Some(is_guest_game(&white.username, &black.username)),
            white,
            black,
            user_result,
            user_color,
            end_time: self.last_move_at.div_euclid(1000),
        }
    }
}

impl RawGameSource for LichessGame {
    fn normalize(&self, ctx: &NormalizeContext) -> Result<CanonicalGame, ParseError> {
        Ok(self.to_canonical(ctx))
    }
}

impl RawGameSource for PastedPgn<'_> {
    fn normalize(&self, ctx: &NormalizeContext) -> Result<CanonicalGame, ParseError> {
        let pgn = self.0;
        let headers = Headers::parse(pgn);
        if headers.is_empty() {
            return Err(ParseError::NoHeaders);
        }

        let site = headers.get("Site").ok_or(ParseError::MissingSite)?;
        let platform = detect_platform(site);
        let url = canonical_url(platform, &headers)
            .ok_or(match platform {
                Platform::ChessCom => ParseError::MissingLink,
                Platform::Lichess | Platform::Unknown => ParseError::MissingSite,
            })?
            .to_string();

        let white_name = headers.get_or("White", UNKNOWN_TAG);
        let black_name = headers.get_or("Black", UNKNOWN_TAG);

        let raw_time_control = headers.get_or("TimeControl", UNKNOWN_TIME_CONTROL);
        let time_control = if raw_time_control == UNKNOWN_TIME_CONTROL {
            raw_time_control.to_string()
        } else {
            timecontrol::normalize_time_control(raw_time_control)
        };

        let end_time = resolve_end_time(
            headers.first_of(&["UTCDate", "Date"]),
            headers.first_of(&["EndTime", "UTCTime"]),
            ctx.now(),
        );

        debug!(url = %url, platform = %platform, "parsed pasted game");

        Ok(CanonicalGame {
            id: url.clone(),
            url,
            pgn: pgn.to_string(),
            time_class: timecontrol::classify_time_control(raw_time_control),
            time_control,
            rated: headers
                .get_or("Event", UNKNOWN_TAG)
                .to_lowercase()
                .contains("rated"),
            is_guest: Some(is_guest_game(white_name, black_name)),
            white: PlayerInfo {
                rating: headers.int_or("WhiteElo", 0),
                username: white_name.to_string(),
                rating_diff: headers.optional_int("WhiteRatingDiff"),
            },
            black: PlayerInfo {
                rating: headers.int_or("BlackElo", 0),
                username: black_name.to_string(),
                rating_diff: headers.optional_int("BlackRatingDiff"),
            },
            user_result: UserResult::Unknown,
            user_color: UserColor::None,
            end_time,
        })
    }
}

pub fn parse_from_chess_com_api(raw: &ChessComGame, ctx: &NormalizeContext) -> CanonicalGame {
    raw.to_canonical(ctx)
}

pub fn parse_from_lichess_api(raw: &LichessGame, ctx: &NormalizeContext) -> CanonicalGame {
    raw.to_canonical(ctx)
}

/// Parses one pasted game; failures are logged and yield `None`.
pub fn parse_pasted_pgn(text: &str, ctx: &NormalizeContext) -> Option<CanonicalGame> {
    match PastedPgn(text).normalize(ctx) {
        Ok(game) => Some(game),
        Err(err) => {
            warn!(error = %err, "Failed to parse PGN");
            None
        }
    }
}

/// Outcome of parsing a whole paste.
#[derive(Debug, Default)]
pub struct PastedBatch {
    pub games: Vec<CanonicalGame>,
    pub failed: usize,
    pub errors: ErrorAccumulator,
}

/// Splits `text` into games and parses each one; a bad fragment is recorded
/// and skipped without aborting the rest.
pub fn parse_pasted_batch(text: &str, ctx: &NormalizeContext) -> PastedBatch {
    let mut batch = PastedBatch::default();

    for (index, fragment) in split_multiple_pgns(text).into_iter().enumerate() {
        match PastedPgn(fragment).normalize(ctx) {
            Ok(game) => batch.games.push(game),
            Err(err) => {
                let game_index = index + 1;
                warn!(fragment = game_index, error = %err, "Skipping unparsable PGN fragment");
                batch.failed += 1;
                batch.errors.push(&format!("fragment {game_index}: {err}"));
            }
        }
    }

    batch
}
