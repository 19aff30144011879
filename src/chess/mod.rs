pub mod endtime;
pub mod error;
pub mod headers;
pub mod input;
pub mod normalize;
pub mod outcome;
pub mod platform;
pub mod split;
pub mod timecontrol;
pub mod types;

pub use error::{ErrorAccumulator, InputError, ParseError};
pub use normalize::{
    ChessComGame, LichessGame, NormalizeContext, PastedBatch, PastedPgn, RawGameSource,
    parse_from_chess_com_api, parse_from_lichess_api, parse_pasted_batch, parse_pasted_pgn,
};
pub use split::split_multiple_pgns;
pub use types::{CanonicalGame, GameType, Platform, PlayerInfo, TimeClass, UserColor, UserResult};
