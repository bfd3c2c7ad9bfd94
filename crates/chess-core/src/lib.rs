//! Shared chess data model: games as fetched from Lichess or read from PGN,
//! engine scores, and SAN replay.

pub mod game_data;
pub mod pgn;
pub mod replay;
pub mod score;

pub use game_data::{Color, Game, GameStatus, Judgment, Opening, PlatformEval, PlayerInfo};
pub use replay::{replay_san, Replay, ReplayError, ReplayedPly, STARTING_FEN};
pub use score::Score;
