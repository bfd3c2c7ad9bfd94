//! Minimal Lichess API client: public profile and game export.

pub mod client;
pub mod error;
pub mod types;

pub use client::{GameQuery, LichessClient, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use types::{parse_games_ndjson, GameExport, RejectedGame, UserProfile};
