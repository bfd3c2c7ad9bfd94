//! Analyzer error types

use lichess_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lichess error: {0}")]
    Client(#[from] ClientError),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Game {game_id}, ply {ply}: {source}")]
    InGame {
        game_id: String,
        ply: usize,
        #[source]
        source: Box<AnalyzerError>,
    },

    #[error("Player {username} did not play in game {game_id}")]
    PlayerNotInGame { game_id: String, username: String },

    #[error("PGN error: {0}")]
    Pgn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    /// Attach the game and ply an error happened at.
    pub fn in_game(self, game_id: &str, ply: usize) -> Self {
        AnalyzerError::InGame {
            game_id: game_id.to_string(),
            ply,
            source: Box::new(self),
        }
    }
}
