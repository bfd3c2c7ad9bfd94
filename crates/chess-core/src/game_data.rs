use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Side that plays the move at a 0-based ply index of a standard game.
    pub fn at_ply(ply: usize) -> Self {
        if ply % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl std::ops::Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub title: Option<String>,
    pub rating: Option<u32>,
}

/// How a game ended. `Mate` is the terminal-move checkmate flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Mate,
    Resign,
    Stalemate,
    Timeout,
    OutOfTime,
    Draw,
    Aborted,
    Started,
    Other(String),
}

impl GameStatus {
    /// Map a Lichess `status` field.
    pub fn from_lichess(status: &str) -> Self {
        match status {
            "mate" => GameStatus::Mate,
            "resign" => GameStatus::Resign,
            "stalemate" => GameStatus::Stalemate,
            "timeout" => GameStatus::Timeout,
            "outoftime" => GameStatus::OutOfTime,
            "draw" => GameStatus::Draw,
            "aborted" | "noStart" => GameStatus::Aborted,
            "created" | "started" => GameStatus::Started,
            other => GameStatus::Other(other.to_string()),
        }
    }

    pub fn is_checkmate(&self) -> bool {
        matches!(self, GameStatus::Mate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opening {
    pub eco: String,
    pub name: String,
    pub ply: u32,
}

/// The platform's own verdict on a move ("Blunder", "Mistake", "Inaccuracy").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgment {
    pub name: String,
    pub comment: Option<String>,
}

/// Evaluation embedded in a game record for the position after one ply.
/// Scores are from white's point of view, as Lichess reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformEval {
    pub score: Option<Score>,
    /// Best move (UCI) instead of the move actually played at this ply
    pub best: Option<String>,
    /// Best line (SAN) from the position before this ply
    pub variation: Vec<String>,
    pub judgment: Option<Judgment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub white: PlayerInfo,
    pub black: PlayerInfo,
    /// SAN moves in ply order
    pub moves: Vec<String>,
    pub status: GameStatus,
    pub winner: Option<Color>,
    pub time_control: Option<String>,
    pub speed: Option<String>,
    pub rated: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub opening: Option<Opening>,
    /// One entry per ply when the platform analysed the game, else empty
    pub evaluations: Vec<PlatformEval>,
}

impl Game {
    /// Which side `username` played, compared case-insensitively.
    pub fn side_of(&self, username: &str) -> Option<Color> {
        if self.white.name.eq_ignore_ascii_case(username) {
            Some(Color::White)
        } else if self.black.name.eq_ignore_ascii_case(username) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn player(&self, color: Color) -> &PlayerInfo {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn opponent_of(&self, color: Color) -> &PlayerInfo {
        self.player(!color)
    }

    pub fn has_evaluations(&self) -> bool {
        !self.evaluations.is_empty() && self.evaluations.iter().any(|e| e.score.is_some())
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// "1-0", "0-1" or "1/2-1/2" for finished games, "*" otherwise.
    pub fn result(&self) -> &'static str {
        match (&self.winner, &self.status) {
            (Some(Color::White), _) => "1-0",
            (Some(Color::Black), _) => "0-1",
            (None, GameStatus::Started) | (None, GameStatus::Aborted) => "*",
            (None, _) => "1/2-1/2",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(white: &str, black: &str) -> Game {
        Game {
            id: "abcd1234".to_string(),
            white: PlayerInfo { name: white.to_string(), ..Default::default() },
            black: PlayerInfo { name: black.to_string(), ..Default::default() },
            moves: vec!["e4".into(), "e5".into()],
            status: GameStatus::Resign,
            winner: Some(Color::Black),
            time_control: None,
            speed: None,
            rated: true,
            created_at: None,
            opening: None,
            evaluations: Vec::new(),
        }
    }

    #[test]
    fn test_side_of_ignores_case() {
        let g = game("DrApi", "someone");
        assert_eq!(g.side_of("drapi"), Some(Color::White));
        assert_eq!(g.side_of("SOMEONE"), Some(Color::Black));
        assert_eq!(g.side_of("nobody"), None);
        assert_eq!(g.opponent_of(Color::White).name, "someone");
    }

    #[test]
    fn test_status_mapping() {
        assert!(GameStatus::from_lichess("mate").is_checkmate());
        assert_eq!(GameStatus::from_lichess("outoftime"), GameStatus::OutOfTime);
        assert_eq!(
            GameStatus::from_lichess("variantEnd"),
            GameStatus::Other("variantEnd".into())
        );
        assert_eq!(game("a", "b").result(), "0-1");
    }

    #[test]
    fn test_color_at_ply() {
        assert_eq!(Color::at_ply(0), Color::White);
        assert_eq!(Color::at_ply(7), Color::Black);
        assert_eq!(!Color::White, Color::Black);
    }
}
