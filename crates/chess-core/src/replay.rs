//! Replay SAN move lists into positions using shakmaty.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};
use thiserror::Error;

use crate::game_data::Color;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("move {ply} ({san}): {reason}")]
pub struct ReplayError {
    /// 0-based ply index of the offending move
    pub ply: usize,
    pub san: String,
    pub reason: String,
}

/// One move of the main line, with the positions around it.
#[derive(Debug, Clone)]
pub struct ReplayedPly {
    pub ply: usize,
    pub san: String,
    pub uci: String,
    pub mover: Color,
    pub fen_before: String,
    pub fen_after: String,
    pub gives_checkmate: bool,
}

impl ReplayedPly {
    /// Full-move number as printed in PGN ("12." for both 12. and 12...).
    pub fn move_number(&self) -> usize {
        self.ply / 2 + 1
    }
}

/// Result of walking a move list. Replay stops at the first bad move; the
/// plies before it stay usable.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    pub plies: Vec<ReplayedPly>,
    pub error: Option<ReplayError>,
}

impl Replay {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

fn clean_san(san: &str) -> &str {
    san.trim()
        .trim_end_matches(|c: char| c == '+' || c == '#' || c == '!' || c == '?')
}

/// Replay SAN moves from the standard starting position.
pub fn replay_san(moves: &[String]) -> Replay {
    let mut pos = Chess::default();
    let mut replay = Replay::default();

    for (ply, san_str) in moves.iter().enumerate() {
        let fail = |reason: String| ReplayError {
            ply,
            san: san_str.clone(),
            reason,
        };

        let san: San = match clean_san(san_str).parse() {
            Ok(san) => san,
            Err(e) => {
                replay.error = Some(fail(format!("invalid SAN: {e}")));
                break;
            }
        };
        let mv = match san.to_move(&pos) {
            Ok(mv) => mv,
            Err(e) => {
                replay.error = Some(fail(format!("illegal move: {e}")));
                break;
            }
        };

        let fen_before = fen_of(&pos);
        let uci = UciMove::from_standard(mv).to_string();
        let mover = Color::at_ply(ply);
        pos.play_unchecked(mv);

        replay.plies.push(ReplayedPly {
            ply,
            san: san_str.trim().to_string(),
            uci,
            mover,
            fen_before,
            fen_after: fen_of(&pos),
            gives_checkmate: pos.is_checkmate(),
        });
    }

    replay
}

/// Convert a SAN line played from `fen` into UCI moves.
pub fn san_line_to_uci(fen: &str, line: &[String]) -> Result<Vec<String>, ReplayError> {
    let setup: Fen = fen.parse().map_err(|e| ReplayError {
        ply: 0,
        san: String::new(),
        reason: format!("invalid FEN '{fen}': {e}"),
    })?;
    let mut pos: Chess = setup
        .into_position(CastlingMode::Standard)
        .map_err(|e| ReplayError {
            ply: 0,
            san: String::new(),
            reason: format!("illegal position '{fen}': {e}"),
        })?;

    let mut ucis = Vec::with_capacity(line.len());
    for (i, san_str) in line.iter().enumerate() {
        let mv = clean_san(san_str)
            .parse::<San>()
            .map_err(|e| e.to_string())
            .and_then(|san| san.to_move(&pos).map_err(|e| e.to_string()))
            .map_err(|reason| ReplayError {
                ply: i,
                san: san_str.clone(),
                reason,
            })?;
        ucis.push(UciMove::from_standard(mv).to_string());
        pos.play_unchecked(mv);
    }
    Ok(ucis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_replay_scholars_mate() {
        let replay = replay_san(&moves("e4 e5 Bc4 Nc6 Qh5 Nf6 Qxf7#"));
        assert!(replay.is_complete());
        assert_eq!(replay.plies.len(), 7);
        assert_eq!(replay.plies[0].fen_before, STARTING_FEN);
        assert_eq!(replay.plies[0].uci, "e2e4");
        assert_eq!(replay.plies[6].uci, "h5f7");
        assert_eq!(replay.plies[6].mover, Color::White);
        assert_eq!(replay.plies[6].move_number(), 4);
        assert!(replay.plies[6].gives_checkmate);
        assert!(!replay.plies[5].gives_checkmate);
    }

    #[test]
    fn test_replay_stops_at_illegal_move() {
        let replay = replay_san(&moves("e4 e5 Ke3 Nc6"));
        assert_eq!(replay.plies.len(), 2);
        let err = replay.error.unwrap();
        assert_eq!(err.ply, 2);
        assert_eq!(err.san, "Ke3");
    }

    #[test]
    fn test_replay_rejects_garbage() {
        let replay = replay_san(&moves("e4 zz9"));
        assert_eq!(replay.plies.len(), 1);
        assert_eq!(replay.error.unwrap().ply, 1);
    }

    #[test]
    fn test_san_line_to_uci() {
        let ucis = san_line_to_uci(STARTING_FEN, &moves("Nf3 d5 g3")).unwrap();
        assert_eq!(ucis, vec!["g1f3", "d7d5", "g2g3"]);
        assert!(san_line_to_uci(STARTING_FEN, &moves("Nf6")).is_err());
    }
}
