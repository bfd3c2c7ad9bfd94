//! Game phase tagging and endgame classification.

use std::fmt;

use chess::{Board, Color, Piece};
use serde::{Deserialize, Serialize};

use crate::board_utils::total_material;

/// Plies (0-based, exclusive) that count as the opening.
pub const OPENING_PLIES: usize = 20;

/// Non-king material (P1 N3 B3 R5 Q9) at or below which a position is an endgame.
pub const ENDGAME_MATERIAL: i32 = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Middlegame => "middlegame",
            Phase::Endgame => "endgame",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of the position a move is played from, ignoring history.
pub fn phase_of(board: &Board, ply: usize) -> Phase {
    if total_material(board) <= ENDGAME_MATERIAL {
        Phase::Endgame
    } else if ply < OPENING_PLIES {
        Phase::Opening
    } else {
        Phase::Middlegame
    }
}

/// Tags moves in ply order. The phase never goes back (a promotion can push
/// material back above the endgame line), so each phase is one contiguous run.
#[derive(Debug, Default, Clone)]
pub struct PhaseTracker {
    current: Option<Phase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, board: &Board, ply: usize) -> Phase {
        let phase = phase_of(board, ply);
        let phase = match self.current {
            Some(prev) if prev > phase => prev,
            _ => phase,
        };
        self.current = Some(phase);
        phase
    }

    pub fn current(&self) -> Option<Phase> {
        self.current
    }
}

// Bit flags for non-pawn piece types
const KNIGHT_FLAG: u8 = 1;
const BISHOP_FLAG: u8 = 2;
const ROOK_FLAG: u8 = 4;
const QUEEN_FLAG: u8 = 8;

/// Endgame family by the pieces left on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndgameKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    QueenRook,
}

/// Get the set of non-pawn, non-king piece types for a color as bit flags.
fn non_pawn_types(board: &Board, color: Color) -> u8 {
    let color_bb = *board.color_combined(color);
    let mut flags = 0u8;
    if (color_bb & *board.pieces(Piece::Knight)).popcnt() > 0 {
        flags |= KNIGHT_FLAG;
    }
    if (color_bb & *board.pieces(Piece::Bishop)).popcnt() > 0 {
        flags |= BISHOP_FLAG;
    }
    if (color_bb & *board.pieces(Piece::Rook)).popcnt() > 0 {
        flags |= ROOK_FLAG;
    }
    if (color_bb & *board.pieces(Piece::Queen)).popcnt() > 0 {
        flags |= QUEEN_FLAG;
    }
    flags
}

/// Classify a position into an endgame family, None when several piece
/// families are still on the board.
pub fn classify_endgame(board: &Board) -> Option<EndgameKind> {
    let w_types = non_pawn_types(board, Color::White);
    let b_types = non_pawn_types(board, Color::Black);
    let all = w_types | b_types;

    match all {
        0 => Some(EndgameKind::Pawn),
        KNIGHT_FLAG => Some(EndgameKind::Knight),
        BISHOP_FLAG => Some(EndgameKind::Bishop),
        ROOK_FLAG => Some(EndgameKind::Rook),
        QUEEN_FLAG => Some(EndgameKind::Queen),
        // One side must hold both the queen and the rook
        _ if all == QUEEN_FLAG | ROOK_FLAG
            && (w_types == QUEEN_FLAG | ROOK_FLAG || b_types == QUEEN_FLAG | ROOK_FLAG) =>
        {
            Some(EndgameKind::QueenRook)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    #[test]
    fn test_phase_of() {
        let start = Board::default();
        assert_eq!(phase_of(&start, 0), Phase::Opening);
        assert_eq!(phase_of(&start, 19), Phase::Opening);
        assert_eq!(phase_of(&start, 20), Phase::Middlegame);

        let rook_ending = board("4k3/pp3ppp/8/8/8/8/PP3PPP/3RK3 w - - 0 30");
        assert_eq!(phase_of(&rook_ending, 5), Phase::Endgame);
    }

    #[test]
    fn test_tracker_never_goes_back() {
        let mut tracker = PhaseTracker::new();
        let ending = board("4k3/4P3/8/8/8/8/8/4K3 w - - 0 60");
        assert_eq!(tracker.observe(&Board::default(), 3), Phase::Opening);
        assert_eq!(tracker.observe(&ending, 4), Phase::Endgame);
        // Material back above the line, but we stay in the endgame
        assert_eq!(tracker.observe(&Board::default(), 30), Phase::Endgame);
        assert_eq!(tracker.current(), Some(Phase::Endgame));
    }

    #[test]
    fn test_classify_endgame() {
        assert_eq!(
            classify_endgame(&board("4k3/pp6/8/8/8/8/PP6/4K3 w - - 0 1")),
            Some(EndgameKind::Pawn)
        );
        assert_eq!(
            classify_endgame(&board("3rk3/pp6/8/8/8/8/PP6/3RK3 w - - 0 1")),
            Some(EndgameKind::Rook)
        );
        assert_eq!(
            classify_endgame(&board("3rk3/pp6/8/8/8/8/PP6/3QK2R w - - 0 1")),
            Some(EndgameKind::QueenRook)
        );
        assert_eq!(
            classify_endgame(&board("3qk3/8/8/8/8/8/8/3RK3 w - - 0 1")),
            None
        );
        assert_eq!(classify_endgame(&Board::default()), None);
    }
}
