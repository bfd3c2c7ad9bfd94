//! Engine scores in centipawns or mate distance.

use serde::{Deserialize, Serialize};

/// Centipawn value a mate score is mapped to before the distance penalty.
pub const MATE_CP: i32 = 10000;

/// Anything beyond this (in absolute centipawns) is a forced mate.
pub const MATE_THRESHOLD: i32 = 9000;

/// A position score. The perspective (white or side to move) is decided by
/// whoever holds the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Cp(i32),
    /// Mate in N moves (positive = this side mates, negative = gets mated)
    Mate(i32),
}

impl Score {
    /// Collapse to a single centipawn number. Shorter mates score higher.
    pub fn to_cp(self) -> i32 {
        match self {
            Score::Cp(cp) => cp,
            Score::Mate(m) if m > 0 => MATE_CP - m * 10,
            Score::Mate(m) => -MATE_CP - m * 10,
        }
    }

    /// Same score seen by the other side.
    pub fn negate(self) -> Self {
        match self {
            Score::Cp(cp) => Score::Cp(-cp),
            Score::Mate(m) => Score::Mate(-m),
        }
    }

    /// Mate distance if this side is the one delivering mate.
    pub fn mating_in(self) -> Option<u32> {
        match self {
            Score::Mate(m) if m > 0 => Some(m as u32),
            _ => None,
        }
    }
}

/// True when a collapsed centipawn value stands for a forced mate.
pub fn is_mate_cp(cp: i32) -> bool {
    cp.abs() > MATE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_to_cp() {
        assert_eq!(Score::Mate(1).to_cp(), 9990);
        assert_eq!(Score::Mate(-2).to_cp(), -9980);
        assert!(Score::Mate(3).to_cp() > Score::Mate(5).to_cp());
        assert!(is_mate_cp(Score::Mate(-7).to_cp()));
        assert!(!is_mate_cp(Score::Cp(850).to_cp()));
    }

    #[test]
    fn test_negate() {
        assert_eq!(Score::Cp(35).negate(), Score::Cp(-35));
        assert_eq!(Score::Mate(2).negate(), Score::Mate(-2));
        assert_eq!(Score::Mate(2).mating_in(), Some(2));
        assert_eq!(Score::Mate(-2).mating_in(), None);
    }
}
