/// Move classification — pure functions only
/// (No Board/Engine/Game dependencies)
///
/// Scores passed in here are always from the mover's point of view.

use std::fmt;

use chess_core::score::is_mate_cp;
use chess_core::Score;
use serde::{Deserialize, Serialize};

use crate::config::Thresholds;

/// Maximum CP loss to cap at
pub const MAX_CP_LOSS: i32 = 1000;

/// Severity tiers, ordered by how much a move gave away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Inaccuracy,
    Mistake,
    Blunder,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Inaccuracy, Severity::Mistake, Severity::Blunder];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Inaccuracy => "inaccuracy",
            Severity::Mistake => "mistake",
            Severity::Blunder => "blunder",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Losing a forced mate, or walking into one, regardless of centipawns.
///
/// `before` is the mover's score before the move, `after` the mover's score
/// after it.
pub fn is_mate_blunder(before: Score, after: Score, gives_checkmate: bool) -> bool {
    if gives_checkmate {
        return false;
    }

    let had_mate = before.mating_in().is_some();
    let gets_mated = matches!(after, Score::Mate(m) if m <= 0);
    let was_getting_mated = matches!(before, Score::Mate(m) if m <= 0);

    if had_mate && after.mating_in().is_none() {
        return true;
    }

    gets_mated && !was_getting_mated
}

/// Centipawns the mover gave away, clamped to `0..=MAX_CP_LOSS`.
pub fn calculate_cp_loss(before: Score, after: Score, gives_checkmate: bool) -> i32 {
    if gives_checkmate {
        return 0;
    }

    let before_cp = before.to_cp();
    let after_cp = after.to_cp();

    if is_mate_cp(before_cp) && is_mate_cp(after_cp) {
        if (before_cp > 0) == (after_cp > 0) {
            return 0;
        } else {
            return MAX_CP_LOSS;
        }
    }

    (before_cp - after_cp).clamp(0, MAX_CP_LOSS)
}

/// Bucket a loss. `None` means the move was fine.
pub fn classify_move(cp_loss: i32, mate_blunder: bool, thresholds: &Thresholds) -> Option<Severity> {
    if mate_blunder {
        return Some(Severity::Blunder);
    }
    if cp_loss > thresholds.blunder {
        Some(Severity::Blunder)
    } else if cp_loss > thresholds.mistake {
        Some(Severity::Mistake)
    } else if cp_loss > thresholds.inaccuracy {
        Some(Severity::Inaccuracy)
    } else {
        None
    }
}

pub fn calculate_accuracy(total_cp_loss: i32, move_count: u32) -> f64 {
    if move_count == 0 {
        return 100.0;
    }
    let acpl = total_cp_loss as f64 / move_count as f64;
    let accuracy = 100.0 * (1.0 / (1.0 + acpl / 100.0)).sqrt();
    accuracy.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_move() {
        let t = Thresholds::default();
        assert_eq!(classify_move(0, false, &t), None);
        assert_eq!(classify_move(50, false, &t), None);
        assert_eq!(classify_move(75, false, &t), Some(Severity::Inaccuracy));
        assert_eq!(classify_move(150, false, &t), Some(Severity::Mistake));
        assert_eq!(classify_move(250, false, &t), Some(Severity::Blunder));
        assert_eq!(classify_move(0, true, &t), Some(Severity::Blunder));
    }

    #[test]
    fn test_classification_is_monotonic() {
        let t = Thresholds::default();
        let mut previous = None;
        for loss in 0..=MAX_CP_LOSS {
            let severity = classify_move(loss, false, &t);
            assert!(severity >= previous, "loss {loss} ranked below a smaller loss");
            previous = severity;
        }
    }

    #[test]
    fn test_calculate_accuracy() {
        assert!((calculate_accuracy(0, 20) - 100.0).abs() < 0.1);
        assert!((calculate_accuracy(500, 20) - 89.4).abs() < 1.0);
        assert!((calculate_accuracy(2000, 20) - 70.7).abs() < 1.0);
        assert_eq!(calculate_accuracy(0, 0), 100.0);
    }

    #[test]
    fn test_cp_loss_calculation() {
        assert_eq!(calculate_cp_loss(Score::Cp(100), Score::Cp(80), false), 20);
        assert_eq!(calculate_cp_loss(Score::Cp(-100), Score::Cp(-20), false), 0);
        assert_eq!(calculate_cp_loss(Score::Cp(30), Score::Cp(-900), false), 930);
        assert_eq!(calculate_cp_loss(Score::Cp(30), Score::Cp(-5000), false), MAX_CP_LOSS);
        assert_eq!(calculate_cp_loss(Score::Mate(1), Score::Cp(0), true), 0);
        assert_eq!(calculate_cp_loss(Score::Mate(2), Score::Mate(1), false), 0);
        assert_eq!(calculate_cp_loss(Score::Mate(2), Score::Mate(-3), false), MAX_CP_LOSS);
    }

    #[test]
    fn test_mate_blunder_detection() {
        assert!(!is_mate_blunder(Score::Mate(1), Score::Mate(0), true));
        assert!(is_mate_blunder(Score::Mate(3), Score::Cp(400), false));
        assert!(is_mate_blunder(Score::Cp(100), Score::Mate(-2), false));
        assert!(!is_mate_blunder(Score::Mate(-4), Score::Mate(-3), false));
        assert!(!is_mate_blunder(Score::Cp(100), Score::Cp(80), false));
        assert!(!is_mate_blunder(Score::Mate(3), Score::Mate(2), false));
    }
}
