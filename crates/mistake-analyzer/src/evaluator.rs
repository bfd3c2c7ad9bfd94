//! Where position evaluations come from: a local engine or the platform's
//! own analysis embedded in the game record.

use chess_core::replay::san_line_to_uci;
use chess_core::{Color, PlatformEval, Score};
use tracing::debug;

use crate::error::AnalyzerError;

/// Evaluation of one position, from the side to move's point of view.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Number of plies played to reach the position
    pub ply: usize,
    pub score: Score,
    /// Best move (UCI)
    pub best_move: Option<String>,
    /// Best line (UCI), starting with `best_move`
    pub line: Vec<String>,
}

/// Source of evaluations. Positions are asked for strictly in ply order, one
/// at a time.
#[allow(async_fn_in_trait)]
pub trait Evaluator {
    /// Evaluate the position reached after `ply` plies. `Ok(None)` means no
    /// evaluation is available for it.
    async fn evaluate(&mut self, ply: usize, fen: &str) -> Result<Option<Evaluation>, AnalyzerError>;
}

/// Serves the evaluations Lichess stored with the game.
///
/// `evals[i]` is the (white-perspective) score after ply `i`, plus the best
/// move and line the server suggested instead of ply `i`.
pub struct PlatformEvaluator<'a> {
    evals: &'a [PlatformEval],
}

impl<'a> PlatformEvaluator<'a> {
    pub fn new(evals: &'a [PlatformEval]) -> Self {
        Self { evals }
    }
}

impl Evaluator for PlatformEvaluator<'_> {
    async fn evaluate(&mut self, ply: usize, fen: &str) -> Result<Option<Evaluation>, AnalyzerError> {
        let white_score = if ply == 0 {
            // Lichess has no entry for the starting position
            Some(Score::Cp(0))
        } else {
            self.evals.get(ply - 1).and_then(|e| e.score)
        };
        let Some(white_score) = white_score else {
            return Ok(None);
        };

        let score = match Color::at_ply(ply) {
            Color::White => white_score,
            Color::Black => white_score.negate(),
        };

        let next = self.evals.get(ply);
        let best_move = next.and_then(|e| e.best.clone());
        let line = match next {
            Some(e) if !e.variation.is_empty() => match san_line_to_uci(fen, &e.variation) {
                Ok(line) => line,
                Err(err) => {
                    debug!(ply, error = %err, "Unreadable platform variation");
                    Vec::new()
                }
            },
            _ => best_move.iter().cloned().collect(),
        };

        Ok(Some(Evaluation {
            ply,
            score,
            best_move,
            line,
        }))
    }
}
