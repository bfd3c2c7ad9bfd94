//! Ply-by-ply walk over one game: evaluate every position, compare
//! consecutive evaluations and tag what went wrong.

use chess_core::{replay_san, Color, Game, Score};
use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::{calculate_accuracy, calculate_cp_loss, classify_move, is_mate_blunder, Severity};
use crate::board_utils::{board_from_fen, parse_uci_move};
use crate::config::Thresholds;
use crate::error::AnalyzerError;
use crate::evaluator::{Evaluation, Evaluator};
use crate::phase::{Phase, PhaseTracker};
use crate::themes::{master_theme, missed_themes, played_themes, MoveContext, Theme};

/// One flagged move. `severity` is None only for the record of a game's
/// final, checkmating move when that move was not itself a mistake.
#[derive(Debug, Clone, Serialize)]
pub struct Mistake {
    pub ply: usize,
    pub move_number: usize,
    pub san: String,
    pub mover: Color,
    pub severity: Option<Severity>,
    pub cp_loss: i32,
    /// Mover's score before the move
    pub eval_before: Option<Score>,
    /// Mover's score after the move
    pub eval_after: Option<Score>,
    pub phase: Option<Phase>,
    pub themes: Vec<Theme>,
    pub missed_themes: Vec<Theme>,
    pub best_move: Option<String>,
}

impl Mistake {
    pub fn has_theme(&self, theme: Theme) -> bool {
        self.themes.contains(&theme)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameReport {
    pub game_id: String,
    /// Side analysed, None when both were
    pub side: Option<Color>,
    pub opening: Option<String>,
    pub mistakes: Vec<Mistake>,
    /// Accuracy of the analysed side over the moves that had evaluations
    pub accuracy: Option<f64>,
    pub evaluation: EvaluationStatus,
    /// Moves compared against an evaluation
    pub analysed_moves: usize,
    /// Ply of the first unreadable move, if the game could not be replayed to the end
    pub truncated_at: Option<usize>,
}

impl GameReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.mistakes
            .iter()
            .filter(|m| m.severity == Some(severity))
            .count()
    }
}

pub struct GameAnalysis<'a> {
    game: &'a Game,
    side: Option<Color>,
    thresholds: Thresholds,
}

impl<'a> GameAnalysis<'a> {
    pub fn new(game: &'a Game, side: Option<Color>, thresholds: Thresholds) -> Self {
        Self {
            game,
            side,
            thresholds,
        }
    }

    /// Analyse the side `username` played.
    pub fn for_player(
        game: &'a Game,
        username: &str,
        thresholds: Thresholds,
    ) -> Result<Self, AnalyzerError> {
        let side = game
            .side_of(username)
            .ok_or_else(|| AnalyzerError::PlayerNotInGame {
                game_id: game.id.clone(),
                username: username.to_string(),
            })?;
        Ok(Self::new(game, Some(side), thresholds))
    }

    fn analyses(&self, mover: Color) -> bool {
        self.side.map_or(true, |side| side == mover)
    }

    /// Report for a game nothing could evaluate.
    pub fn unavailable(&self) -> GameReport {
        GameReport {
            game_id: self.game.id.clone(),
            side: self.side,
            opening: self.game.opening.as_ref().map(|o| o.name.clone()),
            mistakes: Vec::new(),
            accuracy: None,
            evaluation: EvaluationStatus::Unavailable,
            analysed_moves: 0,
            truncated_at: None,
        }
    }

    pub async fn run<E: Evaluator>(&self, evaluator: &mut E) -> Result<GameReport, AnalyzerError> {
        let game_id = self.game.id.as_str();
        let replay = replay_san(&self.game.moves);
        if let Some(err) = &replay.error {
            warn!(
                game_id,
                ply = err.ply,
                san = %err.san,
                reason = %err.reason,
                "Unreadable move, analysing the moves before it"
            );
        }
        let last_ply = replay.plies.len();
        let ended_in_mate = self.game.status.is_checkmate() && replay.is_complete();

        let master = master_theme(&self.game.white, &self.game.black);
        let mut tracker = PhaseTracker::new();
        let mut mistakes = Vec::new();
        let mut compared = 0usize;
        let mut total_loss = 0;
        let mut analysed_moves = 0u32;

        let mut previous: Option<Evaluation> = match replay.plies.first() {
            Some(first) => evaluator
                .evaluate(0, &first.fen_before)
                .await
                .map_err(|e| e.in_game(game_id, 0))?,
            None => None,
        };

        for ply in &replay.plies {
            let next = evaluator
                .evaluate(ply.ply + 1, &ply.fen_after)
                .await
                .map_err(|e| e.in_game(game_id, ply.ply + 1))?;

            let board = board_from_fen(&ply.fen_before);
            let phase = board.as_ref().map(|b| tracker.observe(b, ply.ply));
            let terminal_mate = ended_in_mate && ply.ply + 1 == last_ply;

            if !(self.analyses(ply.mover) || terminal_mate) {
                previous = next;
                continue;
            }

            let context = board.and_then(|b| parse_uci_move(&b, &ply.uci).map(|mv| MoveContext::new(b, mv)));

            let mut cp_loss = 0;
            let mut severity = None;
            let mut eval_after = None;
            if let (Some(before), Some(after)) = (&previous, &next) {
                compared += 1;
                let after_mover = after.score.negate();
                let mate_blunder = is_mate_blunder(before.score, after_mover, ply.gives_checkmate);
                cp_loss = calculate_cp_loss(before.score, after_mover, ply.gives_checkmate);
                eval_after = Some(after_mover);

                if self.analyses(ply.mover) {
                    total_loss += cp_loss;
                    analysed_moves += 1;
                    severity = classify_move(cp_loss, mate_blunder, &self.thresholds);
                }
            }

            if severity.is_some() || terminal_mate {
                let mut themes = match &context {
                    Some(ctx) => played_themes(ctx, terminal_mate),
                    None if terminal_mate => vec![Theme::Checkmate],
                    None => Vec::new(),
                };
                themes.extend(master);
                let missed = match (&context, &previous, severity) {
                    (Some(ctx), Some(before), Some(_)) => {
                        missed_themes(&ctx.before, &before.line, Some(before.score))
                    }
                    _ => Vec::new(),
                };

                debug!(
                    game_id,
                    ply = ply.ply,
                    san = %ply.san,
                    cp_loss,
                    severity = ?severity,
                    "Flagged move"
                );

                mistakes.push(Mistake {
                    ply: ply.ply,
                    move_number: ply.move_number(),
                    san: ply.san.clone(),
                    mover: ply.mover,
                    severity,
                    cp_loss,
                    eval_before: previous.as_ref().map(|e| e.score),
                    eval_after,
                    phase,
                    themes,
                    missed_themes: missed,
                    best_move: previous.as_ref().and_then(|e| e.best_move.clone()),
                });
            }

            previous = next;
        }

        // Nothing to classify: no moves, or no two consecutive evaluations
        if compared == 0 {
            let mut report = self.unavailable();
            report.truncated_at = replay.error.as_ref().map(|e| e.ply);
            return Ok(report);
        }

        Ok(GameReport {
            game_id: self.game.id.clone(),
            side: self.side,
            opening: self.game.opening.as_ref().map(|o| o.name.clone()),
            mistakes,
            accuracy: (analysed_moves > 0).then(|| calculate_accuracy(total_loss, analysed_moves)),
            evaluation: EvaluationStatus::Available,
            analysed_moves: analysed_moves as usize,
            truncated_at: replay.error.as_ref().map(|e| e.ply),
        })
    }
}
