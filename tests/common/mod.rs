#![allow(dead_code)]

use chess_core::{Color, Game, GameStatus, PlatformEval, PlayerInfo, Score};
use mistake_analyzer::{AnalyzerError, Evaluation, Evaluator};

pub const PLAYER: &str = "drapi";
pub const OPPONENT: &str = "someone";

/// Morphy's Opera Game, ends 17. Rd8#
pub const OPERA_GAME: &str = "e4 e5 Nf3 d6 d4 Bg4 dxe5 Bxf3 Qxf3 dxe5 Bc4 Nf6 Qb3 Qe7 Nc3 c6 Bg5 b5 \
     Nxb5 cxb5 Bxb5+ Nbd7 O-O-O Rd8 Rxd7 Rxd7 Rd1 Qe6 Bxd7+ Nxd7 Qb8+ Nxb8 Rd8#";

pub const SCHOLARS_MATE: &str = "e4 e5 Bc4 Nc6 Qh5 Nf6 Qxf7#";

/// White takes on c6, b7 and a8, promoting on the 9th ply.
pub const PROMOTION_GAME: &str = "e4 d5 exd5 c6 dxc6 Qb6 cxb7 Qxb2 bxa8=Q";

pub fn moves(s: &str) -> Vec<String> {
    s.split_whitespace().map(String::from).collect()
}

pub fn game(id: &str, san: &str, status: GameStatus) -> Game {
    Game {
        id: id.to_string(),
        white: PlayerInfo {
            name: PLAYER.to_string(),
            ..Default::default()
        },
        black: PlayerInfo {
            name: OPPONENT.to_string(),
            ..Default::default()
        },
        moves: moves(san),
        status,
        winner: None,
        time_control: Some("180+2".to_string()),
        speed: Some("blitz".to_string()),
        rated: true,
        created_at: None,
        opening: None,
        evaluations: Vec::new(),
    }
}

/// Platform evaluations (white's view, one per ply) for `game`.
pub fn with_platform_evals(mut game: Game, white_scores: &[Score]) -> Game {
    game.evaluations = white_scores
        .iter()
        .map(|s| PlatformEval {
            score: Some(*s),
            ..Default::default()
        })
        .collect();
    game
}

/// Evaluator serving fixed scores. `white_scores[p]` is white's score for the
/// position after `p` plies; positions past the end are unevaluated.
pub struct ScriptedEvaluator {
    white_scores: Vec<Score>,
    fail_at: Option<usize>,
    pub requested: Vec<usize>,
}

impl ScriptedEvaluator {
    pub fn new(white_scores: Vec<Score>) -> Self {
        Self {
            white_scores,
            fail_at: None,
            requested: Vec::new(),
        }
    }

    /// Same score for every position of an `n`-ply game.
    pub fn flat(n: usize, cp: i32) -> Self {
        Self::new(vec![Score::Cp(cp); n + 1])
    }

    pub fn failing_at(mut self, ply: usize) -> Self {
        self.fail_at = Some(ply);
        self
    }
}

impl Evaluator for ScriptedEvaluator {
    async fn evaluate(&mut self, ply: usize, _fen: &str) -> Result<Option<Evaluation>, AnalyzerError> {
        self.requested.push(ply);
        if self.fail_at == Some(ply) {
            return Err(AnalyzerError::Engine("engine crashed".into()));
        }
        let Some(white) = self.white_scores.get(ply).copied() else {
            return Ok(None);
        };
        let score = match Color::at_ply(ply) {
            Color::White => white,
            Color::Black => white.negate(),
        };
        Ok(Some(Evaluation {
            ply,
            score,
            best_move: None,
            line: Vec::new(),
        }))
    }
}

/// Evaluator under which every move throws away 600 centipawns.
pub struct AlwaysBlunder;

impl Evaluator for AlwaysBlunder {
    async fn evaluate(&mut self, ply: usize, _fen: &str) -> Result<Option<Evaluation>, AnalyzerError> {
        Ok(Some(Evaluation {
            ply,
            score: Score::Cp(300),
            best_move: None,
            line: Vec::new(),
        }))
    }
}
