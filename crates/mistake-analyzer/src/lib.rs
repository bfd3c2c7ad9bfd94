pub use chess;

pub mod analysis;
pub mod board_utils;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod game_analysis;
pub mod pgn_files;
pub mod phase;
pub mod player;
pub mod report;
pub mod stockfish;
pub mod themes;

pub use analysis::Severity;
pub use config::{AnalyzerConfig, SearchLimit, Thresholds};
pub use error::AnalyzerError;
pub use evaluator::{Evaluation, Evaluator, PlatformEvaluator};
pub use game_analysis::{EvaluationStatus, GameAnalysis, GameReport, Mistake};
pub use phase::Phase;
pub use player::{AnalysisSummary, GameFailure, Player};
pub use report::AggregateReport;
pub use themes::Theme;
