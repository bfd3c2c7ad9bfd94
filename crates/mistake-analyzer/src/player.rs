//! A Lichess player: fetches their games and runs the analysis over them.

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chess_core::{Color, Game};
use lichess_client::{GameQuery, LichessClient, RejectedGame, UserProfile, DEFAULT_BASE_URL};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{AnalyzerConfig, Thresholds};
use crate::error::AnalyzerError;
use crate::evaluator::PlatformEvaluator;
use crate::game_analysis::{GameAnalysis, GameReport};
use crate::report::AggregateReport;
use crate::stockfish::{EngineOptions, StockfishEngine};

/// A game that could not be analysed, and why.
#[derive(Debug, Clone, Serialize)]
pub struct GameFailure {
    pub game_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub reports: Vec<GameReport>,
    pub failures: Vec<GameFailure>,
    pub aggregate: AggregateReport,
}

pub struct Player {
    username: String,
    engine_path: Option<PathBuf>,
    engine_options: EngineOptions,
    thresholds: Thresholds,
    client: LichessClient,
    profile: Option<UserProfile>,
    games: Vec<Game>,
    /// Export lines that never became games; reported as failures
    rejected: Vec<RejectedGame>,
}

impl Player {
    /// An empty `username` analyses both sides of every game.
    pub fn new(
        api_token: &str,
        username: &str,
        engine_path: Option<PathBuf>,
    ) -> Result<Self, AnalyzerError> {
        Self::build(api_token, username, engine_path, DEFAULT_BASE_URL)
    }

    fn build(
        api_token: &str,
        username: &str,
        engine_path: Option<PathBuf>,
        base_url: &str,
    ) -> Result<Self, AnalyzerError> {
        Ok(Self {
            username: username.to_string(),
            engine_path,
            engine_options: EngineOptions::default(),
            thresholds: Thresholds::default(),
            client: LichessClient::with_base_url(api_token, base_url)?,
            profile: None,
            games: Vec::new(),
            rejected: Vec::new(),
        })
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let username = config.username.as_deref().unwrap_or_default();
        let mut player = Self::build(
            &config.api_token,
            username,
            config.engine_path.clone(),
            &config.base_url,
        )?;
        player.client = player
            .client
            .with_request_delay(Duration::from_millis(config.request_delay_ms));
        player.thresholds = config.thresholds;
        player.engine_options = EngineOptions {
            threads: config.engine_threads,
            hash_mb: config.engine_hash_mb,
            limit: config.search,
        };
        Ok(player)
    }

    /// Use games loaded elsewhere (PGN files) instead of fetching them.
    pub fn with_games(mut self, games: Vec<Game>) -> Self {
        self.games = games;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn engine_path(&self) -> Option<&Path> {
        self.engine_path.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub async fn fetch_profile(&mut self) -> Result<&UserProfile, AnalyzerError> {
        let profile = self.client.fetch_user(&self.username).await?;
        info!(username = %profile.username, "Fetched profile");
        Ok(self.profile.insert(profile))
    }

    /// Fetch the most recent `max` games. Without an engine only games
    /// Lichess has already analysed are useful, so only those are asked for.
    pub async fn fetch_games(&mut self, max: usize) -> Result<&[Game], AnalyzerError> {
        let query = GameQuery {
            max,
            analysed: self.engine_path.is_none().then_some(true),
            ..Default::default()
        };
        let export = self.client.fetch_user_games(&self.username, &query).await?;
        self.games = export.games;
        self.rejected = export.rejected;
        info!(
            username = %self.username,
            count = self.games.len(),
            rejected = self.rejected.len(),
            "Fetched games"
        );
        Ok(&self.games)
    }

    pub fn display_info(&self) -> String {
        let mut out = String::new();
        match &self.profile {
            Some(profile) => {
                let title = profile.title.as_deref().map(|t| format!("{t} ")).unwrap_or_default();
                let _ = writeln!(out, "Player: {title}{}", profile.username);
                for (perf, rating) in profile.ratings() {
                    let _ = writeln!(out, "  {perf}: {rating}");
                }
            }
            None => {
                let _ = writeln!(out, "Player: {}", self.username);
            }
        }
        let _ = writeln!(out, "Games fetched: {}", self.games.len());
        out
    }

    fn side_in(&self, game: &Game) -> Result<Option<Color>, AnalyzerError> {
        if self.username.is_empty() {
            return Ok(None);
        }
        game.side_of(&self.username)
            .map(Some)
            .ok_or_else(|| AnalyzerError::PlayerNotInGame {
                game_id: game.id.clone(),
                username: self.username.clone(),
            })
    }

    async fn analyze_one(
        &self,
        game: &Game,
        engine: Option<&mut StockfishEngine>,
    ) -> Result<GameReport, AnalyzerError> {
        let analysis = GameAnalysis::new(game, self.side_in(game)?, self.thresholds);
        match engine {
            Some(engine) => analysis.run(engine).await,
            None if game.has_evaluations() => {
                analysis
                    .run(&mut PlatformEvaluator::new(&game.evaluations))
                    .await
            }
            None => Ok(analysis.unavailable()),
        }
    }

    /// Analyse every fetched game in order. A game that fails is recorded
    /// and skipped. An engine that cannot be started fails every game.
    pub async fn analyze_games(&self) -> Result<AnalysisSummary, AnalyzerError> {
        let mut engine_error = None;
        let mut engine = match &self.engine_path {
            Some(path) => match StockfishEngine::new(path, self.engine_options).await {
                Ok(engine) => Some(engine),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Engine unavailable");
                    engine_error = Some(match e {
                        AnalyzerError::Engine(reason) => reason,
                        other => other.to_string(),
                    });
                    None
                }
            },
            None => {
                info!("No engine configured, using Lichess evaluations");
                None
            }
        };

        let mut reports = Vec::with_capacity(self.games.len());
        let mut failures = Vec::new();
        let mut aggregate = AggregateReport::new();

        for rejected in &self.rejected {
            aggregate.add_failure();
            failures.push(GameFailure {
                game_id: rejected.label(),
                error: format!("unreadable game record: {}", rejected.reason),
            });
        }

        for (i, game) in self.games.iter().enumerate() {
            info!(game_id = %game.id, "Analyzing game {}/{}", i + 1, self.games.len());
            let result = match &engine_error {
                Some(reason) => Err(AnalyzerError::Engine(reason.clone())),
                None => self.analyze_one(game, engine.as_mut()).await,
            };
            match result {
                Ok(report) => {
                    if report.truncated_at.is_some() {
                        warn!(game_id = %game.id, ply = ?report.truncated_at, "Game only partly analysed");
                    }
                    aggregate.add_game(&report);
                    reports.push(report);
                }
                Err(e) => {
                    error!(game_id = %game.id, error = %e, "Game analysis failed");
                    aggregate.add_failure();
                    failures.push(GameFailure {
                        game_id: game.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if let Some(engine) = engine.as_mut() {
            engine.quit().await;
        }

        info!(
            analyzed = aggregate.games_analyzed,
            unavailable = aggregate.games_unavailable,
            failed = aggregate.games_failed,
            mistakes = aggregate.total_mistakes(),
            "Analysis complete"
        );

        Ok(AnalysisSummary {
            reports,
            failures,
            aggregate,
        })
    }
}
