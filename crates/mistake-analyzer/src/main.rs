//! mistake-analyzer
//!
//! Fetches a player's recent Lichess games (or reads PGN files), evaluates
//! every position and prints a summary of the mistakes they made.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use mistake_analyzer::pgn_files::load_pgn_games;
use mistake_analyzer::{AnalyzerConfig, Player, SearchLimit};

#[derive(Parser, Debug)]
#[command(name = "mistake-analyzer", version, about = "Find the mistakes in your recent Lichess games")]
struct Cli {
    /// Lichess username whose games are analysed
    #[arg(short, long)]
    username: Option<String>,

    /// Lichess personal API token
    #[arg(long, env = "LICHESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// UCI engine binary; without it the games' Lichess evaluations are used
    #[arg(short, long)]
    engine: Option<PathBuf>,

    /// Engine search depth per position
    #[arg(long, conflicts_with = "nodes")]
    depth: Option<u32>,

    /// Engine node budget per position
    #[arg(long)]
    nodes: Option<u32>,

    /// Number of recent games to fetch
    #[arg(short = 'n', long)]
    max_games: Option<usize>,

    #[arg(long, help = "Centipawn loss above which a move is an inaccuracy")]
    inaccuracy: Option<i32>,

    #[arg(long, help = "Centipawn loss above which a move is a mistake")]
    mistake: Option<i32>,

    #[arg(long, help = "Centipawn loss above which a move is a blunder")]
    blunder: Option<i32>,

    /// Read games from PGN files (path or glob) instead of Lichess
    #[arg(long)]
    pgn: Option<String>,

    /// Print the full analysis as JSON
    #[arg(long)]
    json: bool,

    /// Print every flagged move per game
    #[arg(long)]
    games: bool,

    #[arg(short, long, help = "Enable verbose logging")]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut AnalyzerConfig) {
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(token) = &self.token {
            config.api_token = token.clone();
        }
        if let Some(engine) = &self.engine {
            config.engine_path = Some(engine.clone());
        }
        if let Some(depth) = self.depth {
            config.search = SearchLimit::Depth(depth);
        }
        if let Some(nodes) = self.nodes {
            config.search = SearchLimit::Nodes(nodes);
        }
        if let Some(max) = self.max_games {
            config.max_games = max;
        }
        if let Some(t) = self.inaccuracy {
            config.thresholds.inaccuracy = t;
        }
        if let Some(t) = self.mistake {
            config.thresholds.mistake = t;
        }
        if let Some(t) = self.blunder {
            config.thresholds.blunder = t;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = AnalyzerConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    let mut player = Player::from_config(&config)?;

    match &cli.pgn {
        Some(pattern) => {
            let games = load_pgn_games(pattern)
                .with_context(|| format!("reading PGN files from {pattern}"))?;
            player = player.with_games(games);
        }
        None => {
            config.require_username()?;
            player.fetch_profile().await.context("fetching profile")?;
            player
                .fetch_games(config.max_games)
                .await
                .context("fetching games")?;
        }
    }
    eprint!("{}", player.display_info());

    let summary = player.analyze_games().await?;
    info!(reports = summary.reports.len(), failures = summary.failures.len(), "Done");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if cli.games {
        for report in &summary.reports {
            println!("Game {}", report.game_id);
            for m in &report.mistakes {
                let severity = m.severity.map(|s| s.as_str()).unwrap_or("-");
                let themes: Vec<String> = m.themes.iter().map(|t| t.to_string()).collect();
                println!(
                    "  {}. {} {} (-{} cp) [{}]",
                    m.move_number,
                    m.san,
                    severity,
                    m.cp_loss,
                    themes.join(", ")
                );
            }
        }
        println!();
    }

    for failure in &summary.failures {
        println!("Failed: {} ({})", failure.game_id, failure.error);
    }
    print!("{}", summary.aggregate.render());
    Ok(())
}
