//! Analyzer configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use lichess_client::DEFAULT_BASE_URL;
use tracing::info;

use crate::analysis::MAX_CP_LOSS;
use crate::error::AnalyzerError;

/// Centipawn-loss cutoffs. A move is put in the highest bucket whose
/// threshold its loss exceeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
    pub inaccuracy: i32,
    pub mistake: i32,
    pub blunder: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            inaccuracy: 50,
            mistake: 100,
            blunder: 200,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.inaccuracy < 0 {
            return Err(AnalyzerError::Config(
                "inaccuracy threshold must not be negative".into(),
            ));
        }
        if !(self.inaccuracy <= self.mistake && self.mistake <= self.blunder) {
            return Err(AnalyzerError::Config(format!(
                "thresholds must be ordered inaccuracy <= mistake <= blunder (got {}/{}/{})",
                self.inaccuracy, self.mistake, self.blunder
            )));
        }
        if self.blunder >= MAX_CP_LOSS {
            return Err(AnalyzerError::Config(format!(
                "blunder threshold must be below {MAX_CP_LOSS}"
            )));
        }
        Ok(())
    }
}

/// How long the engine searches each position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchLimit {
    Depth(u32),
    Nodes(u32),
}

impl SearchLimit {
    pub fn go_command(&self) -> String {
        match self {
            SearchLimit::Depth(depth) => format!("go depth {depth}"),
            SearchLimit::Nodes(nodes) => format!("go nodes {nodes}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    /// Lichess API token (personal access token)
    pub api_token: String,

    /// Player whose games are analysed
    pub username: Option<String>,

    /// Path to a UCI engine binary; without one, platform evaluations are used
    pub engine_path: Option<PathBuf>,

    pub search: SearchLimit,

    pub engine_threads: u32,

    pub engine_hash_mb: u32,

    /// Games to fetch per run
    pub max_games: usize,

    pub thresholds: Thresholds,

    /// Lichess base URL (overridable for testing)
    pub base_url: String,

    /// Pause before each Lichess request
    pub request_delay_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            username: None,
            engine_path: None,
            search: SearchLimit::Depth(18),
            engine_threads: 1,
            engine_hash_mb: 128,
            max_games: 30,
            thresholds: Thresholds::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_delay_ms: 1000,
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, AnalyzerError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AnalyzerError::Config(format!("{name} has an invalid value: {value}"))),
        Err(_) => Ok(None),
    }
}

impl AnalyzerConfig {
    /// Load configuration from environment variables (call `dotenvy::dotenv()` first
    /// to pick up a `.env` file). Missing variables keep their defaults.
    pub fn from_env() -> Result<Self, AnalyzerError> {
        let mut config = Self::default();

        if let Ok(token) = env::var("LICHESS_TOKEN") {
            config.api_token = token;
        }
        config.username = env::var("LICHESS_USERNAME").ok().filter(|u| !u.is_empty());
        config.engine_path = env::var("ENGINE_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        if let Some(nodes) = parse_var("ENGINE_NODES")? {
            config.search = SearchLimit::Nodes(nodes);
        }
        if let Some(depth) = parse_var("ENGINE_DEPTH")? {
            config.search = SearchLimit::Depth(depth);
        }
        if let Some(threads) = parse_var("ENGINE_THREADS")? {
            config.engine_threads = threads;
        }
        if let Some(hash) = parse_var("ENGINE_HASH_MB")? {
            config.engine_hash_mb = hash;
        }
        if let Some(max) = parse_var("MAX_GAMES")? {
            config.max_games = max;
        }
        if let Some(t) = parse_var("INACCURACY_THRESHOLD")? {
            config.thresholds.inaccuracy = t;
        }
        if let Some(t) = parse_var("MISTAKE_THRESHOLD")? {
            config.thresholds.mistake = t;
        }
        if let Some(t) = parse_var("BLUNDER_THRESHOLD")? {
            config.thresholds.blunder = t;
        }
        if let Ok(url) = env::var("LICHESS_BASE_URL") {
            info!(base_url = %url, "Using custom Lichess base URL");
            config.base_url = url;
        }
        if let Some(delay) = parse_var("REQUEST_DELAY_MS")? {
            config.request_delay_ms = delay;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalyzerError> {
        self.thresholds.validate()?;
        if self.max_games == 0 {
            return Err(AnalyzerError::Config("max games must be at least 1".into()));
        }
        match self.search {
            SearchLimit::Depth(0) | SearchLimit::Nodes(0) => {
                Err(AnalyzerError::Config("engine search limit must be positive".into()))
            }
            _ => Ok(()),
        }
    }

    /// Username required for talking to Lichess.
    pub fn require_username(&self) -> Result<&str, AnalyzerError> {
        self.username
            .as_deref()
            .ok_or_else(|| AnalyzerError::Config("username not set (LICHESS_USERNAME or --username)".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_valid() {
        assert!(Thresholds::default().validate().is_ok());
        assert!(AnalyzerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let t = Thresholds {
            inaccuracy: 120,
            mistake: 100,
            blunder: 300,
        };
        assert!(matches!(t.validate(), Err(AnalyzerError::Config(_))));

        let t = Thresholds {
            inaccuracy: 50,
            mistake: 100,
            blunder: MAX_CP_LOSS,
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_go_command() {
        assert_eq!(SearchLimit::Depth(18).go_command(), "go depth 18");
        assert_eq!(SearchLimit::Nodes(100_000).go_command(), "go nodes 100000");
    }

    #[test]
    fn test_require_username() {
        let mut config = AnalyzerConfig::default();
        assert!(config.require_username().is_err());
        config.username = Some("drapi".into());
        assert_eq!(config.require_username().unwrap(), "drapi");
    }
}
