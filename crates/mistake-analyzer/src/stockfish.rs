//! UCI engine wrapper (async I/O)

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use chess_core::Score;
use tracing::{debug, info};

use crate::config::SearchLimit;
use crate::error::AnalyzerError;
use crate::evaluator::{Evaluation, Evaluator};

/// Engine process settings
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub threads: u32,
    pub hash_mb: u32,
    pub limit: SearchLimit,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            hash_mb: 128,
            limit: SearchLimit::Depth(18),
        }
    }
}

/// Result of a single search
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// Side to move's score; None if the engine never printed one
    pub score: Option<Score>,
    /// Best move in UCI notation, None for `bestmove (none)`
    pub best_move: Option<String>,
    pub pv: Vec<String>,
}

/// Stockfish (or any UCI engine) instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    limit: SearchLimit,
}

fn engine_err(context: &str, e: impl std::fmt::Display) -> AnalyzerError {
    AnalyzerError::Engine(format!("{context}: {e}"))
}

impl StockfishEngine {
    /// Spawn the engine process and initialize UCI
    pub async fn new(path: &Path, options: EngineOptions) -> Result<Self, AnalyzerError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| engine_err(&format!("Failed to spawn {}", path.display()), e))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| AnalyzerError::Engine("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| AnalyzerError::Engine("engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            limit: options.limit,
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // Configure for analysis
        engine
            .send(&format!("setoption name Threads value {}", options.threads))
            .await?;
        engine
            .send(&format!("setoption name Hash value {}", options.hash_mb))
            .await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("ucinewgame").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        info!(path = %path.display(), limit = ?options.limit, "Engine ready");
        Ok(engine)
    }

    /// Send a command to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), AnalyzerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| engine_err("Failed to write to engine", e))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| engine_err("Failed to flush stdin", e))?;
        Ok(())
    }

    /// Next output line; a closed pipe means the engine died
    async fn read_line(&mut self, line: &mut String) -> Result<(), AnalyzerError> {
        line.clear();
        let n = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| engine_err("Failed to read from engine", e))?;
        if n == 0 {
            return Err(AnalyzerError::Engine("engine closed its output".into()));
        }
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), AnalyzerError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search a position until the configured limit and report the last score
    pub async fn search(&mut self, fen: &str) -> Result<EvalResult, AnalyzerError> {
        let go = self.limit.go_command();
        self.send(&format!("position fen {fen}")).await?;
        self.send(&go).await?;

        let mut result = EvalResult {
            score: None,
            best_move: None,
            pv: Vec::new(),
        };

        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                let score = parse_mate(trimmed)
                    .map(Score::Mate)
                    .or_else(|| parse_cp(trimmed).map(Score::Cp));
                if let Some(score) = score {
                    // The pv belongs to the score on the same line
                    result.score = Some(score);
                    result.pv = parse_pv(trimmed);
                }
            } else if trimmed.starts_with("bestmove") {
                debug!(line = trimmed, "SF >");
                result.best_move = trimmed
                    .split_whitespace()
                    .nth(1)
                    .filter(|m| *m != "(none)")
                    .map(String::from);
                break;
            }
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        let _ = self.process.start_kill();
    }
}

impl Evaluator for StockfishEngine {
    async fn evaluate(&mut self, ply: usize, fen: &str) -> Result<Option<Evaluation>, AnalyzerError> {
        let result = self.search(fen).await?;
        let Some(score) = result.score else {
            return Err(AnalyzerError::Engine(format!("no score for position {fen}")));
        };
        let mut line = result.pv;
        if line.is_empty() {
            line.extend(result.best_move.iter().cloned());
        }
        Ok(Some(Evaluation {
            ply,
            score,
            best_move: result.best_move,
            line,
        }))
    }
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "cp" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "mate" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_cp(line), Some(35));
        assert_eq!(parse_cp("info depth 1 score cp -120 upperbound"), Some(-120));
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate 3 nodes 100000 pv e2e4";
        assert_eq!(parse_mate(line), Some(3));
        // Already mated: no pv follows
        assert_eq!(parse_mate("info depth 0 score mate 0"), Some(0));
        assert_eq!(parse_cp(line), None);
    }

    #[test]
    fn test_parse_pv() {
        let line = "info depth 20 score cp 35 pv e2e4 e7e5 g1f3";
        let pv = parse_pv(line);
        assert_eq!(pv, vec!["e2e4", "e7e5", "g1f3"]);
        assert!(parse_pv("info depth 0 score mate 0").is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_engine_error() {
        let result = StockfishEngine::new(
            Path::new("/nonexistent/stockfish-binary"),
            EngineOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(AnalyzerError::Engine(_))));
    }
}
