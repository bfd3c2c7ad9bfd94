//! Integration tests: the UCI wrapper against a scripted fake engine.

#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use chess_core::{GameStatus, Score};
use common::*;
use mistake_analyzer::stockfish::{EngineOptions, StockfishEngine};
use mistake_analyzer::{AnalyzerError, Evaluator, Player, SearchLimit};
use tempfile::TempDir;

/// A shell "engine" that answers the handshake and scores every position
/// +25 with e2e4 as the best move.
const FAKE_ENGINE: &str = r#"#!/bin/sh
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "id name FakeFish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go)
      echo "info depth 1 score cp 10 pv d2d4"
      echo "info depth 2 score cp 25 nodes 200 pv e2e4 e7e5 g1f3"
      echo "bestmove e2e4 ponder e7e5"
      ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Engine that always reports it is getting mated and has no move.
const MATED_ENGINE: &str = r#"#!/bin/sh
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go) echo "info depth 0 score mate 0"; echo "bestmove (none)" ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Engine that answers `go` with a move but never a score.
const SCORELESS_ENGINE: &str = r#"#!/bin/sh
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go) echo "info depth 1 nodes 20"; echo "bestmove e2e4" ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Deeper iteration reports a new score without a pv.
const PVLESS_ENGINE: &str = r#"#!/bin/sh
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go)
      echo "info depth 1 score cp 10 pv d2d4 d7d5"
      echo "info depth 2 score cp 40"
      echo "bestmove e2e4"
      ;;
    quit) exit 0 ;;
  esac
done
"#;

/// Engine that dies as soon as it is asked to search.
const CRASHING_ENGINE: &str = r#"#!/bin/sh
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go) exit 1 ;;
  esac
done
"#;

fn write_engine(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn options() -> EngineOptions {
    EngineOptions {
        threads: 1,
        hash_mb: 16,
        limit: SearchLimit::Depth(2),
    }
}

#[tokio::test]
async fn test_search_reads_last_info_line() {
    let dir = TempDir::new().unwrap();
    let path = write_engine(dir.path(), "fakefish", FAKE_ENGINE);

    let mut engine = StockfishEngine::new(&path, options()).await.unwrap();
    let result = engine.search(chess_core::STARTING_FEN).await.unwrap();
    assert_eq!(result.score, Some(Score::Cp(25)));
    assert_eq!(result.best_move.as_deref(), Some("e2e4"));
    assert_eq!(result.pv, vec!["e2e4", "e7e5", "g1f3"]);

    let eval = engine.evaluate(0, chess_core::STARTING_FEN).await.unwrap().unwrap();
    assert_eq!(eval.ply, 0);
    assert_eq!(eval.line.len(), 3);
    engine.quit().await;
}

#[tokio::test]
async fn test_mated_position_has_no_best_move() {
    let dir = TempDir::new().unwrap();
    let path = write_engine(dir.path(), "mated", MATED_ENGINE);

    let mut engine = StockfishEngine::new(&path, options()).await.unwrap();
    let result = engine.search(chess_core::STARTING_FEN).await.unwrap();
    assert_eq!(result.score, Some(Score::Mate(0)));
    assert_eq!(result.best_move, None);
    assert!(result.pv.is_empty());
    engine.quit().await;
}

#[tokio::test]
async fn test_pv_follows_latest_score() {
    let dir = TempDir::new().unwrap();
    let path = write_engine(dir.path(), "pvless", PVLESS_ENGINE);

    let mut engine = StockfishEngine::new(&path, options()).await.unwrap();
    let result = engine.search(chess_core::STARTING_FEN).await.unwrap();
    assert_eq!(result.score, Some(Score::Cp(40)));
    assert!(result.pv.is_empty());

    // Without a pv the line falls back to the best move
    let eval = engine.evaluate(0, chess_core::STARTING_FEN).await.unwrap().unwrap();
    assert_eq!(eval.line, vec!["e2e4"]);
    engine.quit().await;
}

#[tokio::test]
async fn test_missing_score_is_an_engine_error() {
    let dir = TempDir::new().unwrap();
    let path = write_engine(dir.path(), "scoreless", SCORELESS_ENGINE);

    let mut engine = StockfishEngine::new(&path, options()).await.unwrap();
    let result = engine.evaluate(0, chess_core::STARTING_FEN).await;
    assert!(matches!(result, Err(AnalyzerError::Engine(_))));
    engine.quit().await;

    // Counted as a failed game, not as one without evaluations
    let player = Player::new("", PLAYER, Some(path))
        .unwrap()
        .with_games(vec![game("silent", "e4 e5", GameStatus::Resign)]);
    let summary = player.analyze_games().await.unwrap();
    assert!(summary.reports.is_empty());
    assert_eq!(summary.failures[0].game_id, "silent");
    assert_eq!(summary.aggregate.games_failed, 1);
    assert_eq!(summary.aggregate.games_unavailable, 0);
}

#[tokio::test]
async fn test_player_with_engine() {
    let dir = TempDir::new().unwrap();
    let path = write_engine(dir.path(), "fakefish", FAKE_ENGINE);

    let player = Player::new("", PLAYER, Some(path))
        .unwrap()
        .with_games(vec![game("g", "e4 e5 Nf3 Nc6", GameStatus::Resign)]);
    let summary = player.analyze_games().await.unwrap();

    // +25 for whoever is to move: every move hands the opponent 25 and costs 50
    let report = &summary.reports[0];
    assert_eq!(report.analysed_moves, 2);
    assert!(report.mistakes.is_empty());
    assert_eq!(summary.aggregate.games_analyzed, 1);
}

#[tokio::test]
async fn test_engine_crash_fails_only_that_game() {
    let dir = TempDir::new().unwrap();
    let path = write_engine(dir.path(), "crashy", CRASHING_ENGINE);

    let player = Player::new("", PLAYER, Some(path)).unwrap().with_games(vec![
        game("first", "e4 e5", GameStatus::Resign),
        game("second", "d4 d5", GameStatus::Resign),
    ]);
    let summary = player.analyze_games().await.unwrap();

    assert!(summary.reports.is_empty());
    assert_eq!(summary.failures.len(), 2);
    assert_eq!(summary.failures[0].game_id, "first");
    assert_eq!(summary.aggregate.games_failed, 2);
}
