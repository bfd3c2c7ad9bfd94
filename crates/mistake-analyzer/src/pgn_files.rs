//! Offline input: games read from PGN files instead of the Lichess API.

use std::fs;
use std::path::PathBuf;

use chess_core::pgn::{parse_pgn, split_games};
use chess_core::Game;
use tracing::{info, warn};

use crate::error::AnalyzerError;

/// Load every game from the files matching `pattern` (a path or glob).
/// Games that cannot be read are skipped with a warning.
pub fn load_pgn_games(pattern: &str) -> Result<Vec<Game>, AnalyzerError> {
    let paths: Vec<PathBuf> = if pattern.contains('*') || pattern.contains('?') {
        glob::glob(pattern)
            .map_err(|e| AnalyzerError::Pgn(format!("bad pattern '{pattern}': {e}")))?
            .filter_map(|entry| entry.ok())
            .collect()
    } else {
        vec![PathBuf::from(pattern)]
    };

    if paths.is_empty() {
        return Err(AnalyzerError::Pgn(format!("no PGN files match '{pattern}'")));
    }

    let mut games = Vec::new();
    for path in &paths {
        let text = fs::read_to_string(path)?;
        let mut skipped = 0;
        for (i, chunk) in split_games(&text).iter().enumerate() {
            match parse_pgn(chunk) {
                Some(mut game) => {
                    if game.id.is_empty() {
                        game.id = format!("{}#{}", path.display(), i + 1);
                    }
                    games.push(game);
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(path = %path.display(), skipped, "Skipped unreadable or non-standard games");
        }
        info!(path = %path.display(), total = games.len(), "Loaded PGN file");
    }
    Ok(games)
}
