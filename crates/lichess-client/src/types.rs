//! Wire types for the Lichess API and their conversion into `chess_core` records.
//!
//! Everything outside this module works with [`chess_core::Game`]; the raw
//! JSON shapes stay here.

use std::collections::BTreeMap;

use chess_core::{Color, Game, GameStatus, Judgment, Opening, PlatformEval, PlayerInfo, Score};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LichessGame {
    pub id: String,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub status: String,
    #[serde(default)]
    pub players: LichessPlayers,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub opening: Option<LichessOpening>,
    #[serde(default)]
    pub moves: String,
    #[serde(default)]
    pub analysis: Vec<LichessEval>,
    #[serde(default)]
    pub clock: Option<LichessClock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LichessPlayers {
    #[serde(default)]
    pub white: LichessPlayer,
    #[serde(default)]
    pub black: LichessPlayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LichessPlayer {
    #[serde(default)]
    pub user: Option<LichessUser>,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub ai_level: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LichessUser {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LichessOpening {
    pub eco: String,
    pub name: String,
    #[serde(default)]
    pub ply: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LichessClock {
    pub initial: u32,
    pub increment: u32,
}

/// One entry of the `analysis` array: the position after a ply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LichessEval {
    #[serde(default)]
    pub eval: Option<i32>,
    #[serde(default)]
    pub mate: Option<i32>,
    #[serde(default)]
    pub best: Option<String>,
    #[serde(default)]
    pub variation: Option<String>,
    #[serde(default)]
    pub judgment: Option<LichessJudgment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LichessJudgment {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Public profile from `/api/user/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub perfs: BTreeMap<String, Perf>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perf {
    #[serde(default)]
    pub games: u32,
    /// Missing for puzzle modes like storm and racer
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub prov: bool,
}

impl UserProfile {
    /// Ratings for perfs the user has actually played, highest game count first.
    pub fn ratings(&self) -> Vec<(&str, u32)> {
        let mut perfs: Vec<(&str, u32, u32)> = self
            .perfs
            .iter()
            .filter(|(_, p)| p.games > 0)
            .filter_map(|(name, p)| Some((name.as_str(), p.games, p.rating?)))
            .collect();
        perfs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        perfs.into_iter().map(|(name, _, rating)| (name, rating)).collect()
    }
}

fn player_info(player: &LichessPlayer) -> PlayerInfo {
    match &player.user {
        Some(user) => PlayerInfo {
            name: user.name.clone(),
            title: user.title.clone(),
            rating: player.rating,
        },
        None => PlayerInfo {
            name: player
                .ai_level
                .map(|level| format!("Stockfish level {level}"))
                .unwrap_or_else(|| "Anonymous".to_string()),
            title: None,
            rating: player.rating,
        },
    }
}

impl From<&LichessEval> for PlatformEval {
    fn from(raw: &LichessEval) -> Self {
        let score = match (raw.mate, raw.eval) {
            (Some(m), _) => Some(Score::Mate(m)),
            (None, Some(cp)) => Some(Score::Cp(cp)),
            (None, None) => None,
        };
        PlatformEval {
            score,
            best: raw.best.clone(),
            variation: raw
                .variation
                .as_deref()
                .map(|v| v.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            judgment: raw.judgment.as_ref().map(|j| Judgment {
                name: j.name.clone(),
                comment: j.comment.clone(),
            }),
        }
    }
}

impl From<LichessGame> for Game {
    fn from(raw: LichessGame) -> Self {
        let winner = match raw.winner.as_deref() {
            Some("white") => Some(Color::White),
            Some("black") => Some(Color::Black),
            _ => None,
        };
        let time_control = raw
            .clock
            .as_ref()
            .map(|c| format!("{}+{}", c.initial, c.increment));
        let created_at = raw.created_at.and_then(DateTime::<Utc>::from_timestamp_millis);

        Game {
            white: player_info(&raw.players.white),
            black: player_info(&raw.players.black),
            moves: raw.moves.split_whitespace().map(String::from).collect(),
            status: GameStatus::from_lichess(&raw.status),
            winner,
            time_control,
            speed: raw.speed,
            rated: raw.rated,
            created_at,
            opening: raw.opening.map(|o| Opening {
                eco: o.eco,
                name: o.name,
                ply: o.ply,
            }),
            evaluations: raw.analysis.iter().map(PlatformEval::from).collect(),
            id: raw.id,
        }
    }
}

/// An export line that could not be turned into a [`Game`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedGame {
    /// Present when the line was JSON with an `id` field
    pub id: Option<String>,
    /// 1-based line number in the export
    pub line: usize,
    pub reason: String,
}

impl RejectedGame {
    /// Game id, or a line reference when the id could not be read.
    pub fn label(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("ndjson line {}", self.line))
    }
}

/// Games decoded from one export, plus the lines that failed to decode.
#[derive(Debug, Clone, Default)]
pub struct GameExport {
    pub games: Vec<Game>,
    pub rejected: Vec<RejectedGame>,
}

/// Parse an NDJSON game export. Non-standard variants are dropped; lines
/// that fail to decode are returned in `rejected`.
pub fn parse_games_ndjson(text: &str) -> GameExport {
    let mut export = GameExport::default();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<LichessGame>(line) {
            Ok(raw) => {
                let variant = raw.variant.as_deref().unwrap_or("standard");
                if variant != "standard" {
                    debug!(game_id = %raw.id, variant, "Skipping non-standard variant");
                    continue;
                }
                export.games.push(Game::from(raw));
            }
            Err(e) => {
                let id = serde_json::from_str::<serde_json::Value>(line)
                    .ok()
                    .and_then(|v| v.get("id")?.as_str().map(String::from));
                warn!(line = i + 1, game_id = ?id, "Failed to parse Lichess game JSON: {e}");
                export.rejected.push(RejectedGame {
                    id,
                    line: i + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    export
}
