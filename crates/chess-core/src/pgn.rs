//! PGN parsing utilities — lightweight regex-based parser.
//!
//! Lichess exports carry engine evaluations as `{ [%eval 0.17] }` comments
//! after each move; those become [`PlatformEval`] entries.

use regex::Regex;

use crate::game_data::{Color, Game, GameStatus, Opening, PlatformEval, PlayerInfo};
use crate::replay::STARTING_FEN;
use crate::score::Score;

/// Split a multi-game PGN file into individual game texts.
pub fn split_games(text: &str) -> Vec<String> {
    let mut games = Vec::new();
    let mut current = String::new();
    let mut in_moves = false;

    for line in text.lines() {
        let trimmed = line.trim();
        let is_header = trimmed.starts_with('[');
        if is_header && in_moves {
            games.push(std::mem::take(&mut current));
            in_moves = false;
        }
        if !is_header && !trimmed.is_empty() {
            in_moves = true;
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        games.push(current);
    }
    games
}

/// Parse one PGN game. Returns None for non-standard starting positions or
/// games without moves.
pub fn parse_pgn(pgn: &str) -> Option<Game> {
    let header_re = Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).ok()?;

    let mut white = PlayerInfo::default();
    let mut black = PlayerInfo::default();
    let mut result = "*".to_string();
    let mut site = None;
    let mut time_control = None;
    let mut eco = None;
    let mut opening_name = None;
    let mut termination = None;
    let mut event = None;
    let mut setup = None;
    let mut fen = None;

    for cap in header_re.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => white.name = value,
            "Black" => black.name = value,
            "WhiteTitle" => white.title = non_empty(value),
            "BlackTitle" => black.title = non_empty(value),
            "WhiteElo" => white.rating = value.parse().ok(),
            "BlackElo" => black.rating = value.parse().ok(),
            "Result" => result = value,
            "Site" => site = Some(value),
            "TimeControl" => time_control = non_empty(value),
            "ECO" => eco = Some(value),
            "Opening" => opening_name = Some(value),
            "Termination" => termination = Some(value),
            "Event" => event = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // Filter non-standard positions
    if setup.as_deref() == Some("1") {
        if let Some(ref f) = fen {
            if f != STARTING_FEN {
                return None;
            }
        }
    }

    let (moves, evaluations) = extract_moves_and_evals(pgn);
    if moves.is_empty() {
        return None;
    }

    let winner = match result.as_str() {
        "1-0" => Some(Color::White),
        "0-1" => Some(Color::Black),
        _ => None,
    };
    let ends_in_mate = moves.last().is_some_and(|m| m.ends_with('#'));
    let status = status_from_headers(&result, termination.as_deref(), ends_in_mate);

    let id = site
        .as_deref()
        .and_then(|s| s.rsplit('/').next())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("{}-{}-{}", white.name, black.name, moves.len()));

    let opening = match (eco, opening_name) {
        (Some(eco), Some(name)) => Some(Opening { eco, name, ply: 0 }),
        _ => None,
    };

    let rated = event.as_deref().is_some_and(|e| e.contains("Rated"));
    let has_evals = evaluations.iter().any(|e| e.score.is_some());

    Some(Game {
        id,
        white,
        black,
        moves,
        status,
        winner,
        time_control,
        speed: None,
        rated,
        created_at: None,
        opening,
        evaluations: if has_evals { evaluations } else { Vec::new() },
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() || value == "-" {
        None
    } else {
        Some(value)
    }
}

fn status_from_headers(result: &str, termination: Option<&str>, ends_in_mate: bool) -> GameStatus {
    if ends_in_mate {
        return GameStatus::Mate;
    }
    match (result, termination) {
        ("*", _) => GameStatus::Started,
        (_, Some("Time forfeit")) => GameStatus::OutOfTime,
        (_, Some("Abandoned")) => GameStatus::Aborted,
        ("1/2-1/2", _) => GameStatus::Draw,
        _ => GameStatus::Resign,
    }
}

/// Extract SAN moves and the `[%eval]` comment following each one.
/// Headers and variations are removed first.
fn extract_moves_and_evals(pgn: &str) -> (Vec<String>, Vec<PlatformEval>) {
    let header_re = Regex::new(r"(?m)^\s*\[[^\]]*\]\s*$").unwrap();
    let no_headers = header_re.replace_all(pgn, "");

    let variation_re = Regex::new(r"\([^()]*\)").unwrap();
    let mut text = no_headers.to_string();
    // Nested variations: strip innermost first
    while variation_re.is_match(&text) {
        text = variation_re.replace_all(&text, "").to_string();
    }

    let token_re = Regex::new(
        r"\{(?P<comment>[^}]*)\}|(?P<san>[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?)",
    )
    .unwrap();

    let mut moves = Vec::new();
    let mut evals: Vec<PlatformEval> = Vec::new();

    for cap in token_re.captures_iter(&text) {
        if let Some(san) = cap.name("san") {
            moves.push(san.as_str().to_string());
            evals.push(PlatformEval::default());
        } else if let Some(comment) = cap.name("comment") {
            if let (Some(score), Some(last)) = (parse_eval_comment(comment.as_str()), evals.last_mut()) {
                last.score = Some(score);
            }
        }
    }

    (moves, evals)
}

/// Parse `[%eval 0.35]` or `[%eval #-3]` (white's point of view).
pub fn parse_eval_comment(comment: &str) -> Option<Score> {
    let eval_re = Regex::new(r"\[%eval\s+(#?)(-?\d+(?:\.\d+)?)\]").ok()?;
    let cap = eval_re.captures(comment)?;
    if &cap[1] == "#" {
        cap[2].parse::<i32>().ok().map(Score::Mate)
    } else {
        cap[2]
            .parse::<f64>()
            .ok()
            .map(|pawns| Score::Cp((pawns * 100.0).round() as i32))
    }
}

/// Extract a string value from a PGN header (e.g. WhiteTitle, BlackTitle).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}
