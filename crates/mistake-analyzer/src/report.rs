//! Aggregation of per-game reports into one summary.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::analysis::Severity;
use crate::game_analysis::{EvaluationStatus, GameReport};
use crate::phase::Phase;
use crate::themes::Theme;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    pub games_analyzed: usize,
    /// Games without any evaluation to compare
    pub games_unavailable: usize,
    pub games_failed: usize,
    pub severities: BTreeMap<Severity, usize>,
    /// Themes of flagged moves, over all severities
    pub themes: BTreeMap<Theme, usize>,
    pub themes_by_severity: BTreeMap<Severity, BTreeMap<Theme, usize>>,
    pub missed_by_severity: BTreeMap<Severity, BTreeMap<Theme, usize>>,
    pub phases: BTreeMap<Phase, usize>,
    pub openings: BTreeMap<String, usize>,
}

/// Entries sorted by count, highest first; ties keep key order.
fn by_count<K: Clone + Ord>(counts: &BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut entries: Vec<(K, usize)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

impl AggregateReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reports<'a, I>(reports: I) -> Self
    where
        I: IntoIterator<Item = &'a GameReport>,
    {
        let mut aggregate = Self::new();
        for report in reports {
            aggregate.add_game(report);
        }
        aggregate
    }

    pub fn add_game(&mut self, report: &GameReport) {
        if report.evaluation == EvaluationStatus::Unavailable {
            self.games_unavailable += 1;
            return;
        }
        self.games_analyzed += 1;

        for mistake in &report.mistakes {
            let Some(severity) = mistake.severity else {
                // Theme-only record of a final mating move
                for theme in &mistake.themes {
                    *self.themes.entry(*theme).or_default() += 1;
                }
                continue;
            };

            *self.severities.entry(severity).or_default() += 1;
            if let Some(phase) = mistake.phase {
                *self.phases.entry(phase).or_default() += 1;
            }
            if let Some(opening) = &report.opening {
                *self.openings.entry(opening.clone()).or_default() += 1;
            }

            let by_theme = self.themes_by_severity.entry(severity).or_default();
            for theme in &mistake.themes {
                *by_theme.entry(*theme).or_default() += 1;
                *self.themes.entry(*theme).or_default() += 1;
            }
            let missed = self.missed_by_severity.entry(severity).or_default();
            for theme in &mistake.missed_themes {
                *missed.entry(*theme).or_default() += 1;
            }
        }
    }

    pub fn add_failure(&mut self) {
        self.games_failed += 1;
    }

    pub fn total_mistakes(&self) -> usize {
        self.severities.values().sum()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.severities.get(&severity).copied().unwrap_or(0)
    }

    /// Most frequent severity; on a tie the more severe one wins.
    pub fn most_frequent_severity(&self) -> Option<Severity> {
        self.severities
            .iter()
            .filter(|(_, n)| **n > 0)
            .max_by_key(|(s, n)| (**n, **s))
            .map(|(s, _)| *s)
    }

    /// Most frequent theme over flagged moves and missed lines.
    pub fn most_frequent_theme(&self) -> Option<Theme> {
        let mut totals = self.themes.clone();
        for missed in self.missed_by_severity.values() {
            for (theme, n) in missed {
                *totals.entry(*theme).or_default() += n;
            }
        }
        by_count(&totals).into_iter().next().map(|(theme, _)| theme)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Games analyzed: {} (no evaluations: {}, failed: {})",
            self.games_analyzed, self.games_unavailable, self.games_failed
        );
        let _ = writeln!(out, "Total mistakes: {}", self.total_mistakes());
        if let Some(severity) = self.most_frequent_severity() {
            let _ = writeln!(out, "Most frequent mistake type: {severity}");
        }
        if let Some(theme) = self.most_frequent_theme() {
            let _ = writeln!(out, "Most frequent theme: {theme}");
        }

        for (severity, count) in by_count(&self.severities) {
            let _ = writeln!(out, "\n{severity}: {count}");
            if let Some(themes) = self.themes_by_severity.get(&severity) {
                for (theme, n) in by_count(themes) {
                    let _ = writeln!(out, "  {theme}: {n}");
                }
            }
            if let Some(missed) = self.missed_by_severity.get(&severity) {
                if !missed.is_empty() {
                    let _ = writeln!(out, "  missed:");
                    for (theme, n) in by_count(missed) {
                        let _ = writeln!(out, "    {theme}: {n}");
                    }
                }
            }
        }

        if !self.phases.is_empty() {
            let _ = writeln!(out, "\nBy phase:");
            for (phase, n) in by_count(&self.phases) {
                let _ = writeln!(out, "  {phase}: {n}");
            }
        }

        if !self.openings.is_empty() {
            let _ = writeln!(out, "\nBy opening:");
            for (opening, n) in by_count(&self.openings) {
                let _ = writeln!(out, "  {opening}: {n}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_analysis::Mistake;
    use chess_core::Color;

    fn mistake(severity: Option<Severity>, phase: Phase, themes: Vec<Theme>) -> Mistake {
        Mistake {
            ply: 10,
            move_number: 6,
            san: "Nf3".into(),
            mover: Color::White,
            severity,
            cp_loss: 0,
            eval_before: None,
            eval_after: None,
            phase: Some(phase),
            themes,
            missed_themes: vec![Theme::HangingPiece],
            best_move: None,
        }
    }

    fn report(mistakes: Vec<Mistake>) -> GameReport {
        GameReport {
            game_id: "g1".into(),
            side: Some(Color::White),
            opening: Some("Italian Game".into()),
            mistakes,
            accuracy: Some(80.0),
            evaluation: EvaluationStatus::Available,
            analysed_moves: 20,
            truncated_at: None,
        }
    }

    #[test]
    fn test_counts() {
        let r = report(vec![
            mistake(Some(Severity::Blunder), Phase::Middlegame, vec![Theme::Pin]),
            mistake(Some(Severity::Inaccuracy), Phase::Opening, vec![]),
            mistake(Some(Severity::Blunder), Phase::Middlegame, vec![Theme::Pin]),
        ]);
        let agg = AggregateReport::from_reports([&r]);
        assert_eq!(agg.games_analyzed, 1);
        assert_eq!(agg.total_mistakes(), 3);
        assert_eq!(agg.count(Severity::Blunder), 2);
        assert_eq!(agg.most_frequent_severity(), Some(Severity::Blunder));
        assert_eq!(agg.most_frequent_theme(), Some(Theme::HangingPiece));
        assert_eq!(agg.phases.get(&Phase::Middlegame), Some(&2));
        assert_eq!(agg.openings.get("Italian Game"), Some(&3));
        assert_eq!(agg.themes_by_severity[&Severity::Blunder][&Theme::Pin], 2);
    }

    #[test]
    fn test_theme_only_record_counts_no_mistake() {
        let r = report(vec![mistake(None, Phase::Endgame, vec![Theme::Checkmate])]);
        let agg = AggregateReport::from_reports([&r]);
        assert_eq!(agg.total_mistakes(), 0);
        assert!(agg.phases.is_empty());
        assert_eq!(agg.themes.get(&Theme::Checkmate), Some(&1));
    }

    #[test]
    fn test_unavailable_and_failed_games() {
        let mut r = report(vec![]);
        r.evaluation = EvaluationStatus::Unavailable;
        let mut agg = AggregateReport::from_reports([&r]);
        agg.add_failure();
        assert_eq!(agg.games_analyzed, 0);
        assert_eq!(agg.games_unavailable, 1);
        assert_eq!(agg.games_failed, 1);
        assert!(agg.render().contains("failed: 1"));
    }

    #[test]
    fn test_render_sorted_by_count() {
        let r = report(vec![
            mistake(Some(Severity::Inaccuracy), Phase::Opening, vec![]),
            mistake(Some(Severity::Mistake), Phase::Opening, vec![]),
            mistake(Some(Severity::Mistake), Phase::Opening, vec![]),
        ]);
        let text = AggregateReport::from_reports([&r]).render();
        let mistake_at = text.find("\nmistake: 2").unwrap();
        let inaccuracy_at = text.find("\ninaccuracy: 1").unwrap();
        assert!(mistake_at < inaccuracy_at);
        assert!(text.contains("Most frequent mistake type: mistake"));
    }
}
