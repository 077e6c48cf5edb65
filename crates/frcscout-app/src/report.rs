// Plain-text rendering of pipeline results for the terminal.

use clap::ValueEnum;
use frcscout_core::analysis::{ColumnRange, SeriesPoint, Tier, Trend};
use frcscout_core::normalize::{FieldPoint, ImagePoint};
use frcscout_core::scoring::SCORE_FIELD;
use frcscout_core::strategy::{AllianceProjection, AllianceSummary, MatchProjection};
use frcscout_core::{Record, TeamId};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Whole numbers without decimals, everything else to two places.
pub fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n:.2}")
    }
}

pub fn format_record(record: &Record, columns: &[String]) -> String {
    let mut out = format!("Team {}\n", record.team);
    let width = columns.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    for column in columns {
        let value = match record.get(column) {
            Some(frcscout_core::Value::Number(n)) => fmt_num(*n),
            Some(frcscout_core::Value::Text(s)) => s.clone(),
            None => String::new(),
        };
        let _ = writeln!(out, "  {column:<width$}  {value}");
    }
    out
}

fn tier_label(t: Tier) -> &'static str {
    match t {
        Tier::Low => "low",
        Tier::Mid => "mid",
        Tier::High => "high",
    }
}

pub fn format_tiers(tiers: &[(String, Tier)]) -> String {
    if tiers.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = tiers
        .iter()
        .map(|(column, t)| format!("{column} {}", tier_label(*t)))
        .collect();
    format!("  tiers: {}\n", parts.join(", "))
}

pub fn format_points(team: &TeamId, column: &str, grid: &[FieldPoint], image: &[ImagePoint]) -> String {
    let mut out = format!("Team {team}: {column}\n");
    if grid.is_empty() {
        out.push_str("  nothing recorded\n");
    }
    for (g, p) in grid.iter().zip(image) {
        let _ = writeln!(out, "  ({}:{}) -> {:.1}, {:.1}", g.x, g.y, p.x, p.y);
    }
    out
}

pub fn format_ranking(ranked: &[Record], limit: Option<usize>) -> String {
    let mut out = String::new();
    let shown = limit.unwrap_or(ranked.len()).min(ranked.len());
    for (i, record) in ranked.iter().take(shown).enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {:<8} {:>8}",
            i + 1,
            record.team.as_str(),
            fmt_num(record.number(SCORE_FIELD))
        );
    }
    if shown < ranked.len() {
        let _ = writeln!(out, "     ... {} more", ranked.len() - shown);
    }
    out
}

fn format_alliance(out: &mut String, name: &str, p: &AllianceProjection) {
    let teams: Vec<&str> = p
        .teams
        .iter()
        .filter(|t| !t.is_empty())
        .map(TeamId::as_str)
        .collect();
    let _ = writeln!(out, "{name} alliance: {}", teams.join(", "));
    if !p.missing_teams.is_empty() {
        let missing: Vec<&str> = p.missing_teams.iter().map(TeamId::as_str).collect();
        let _ = writeln!(out, "  no data for: {}", missing.join(", "));
    }
    let _ = writeln!(
        out,
        "  auto:  speaker {}  amp {}",
        fmt_num(p.auto_speaker),
        fmt_num(p.auto_amp)
    );
    let _ = writeln!(
        out,
        "  tele:  speaker {}  amp {}",
        fmt_num(p.tele_speaker),
        fmt_num(p.tele_amp)
    );
    let _ = writeln!(
        out,
        "  full amplification cycles: {}  (remaining speaker {}, amp {})",
        p.full_cycles,
        fmt_num(p.remaining_speaker),
        fmt_num(p.remaining_amp)
    );
    if p.partial_cycle {
        let _ = writeln!(
            out,
            "  partial cycle: {} amplified speaker notes",
            fmt_num(p.partial_speaker)
        );
    }
    let _ = writeln!(out, "  projected points: {}", fmt_num(p.projected_points));
}

pub fn format_projection(m: &MatchProjection) -> String {
    let mut out = String::new();
    format_alliance(&mut out, "Red", &m.red);
    out.push('\n');
    format_alliance(&mut out, "Blue", &m.blue);
    out
}

pub fn format_series(team: &TeamId, column: &str, series: &[SeriesPoint]) -> String {
    let mut out = format!("Team {team}: {column}\n");
    if series.is_empty() {
        out.push_str("  no matches\n");
    }
    for point in series {
        let _ = writeln!(out, "  Match {:<6} {}", point.match_number, fmt_num(point.value));
    }
    out
}

pub fn format_trend(team: &TeamId, trend: &Trend) -> String {
    match trend {
        Trend::NotEnoughData { rows } => {
            format!("Team {team}: not enough data to analyze ({rows} match rows)\n")
        }
        Trend::Compared {
            previous_match,
            recent_match,
            improvements,
            declines,
            stable,
        } => {
            let mut out = format!("Team {team}: match {recent_match} vs match {previous_match}\n");
            let _ = writeln!(out, "  improved: {}", improvements.join(", "));
            let _ = writeln!(out, "  declined: {}", declines.join(", "));
            let _ = writeln!(out, "  stable:   {}", stable.join(", "));
            out
        }
    }
}

/// One column per team, one line per view column. Teams with no row show
/// blank cells.
pub fn format_comparison(columns: &[String], teams: &[(TeamId, Option<&Record>)]) -> String {
    let label_width = columns.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    let cell = |record: Option<&Record>, column: &str| match record.and_then(|r| r.get(column)) {
        Some(frcscout_core::Value::Number(n)) => fmt_num(*n),
        Some(frcscout_core::Value::Text(s)) => s.clone(),
        None => String::new(),
    };

    let mut out = format!("  {:<label_width$}", "");
    for (team, _) in teams {
        let _ = write!(out, "  {:>8}", team.as_str());
    }
    out.push('\n');
    for column in columns {
        let _ = write!(out, "  {column:<label_width$}");
        for (_, record) in teams {
            let _ = write!(out, "  {:>8}", cell(*record, column));
        }
        out.push('\n');
    }

    let missing: Vec<&str> = teams
        .iter()
        .filter(|(_, r)| r.is_none())
        .map(|(t, _)| t.as_str())
        .collect();
    if !missing.is_empty() {
        let _ = writeln!(out, "  no data for: {}", missing.join(", "));
    }
    out
}

pub fn format_summary(name: &str, s: &AllianceSummary) -> String {
    let teams: Vec<&str> = s.teams.iter().filter(|t| !t.is_empty()).map(TeamId::as_str).collect();
    let mut out = format!("{name} alliance: {}\n", teams.join(", "));
    let _ = writeln!(
        out,
        "  notes:    {} / {} ({:.0}%)",
        fmt_num(s.total_notes),
        fmt_num(s.notes_target),
        s.notes_percent
    );
    let _ = writeln!(
        out,
        "  climb RP: {} / {} ({:.0}%)",
        fmt_num(s.climb_points),
        fmt_num(s.climb_target),
        s.climb_percent
    );
    out
}

pub fn format_ranges(ranges: &[(String, ColumnRange)]) -> String {
    let width = ranges.iter().map(|(c, _)| c.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (column, range) in ranges {
        let _ = writeln!(
            out,
            "  {column:<width$}  min {:>6}  max {:>6}",
            fmt_num(range.min),
            fmt_num(range.max)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use frcscout_core::strategy::{project_match, summarize_alliance, GameRules};
    use frcscout_core::TeamIndex;
    use frcscout_core::{Value, View, ViewKind};

    #[test]
    fn numbers_drop_trailing_zero_decimals() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(2.5), "2.50");
        assert_eq!(fmt_num(1.0 / 3.0), "0.33");
    }

    #[test]
    fn ranking_truncates_with_a_tail_line() {
        let ranked: Vec<Record> = (0..4)
            .map(|i| {
                Record::new(TeamId::new(format!("{}", 100 + i)))
                    .with_field(SCORE_FIELD, Value::Number(10.0 - i as f64))
            })
            .collect();
        let text = format_ranking(&ranked, Some(2));
        assert!(text.contains("  1. 100"));
        assert!(text.contains("  2. 101"));
        assert!(!text.contains("102"));
        assert!(text.contains("... 2 more"));
    }

    #[test]
    fn projection_mentions_missing_teams() {
        let view = View::new(ViewKind::Average, vec![], vec![]);
        let alliance = |a: &str| [TeamId::new(a), TeamId::new(""), TeamId::new("")];
        let m = project_match(&view, &alliance("254"), &alliance("1114"), &GameRules::default()).unwrap();
        let text = format_projection(&m);
        assert!(text.contains("Red alliance: 254"));
        assert!(text.contains("no data for: 254"));
        assert!(text.contains("Blue alliance: 1114"));
        assert!(text.contains("projected points: 0"));
    }

    #[test]
    fn tiers_render_on_one_line() {
        let text = format_tiers(&[("tele AMP".into(), Tier::High), ("AMP AUTO".into(), Tier::Low)]);
        assert_eq!(text, "  tiers: tele AMP high, AMP AUTO low\n");
        assert_eq!(format_tiers(&[]), "");
    }

    #[test]
    fn points_show_grid_and_image_positions() {
        let grid = [FieldPoint { x: 5, y: 2 }];
        let image = [grid[0].to_image(800.0, 400.0)];
        let text = format_points(&TeamId::new("1690"), "Speaker Coordinates", &grid, &image);
        assert!(text.contains("(5:2) -> 400.0, 80.0"));
    }

    #[test]
    fn record_lists_columns_in_order() {
        let rec = Record::new(TeamId::new("1690"))
            .with_field("AMP AUTO", Value::Number(2.0))
            .with_field("Climbed", Value::Text("yes".into()));
        let text = format_record(&rec, &["AMP AUTO".into(), "Climbed".into()]);
        let amp = text.find("AMP AUTO").unwrap();
        let climbed = text.find("Climbed").unwrap();
        assert!(amp < climbed);
        assert!(text.starts_with("Team 1690"));
    }

    #[test]
    fn comparison_puts_teams_side_by_side() {
        let a = Record::new(TeamId::new("1690")).with_field("tele AMP", Value::Number(4.0));
        let b = Record::new(TeamId::new("254")).with_field("tele AMP", Value::Number(2.5));
        let teams = [
            (TeamId::new("1690"), Some(&a)),
            (TeamId::new("254"), Some(&b)),
            (TeamId::new("404"), None),
        ];
        let text = format_comparison(&["tele AMP".into()], &teams);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "                1690       254       404");
        assert_eq!(lines[1], "  tele AMP         4      2.50          ");
        assert_eq!(lines[2], "  no data for: 404");
    }

    #[test]
    fn summary_shows_progress_against_targets() {
        let rec = Record::new(TeamId::new("1690"))
            .with_field("SPEAKER AUTO", Value::Number(3.0))
            .with_field("tele Speaker", Value::Number(7.0))
            .with_field("Shot to Trap", Value::Number(1.0));
        let view = View::new(ViewKind::Average, vec![], vec![rec]);
        let index = TeamIndex::build(&view);
        let s = summarize_alliance(&index, &[TeamId::new("1690"), TeamId::new("")], &GameRules::default());
        let text = format_summary("Blue", &s);
        assert!(text.starts_with("Blue alliance: 1690\n"));
        assert!(text.contains("notes:    10 / 25 (40%)"));
        assert!(text.contains("climb RP: 5 / 10 (50%)"));
    }
}
