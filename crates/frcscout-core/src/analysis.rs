// Column summaries and per-team history helpers used by the table views.

use serde::{Deserialize, Serialize};

use crate::index::find_all;
use crate::normalize::{parse_coordinates, parse_lenient, FieldPoint};
use crate::schema::{FieldKind, Schema, MATCH_NUMBER};
use crate::view::{Record, TeamId, View};

// ---------------------------------------------------------------------------
// Column ranges and tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

/// Relative standing of a value inside its column's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Mid,
    High,
}

/// Min and max of a column, read leniently. `None` for an empty view.
pub fn column_range(view: &View, column: &str) -> Option<ColumnRange> {
    view.records
        .iter()
        .map(|r| r.number(column))
        .fold(None, |acc, v| match acc {
            None => Some(ColumnRange { min: v, max: v }),
            Some(ColumnRange { min, max }) => Some(ColumnRange {
                min: min.min(v),
                max: max.max(v),
            }),
        })
}

/// Bucket `value` into thirds of `range`. A column whose max is 0, or whose
/// values are all equal, puts everything in `Low`.
pub fn tier(value: f64, range: &ColumnRange) -> Tier {
    let span = range.max - range.min;
    // The dashboard left a max == 0 column uncoloured and gave all-equal
    // columns its top colour. Both band as Low here so every cell has a tier.
    if range.max == 0.0 || span <= 0.0 {
        return Tier::Low;
    }
    let pct = (value - range.min) / span * 100.0;
    if pct <= 33.0 {
        Tier::Low
    } else if pct <= 66.0 {
        Tier::Mid
    } else {
        Tier::High
    }
}

/// Tier of every numeric column in `record`, in view column order.
/// Identifier and non-numeric columns are skipped.
pub fn record_tiers(view: &View, schema: &Schema, record: &Record) -> Vec<(String, Tier)> {
    view.columns
        .iter()
        .filter(|c| {
            schema
                .field(c)
                .is_some_and(|f| f.kind == FieldKind::Numeric)
        })
        .filter_map(|c| column_range(view, c).map(|range| (c.clone(), tier(record.number(c), &range))))
        .collect()
}

// ---------------------------------------------------------------------------
// Match history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub match_number: String,
    pub value: f64,
}

/// Rows of `team` sorted by match number. Views may be published newest
/// first or oldest first, so row position says nothing about time. Rows
/// with the same (or no) match number keep view order.
fn rows_by_match<'a>(view: &'a View, team: &TeamId) -> Vec<&'a Record> {
    let mut rows = find_all(view, team);
    rows.sort_by(|a, b| {
        let a = parse_lenient(&a.text(MATCH_NUMBER).unwrap_or_default());
        let b = parse_lenient(&b.text(MATCH_NUMBER).unwrap_or_default());
        a.total_cmp(&b)
    });
    rows
}

/// One point per row of `team`, oldest match first.
pub fn match_series(view: &View, team: &TeamId, column: &str) -> Vec<SeriesPoint> {
    rows_by_match(view, team)
        .into_iter()
        .map(|r| SeriesPoint {
            match_number: r.text(MATCH_NUMBER).unwrap_or_default(),
            value: r.number(column),
        })
        .collect()
}

/// Every coordinate recorded in `column` across the team's rows, oldest
/// match first. Cells that do not parse contribute nothing.
pub fn team_points(view: &View, team: &TeamId, column: &str) -> Vec<FieldPoint> {
    rows_by_match(view, team)
        .into_iter()
        .filter_map(|r| r.text(column))
        .flat_map(|cell| parse_coordinates(&cell).unwrap_or_default())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Trend {
    NotEnoughData { rows: usize },
    Compared {
        previous_match: String,
        recent_match: String,
        improvements: Vec<String>,
        declines: Vec<String>,
        stable: Vec<String>,
    },
}

/// Compare the team's two most recent matches column by column. Only
/// numeric schema columns are compared.
pub fn trend(view: &View, schema: &Schema, team: &TeamId) -> Trend {
    let rows = rows_by_match(view, team);
    if rows.len() < 2 {
        return Trend::NotEnoughData { rows: rows.len() };
    }
    let recent = rows[rows.len() - 1];
    let previous = rows[rows.len() - 2];

    let mut improvements = Vec::new();
    let mut declines = Vec::new();
    let mut stable = Vec::new();

    for column in view.columns.iter().filter(|c| {
        schema
            .field(c)
            .is_some_and(|f| f.kind == FieldKind::Numeric)
    }) {
        let now = recent.number(column);
        let before = previous.number(column);
        if now > before {
            improvements.push(column.clone());
        } else if now < before {
            declines.push(column.clone());
        } else {
            stable.push(column.clone());
        }
    }

    Trend::Compared {
        previous_match: previous.text(MATCH_NUMBER).unwrap_or_default(),
        recent_match: recent.text(MATCH_NUMBER).unwrap_or_default(),
        improvements,
        declines,
        stable,
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Records where any of `columns` contains `query`, ignoring case.
/// An empty query matches everything.
pub fn search<'a>(records: &'a [Record], query: &str, columns: &[&str]) -> Vec<&'a Record> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|r| {
            columns.iter().any(|c| {
                r.text(c)
                    .is_some_and(|cell| cell.to_lowercase().contains(&needle))
            })
        })
        .collect()
}
