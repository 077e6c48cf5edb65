// Core data model: team ids, cell values, records and views.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::normalize::parse_lenient;

// ---------------------------------------------------------------------------
// Team identifier
// ---------------------------------------------------------------------------

/// A team number as it appears in the sheet. Kept as a string: team numbers
/// are identifiers, never arithmetic values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        TeamId(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty slot (e.g. an unfilled alliance position).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        TeamId::new(s)
    }
}

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// A single normalized cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric reading of the cell. Text is parsed leniently, so free text
    /// reads as 0.0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => parse_lenient(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of scouting data for one team (and possibly one match).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub team: TeamId,
    pub values: HashMap<String, Value>,
}

impl Record {
    pub fn new(team: TeamId) -> Self {
        Record {
            team,
            values: HashMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Numeric value of `column`, or 0.0 when absent or unparsable.
    pub fn number(&self, column: &str) -> f64 {
        self.values.get(column).map(Value::as_f64).unwrap_or(0.0)
    }

    /// Text value of `column`; numbers are rendered back to a string.
    pub fn text(&self, column: &str) -> Option<String> {
        self.values.get(column).map(|v| v.to_string())
    }

    /// Returns a copy of this record with `column` set to `value`.
    pub fn with_field(&self, column: &str, value: Value) -> Record {
        let mut out = self.clone();
        out.values.insert(column.to_string(), value);
        out
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// The named snapshots the scouting sheet publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    Average,
    LastMatch,
    Last3Matches,
    AllMatches,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Average,
        ViewKind::LastMatch,
        ViewKind::Last3Matches,
        ViewKind::AllMatches,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Average => "average",
            ViewKind::LastMatch => "lastMatch",
            ViewKind::Last3Matches => "last3Matches",
            ViewKind::AllMatches => "allMatches",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown view '{s}'"))
    }
}

/// An immutable, ordered snapshot of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub kind: ViewKind,
    /// Canonical column labels in sheet order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl View {
    pub fn new(kind: ViewKind, columns: Vec<String>, records: Vec<Record>) -> Self {
        View {
            kind,
            columns,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_id_is_trimmed() {
        assert_eq!(TeamId::new("  5987 ").as_str(), "5987");
        assert!(TeamId::new("   ").is_empty());
    }

    #[test]
    fn record_number_defaults_to_zero() {
        let mut rec = Record::new(TeamId::new("1690"));
        rec.values.insert("AMP AUTO".into(), Value::Number(3.0));
        rec.values.insert("notes".into(), Value::Text("fast".into()));
        assert_eq!(rec.number("AMP AUTO"), 3.0);
        assert_eq!(rec.number("notes"), 0.0);
        assert_eq!(rec.number("missing"), 0.0);
    }

    #[test]
    fn with_field_leaves_original_untouched() {
        let rec = Record::new(TeamId::new("1690"));
        let scored = rec.with_field("score", Value::Number(4.5));
        assert!(rec.get("score").is_none());
        assert_eq!(scored.number("score"), 4.5);
    }

    #[test]
    fn view_kind_parses_case_insensitively() {
        assert_eq!("lastmatch".parse::<ViewKind>(), Ok(ViewKind::LastMatch));
        assert_eq!("allMatches".parse::<ViewKind>(), Ok(ViewKind::AllMatches));
        assert!("weekly".parse::<ViewKind>().is_err());
    }

    #[test]
    fn value_serializes_untagged() {
        let json = serde_json::to_string(&Value::Number(2.5)).unwrap();
        assert_eq!(json, "2.5");
        let json = serde_json::to_string(&Value::Text("climb".into())).unwrap();
        assert_eq!(json, "\"climb\"");
    }
}
