// Record normalization: lenient numeric parsing and coordinate lists.
//
// Scout sheets are filled in by hand, so numeric cells routinely contain
// blanks, "-", or trailing words ("3 notes"). Every numeric read goes through
// `parse_lenient`, which never fails.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::view::{Record, TeamId, Value};

/// A raw CSV row: header label to cell text.
pub type RawRecord = HashMap<String, String>;

/// Width of the field grid that coordinate cells are recorded on.
pub const FIELD_GRID_WIDTH: f64 = 10.0;
/// Height of the field grid that coordinate cells are recorded on.
pub const FIELD_GRID_HEIGHT: f64 = 10.0;

// ---------------------------------------------------------------------------
// Numeric parsing
// ---------------------------------------------------------------------------

/// Parse the longest leading decimal literal of `raw`, returning 0.0 when
/// there is none or the result is not finite.
///
/// `"4"` is 4.0, `" 2.5 "` is 2.5, `"3 notes"` is 3.0, `"abc"` and `""` are 0.0.
pub fn parse_lenient(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let mut j = end + 1;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - (end + 1);
        if digits > 0 {
            end = j;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if j < len && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Convert a raw row into a `Record`.
///
/// Columns named in `numeric_columns` become `Value::Number` (0.0 when the
/// cell is missing or unparsable). Every other cell passes through as text.
/// The identifier column is lifted into `Record::team` and also kept as text.
pub fn normalize_record(raw: &RawRecord, team_column: &str, numeric_columns: &[&str]) -> Record {
    let team = TeamId::new(raw.get(team_column).map(String::as_str).unwrap_or(""));
    let mut record = Record::new(team);

    for (column, cell) in raw {
        if numeric_columns.contains(&column.as_str()) {
            continue;
        }
        record
            .values
            .insert(column.clone(), Value::Text(cell.trim().to_string()));
    }
    for column in numeric_columns {
        let n = raw.get(*column).map(|c| parse_lenient(c)).unwrap_or(0.0);
        record.values.insert(column.to_string(), Value::Number(n));
    }

    record
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CoordinateError {
    #[error("invalid coordinate list: {0:?}")]
    InvalidFormat(String),
}

/// A grid position recorded by a scout, e.g. where a shot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPoint {
    pub x: u32,
    pub y: u32,
}

/// A `FieldPoint` scaled onto an image of the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl FieldPoint {
    /// Scale this grid point onto an image `width` x `height` pixels.
    pub fn to_image(self, width: f64, height: f64) -> ImagePoint {
        ImagePoint {
            x: self.x as f64 / FIELD_GRID_WIDTH * width,
            y: self.y as f64 / FIELD_GRID_HEIGHT * height,
        }
    }
}

static COORDINATE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d+):(\d+)\)").expect("coordinate pattern is a valid regex")
});

/// Parse a coordinate cell such as `"(3:4)(5:1)"`.
///
/// Blank cells mean "nothing recorded" and yield an empty list. A non-blank
/// cell with no `(x:y)` pair at all is rejected.
pub fn parse_coordinates(raw: &str) -> Result<Vec<FieldPoint>, CoordinateError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut points = Vec::new();
    for caps in COORDINATE_PAIR.captures_iter(raw) {
        let x = caps[1]
            .parse::<u32>()
            .map_err(|_| CoordinateError::InvalidFormat(raw.to_string()))?;
        let y = caps[2]
            .parse::<u32>()
            .map_err(|_| CoordinateError::InvalidFormat(raw.to_string()))?;
        points.push(FieldPoint { x, y });
    }

    if points.is_empty() {
        return Err(CoordinateError::InvalidFormat(raw.to_string()));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // -- parse_lenient --

    #[test]
    fn plain_numbers_parse() {
        assert_eq!(parse_lenient("4"), 4.0);
        assert_eq!(parse_lenient(" 2.5 "), 2.5);
        assert_eq!(parse_lenient("-1.25"), -1.25);
        assert_eq!(parse_lenient(".5"), 0.5);
        assert_eq!(parse_lenient("1e2"), 100.0);
    }

    #[test]
    fn leading_number_wins_over_trailing_text() {
        assert_eq!(parse_lenient("3 notes"), 3.0);
        assert_eq!(parse_lenient("7.5x"), 7.5);
        assert_eq!(parse_lenient("2e"), 2.0);
    }

    #[test]
    fn non_numeric_is_zero_and_stays_zero() {
        for junk in ["", "abc", "-", ".", "N/A", "inf", "NaN"] {
            let once = parse_lenient(junk);
            assert_eq!(once, 0.0, "input {junk:?}");
            let twice = parse_lenient(&once.to_string());
            assert_eq!(twice, 0.0, "input {junk:?} normalized twice");
        }
    }

    #[test]
    fn overflowing_literal_is_zero() {
        assert_eq!(parse_lenient("1e999"), 0.0);
    }

    // -- normalize_record --

    #[test]
    fn numeric_columns_are_parsed_others_pass_through() {
        let row = raw(&[
            ("Teams", " 1690 "),
            ("AMP AUTO", "3"),
            ("SPEAKER AUTO", "lots"),
            ("Notes", "fast cycler"),
            ("Speaker Coordinates", "(1:2)"),
        ]);
        let rec = normalize_record(&row, "Teams", &["AMP AUTO", "SPEAKER AUTO", "tele AMP"]);

        assert_eq!(rec.team.as_str(), "1690");
        assert_eq!(rec.get("AMP AUTO"), Some(&Value::Number(3.0)));
        assert_eq!(rec.get("SPEAKER AUTO"), Some(&Value::Number(0.0)));
        // Missing numeric columns are filled with zero.
        assert_eq!(rec.get("tele AMP"), Some(&Value::Number(0.0)));
        assert_eq!(rec.get("Notes"), Some(&Value::Text("fast cycler".into())));
        assert_eq!(
            rec.get("Speaker Coordinates"),
            Some(&Value::Text("(1:2)".into()))
        );
        assert_eq!(rec.get("Teams"), Some(&Value::Text("1690".into())));
    }

    #[test]
    fn missing_team_column_gives_empty_team() {
        let rec = normalize_record(&raw(&[("AMP AUTO", "1")]), "Teams", &["AMP AUTO"]);
        assert!(rec.team.is_empty());
    }

    // -- coordinates --

    #[test]
    fn coordinate_pairs_parse_in_order() {
        let pts = parse_coordinates("(1:2)(10:0) (3:4)").unwrap();
        assert_eq!(
            pts,
            vec![
                FieldPoint { x: 1, y: 2 },
                FieldPoint { x: 10, y: 0 },
                FieldPoint { x: 3, y: 4 },
            ]
        );
    }

    #[test]
    fn blank_coordinates_are_empty() {
        assert_eq!(parse_coordinates("  "), Ok(vec![]));
    }

    #[test]
    fn garbage_coordinates_are_rejected() {
        assert!(matches!(
            parse_coordinates("1,2;3,4"),
            Err(CoordinateError::InvalidFormat(_))
        ));
    }

    #[test]
    fn field_point_scales_to_image() {
        let p = FieldPoint { x: 5, y: 2 }.to_image(1000.0, 500.0);
        assert!((p.x - 500.0).abs() < f64::EPSILON);
        assert!((p.y - 100.0).abs() < f64::EPSILON);
    }
}
