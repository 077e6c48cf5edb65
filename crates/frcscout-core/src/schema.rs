// Declared column schemas for each scouting sheet, plus the header alias
// table that maps whatever the sheet author typed onto canonical names.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::normalize::{normalize_record, parse_coordinates, RawRecord};
use crate::view::{Record, View, ViewKind};

// Canonical column names for the match scouting sheet.
pub const TEAM: &str = "Teams";
pub const MATCH_NUMBER: &str = "Match Number";
pub const AMP_AUTO: &str = "AMP AUTO";
pub const SPEAKER_AUTO: &str = "SPEAKER AUTO";
pub const MID_NOTES: &str = "mid notes";
pub const TELE_AMP: &str = "tele AMP";
pub const TELE_SPEAKER: &str = "tele Speaker";
pub const DEFENSIVE_PINS: &str = "Defensive Pins";
pub const MISSED_SHOTS: &str = "Missed Shots";
pub const SHOT_TO_TRAP: &str = "Shot to Trap";
pub const CLIMBED: &str = "Climbed";
pub const SPEAKER_COORDINATES: &str = "Speaker Coordinates";
pub const MISSED_COORDINATES: &str = "Missed Coordinates";
pub const AUTO_NOTES_COORDINATES: &str = "Auto Picked Notes Coordinates";

pub const PIT_TEAM: &str = "Team Number";
pub const SUPER_TEAM: &str = "קבוצה";
pub const SUPER_SCOUT_NAME: &str = "שם";
pub const SUPER_MATCH: &str = "מקצה";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which spreadsheet a CSV export came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    /// Per-match scouting, published as the average/last/last-3/all views.
    Match,
    /// Pit scouting questionnaire, one row per team.
    Pit,
    /// Free-text super scouting answers (Hebrew headers).
    Super,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Identifier,
    Numeric,
    Text,
    Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

const MATCH_FIELDS: &[FieldSpec] = &[
    field(TEAM, FieldKind::Identifier),
    field(MATCH_NUMBER, FieldKind::Identifier),
    field(AMP_AUTO, FieldKind::Numeric),
    field(SPEAKER_AUTO, FieldKind::Numeric),
    field(MID_NOTES, FieldKind::Numeric),
    field(TELE_AMP, FieldKind::Numeric),
    field(TELE_SPEAKER, FieldKind::Numeric),
    field(DEFENSIVE_PINS, FieldKind::Numeric),
    field(MISSED_SHOTS, FieldKind::Numeric),
    field(SHOT_TO_TRAP, FieldKind::Numeric),
    field(CLIMBED, FieldKind::Text),
    field(SPEAKER_COORDINATES, FieldKind::Coordinates),
    field(MISSED_COORDINATES, FieldKind::Coordinates),
    field(AUTO_NOTES_COORDINATES, FieldKind::Coordinates),
];

const PIT_FIELDS: &[FieldSpec] = &[
    field(PIT_TEAM, FieldKind::Identifier),
    field("Where the Robot Can Score", FieldKind::Text),
    field("Where the Robot Can Shoot From (Farthest)", FieldKind::Text),
    field("Where the Robot Can Collect From", FieldKind::Text),
    field("Can the Robot Climb", FieldKind::Text),
    field("Can the Robot Climb Anywhere on the Chain", FieldKind::Text),
    field("Can the Robot Climb with Another Robot", FieldKind::Text),
    field("Does the Robot Perform Trap", FieldKind::Text),
    field("Chassis Type", FieldKind::Text),
    field("Drive System Motors", FieldKind::Text),
    field("Gear Ratio", FieldKind::Text),
    field("Can the Robot Pass Under the Chain", FieldKind::Text),
    field("What the Robot Does in Autonomous", FieldKind::Text),
    field("Robot Width with Bumpers", FieldKind::Text),
];

const SUPER_FIELDS: &[FieldSpec] = &[
    field(SUPER_TEAM, FieldKind::Identifier),
    field(SUPER_SCOUT_NAME, FieldKind::Text),
    field(SUPER_MATCH, FieldKind::Text),
    field("תאר אוטונומי", FieldKind::Text),
    field("תאר טלאופ + אנדגיים", FieldKind::Text),
    field("תאר שימוש בטראפ", FieldKind::Text),
    field("תאר הגנה", FieldKind::Text),
    field("תאר התמודדות עם הגנה", FieldKind::Text),
    field("פרט רוטיישנס", FieldKind::Text),
    field("ירי - מיקום + גובה + זמן", FieldKind::Text),
    field("איסוף - רצפה/פידר + זמן", FieldKind::Text),
    field("תאר כימיה עם שאר הברית", FieldKind::Text),
    field("הערות", FieldKind::Text),
];

/// Header spellings seen in the wild. Keys are compared after trimming and
/// lowercasing, so pure case variants ("Mid Notes") need no entry.
const MATCH_ALIASES: &[(&str, &str)] = &[
    ("team", TEAM),
    ("team #", TEAM),
    ("team number", TEAM),
    ("match", MATCH_NUMBER),
    ("match #", MATCH_NUMBER),
    ("amp auto", AMP_AUTO),
    ("auto amp", AMP_AUTO),
    ("speaker auto", SPEAKER_AUTO),
    ("auto speaker", SPEAKER_AUTO),
    ("middle notes", MID_NOTES),
    ("tele amp", TELE_AMP),
    ("teleop amp", TELE_AMP),
    ("tele speaker", TELE_SPEAKER),
    ("teleop speaker", TELE_SPEAKER),
    ("defense pins", DEFENSIVE_PINS),
    ("missed shot", MISSED_SHOTS),
    ("shots to trap", SHOT_TO_TRAP),
    ("climb", CLIMBED),
    ("auto notes coordinates", AUTO_NOTES_COORDINATES),
];

const PIT_ALIASES: &[(&str, &str)] = &[("team", PIT_TEAM), ("teams", PIT_TEAM), ("team #", PIT_TEAM)];

const SUPER_ALIASES: &[(&str, &str)] = &[
    ("מספר קבוצה", SUPER_TEAM),
    ("team", SUPER_TEAM),
    ("שם סקאוטר", SUPER_SCOUT_NAME),
    ("מספר מקצה", SUPER_MATCH),
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("{sheet:?} sheet is missing its identifier column `{column}`")]
    MissingIdentifier { sheet: SheetKind, column: String },

    #[error("headers `{first}` and `{second}` both map to column `{canonical}`")]
    DuplicateColumn {
        first: String,
        second: String,
        canonical: String,
    },

    #[error("alias `{alias}` targets `{target}`, which is not a {sheet:?} sheet column")]
    UnknownAliasTarget {
        sheet: SheetKind,
        alias: String,
        target: String,
    },
}

/// The result of loading one sheet: canonical columns and typed records.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub sheet: SheetKind,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    /// Tag a match-sheet table as one of the published views.
    pub fn into_view(self, kind: ViewKind) -> View {
        View::new(kind, self.columns, self.records)
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Schema {
    sheet: SheetKind,
    fields: &'static [FieldSpec],
    /// lowercased raw header -> canonical name
    aliases: HashMap<String, String>,
}

impl Schema {
    pub fn for_sheet(sheet: SheetKind) -> Self {
        let (fields, aliases) = match sheet {
            SheetKind::Match => (MATCH_FIELDS, MATCH_ALIASES),
            SheetKind::Pit => (PIT_FIELDS, PIT_ALIASES),
            SheetKind::Super => (SUPER_FIELDS, SUPER_ALIASES),
        };
        let mut map: HashMap<String, String> = fields
            .iter()
            .map(|f| (f.name.to_lowercase(), f.name.to_string()))
            .collect();
        for (raw, canonical) in aliases {
            map.insert(raw.to_lowercase(), canonical.to_string());
        }
        Schema {
            sheet,
            fields,
            aliases: map,
        }
    }

    /// Add caller-supplied aliases (raw header -> canonical name). Every
    /// target must be a declared column of this sheet.
    pub fn with_aliases(mut self, extra: &HashMap<String, String>) -> Result<Self, SchemaError> {
        for (alias, target) in extra {
            if self.field(target).is_none() {
                return Err(SchemaError::UnknownAliasTarget {
                    sheet: self.sheet,
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
            self.aliases
                .insert(alias.trim().to_lowercase(), target.clone());
        }
        Ok(self)
    }

    pub fn sheet(&self) -> SheetKind {
        self.sheet
    }

    pub fn field(&self, canonical: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == canonical)
    }

    /// The column that holds the team number.
    pub fn identifier(&self) -> &'static str {
        match self.sheet {
            SheetKind::Match => TEAM,
            SheetKind::Pit => PIT_TEAM,
            SheetKind::Super => SUPER_TEAM,
        }
    }

    pub fn numeric_columns(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Numeric)
            .map(|f| f.name)
            .collect()
    }

    /// Canonical name for a raw header. Headers with no known mapping are
    /// returned trimmed but otherwise as written.
    pub fn canonical_header(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.aliases
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Map a header row onto canonical names. Blank headers map to `None`
    /// and their cells are dropped.
    pub fn map_headers(&self, headers: &[String]) -> Result<Vec<Option<String>>, SchemaError> {
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut mapped = Vec::with_capacity(headers.len());

        for raw in headers {
            if raw.trim().is_empty() {
                mapped.push(None);
                continue;
            }
            let canonical = self.canonical_header(raw);
            if let Some(first) = seen.get(&canonical) {
                return Err(SchemaError::DuplicateColumn {
                    first: first.clone(),
                    second: raw.clone(),
                    canonical,
                });
            }
            if self.field(&canonical).is_none() {
                warn!(
                    "{:?} sheet: unrecognized header '{}', keeping it as a text column",
                    self.sheet, raw
                );
            }
            seen.insert(canonical.clone(), raw.clone());
            mapped.push(Some(canonical));
        }

        if !seen.contains_key(self.identifier()) {
            return Err(SchemaError::MissingIdentifier {
                sheet: self.sheet,
                column: self.identifier().to_string(),
            });
        }

        Ok(mapped)
    }

    /// Build typed records from a header row and data rows.
    ///
    /// Rows whose cells are all blank are skipped. Coordinate cells that do
    /// not parse are kept as text and logged.
    pub fn build_table<I>(&self, headers: &[String], rows: I) -> Result<Table, SchemaError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mapped = self.map_headers(headers)?;
        let columns: Vec<String> = mapped.iter().flatten().cloned().collect();
        let numeric = self.numeric_columns();
        let coordinate_columns: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Coordinates)
            .map(|f| f.name)
            .collect();

        let mut records = Vec::new();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.iter().all(|c| c.trim().is_empty()) {
                debug!("{:?} sheet: skipping blank row {}", self.sheet, row_idx + 1);
                continue;
            }

            let raw: RawRecord = mapped
                .iter()
                .zip(row)
                .filter_map(|(col, cell)| col.as_ref().map(|c| (c.clone(), cell)))
                .collect();

            for column in &coordinate_columns {
                if let Some(cell) = raw.get(*column) {
                    if let Err(e) = parse_coordinates(cell) {
                        warn!("row {}: {}: {}", row_idx + 1, column, e);
                    }
                }
            }

            records.push(normalize_record(&raw, self.identifier(), &numeric));
        }

        Ok(Table {
            sheet: self.sheet,
            columns,
            records,
        })
    }
}
