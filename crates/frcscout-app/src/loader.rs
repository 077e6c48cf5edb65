// CSV loading: turns exported sheet tabs into typed views and tables.
//
// Downloading the sheet is someone else's job; this module only reads files
// that already exist on disk.

use chrono::{DateTime, Utc};
use frcscout_core::schema::{Schema, SchemaError, SheetKind, Table};
use frcscout_core::{View, ViewKind};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::config::{AliasConfig, Config};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("bad headers in {path}: {source}")]
    Schema { path: String, source: SchemaError },

    #[error("no path configured for {0}")]
    NotConfigured(String),
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Every configured view, loaded at the same moment.
#[derive(Debug, Clone)]
pub struct ViewSet {
    pub loaded_at: DateTime<Utc>,
    pub views: HashMap<ViewKind, View>,
}

impl ViewSet {
    pub fn new(views: HashMap<ViewKind, View>) -> Self {
        ViewSet {
            loaded_at: Utc::now(),
            views,
        }
    }

    pub fn get(&self, kind: ViewKind) -> Option<&View> {
        self.views.get(&kind)
    }
}

/// Something that can produce a fresh `ViewSet` on demand.
pub trait ViewSource: Send + Sync + 'static {
    fn load(&self) -> Result<ViewSet, LoadError>;
}

/// Reads the CSV exports named in the config.
#[derive(Debug, Clone)]
pub struct CsvSource {
    config: Config,
    schema: Schema,
}

impl CsvSource {
    pub fn new(config: Config) -> Result<Self, LoadError> {
        let schema = schema_for(SheetKind::Match, &config.aliases).map_err(|e| LoadError::Schema {
            path: "config aliases.match".into(),
            source: e,
        })?;
        Ok(CsvSource { config, schema })
    }

    /// Load a single view.
    pub fn load_view(&self, kind: ViewKind) -> Result<View, LoadError> {
        let path = self
            .config
            .views
            .path(kind)
            .ok_or_else(|| LoadError::NotConfigured(kind.to_string()))?;
        load_view(
            Path::new(path),
            kind,
            &self.schema,
            self.config.views.reverse_on_load(kind),
        )
    }
}

impl ViewSource for CsvSource {
    fn load(&self) -> Result<ViewSet, LoadError> {
        let mut views = HashMap::new();
        for (kind, _) in self.config.views.configured() {
            views.insert(kind, self.load_view(kind)?);
        }
        Ok(ViewSet::new(views))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Schema for `sheet` with the configured extra aliases applied.
pub fn schema_for(sheet: SheetKind, aliases: &AliasConfig) -> Result<Schema, SchemaError> {
    let extra = match sheet {
        SheetKind::Match => &aliases.match_sheet,
        SheetKind::Pit => &aliases.pit,
        SheetKind::Super => &aliases.super_sheet,
    };
    Schema::for_sheet(sheet).with_aliases(extra)
}

// ---------------------------------------------------------------------------
// Reader-based loaders (enable testing without temp files)
// ---------------------------------------------------------------------------

enum ReadError {
    Csv(csv::Error),
    Schema(SchemaError),
}

fn read_table_from_reader<R: Read>(rdr: R, schema: &Schema) -> Result<Table, ReadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);

    let headers: Vec<String> = reader
        .headers()
        .map_err(ReadError::Csv)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect::<Vec<_>>()),
            Err(e) => warn!("skipping malformed row {}: {}", i + 1, e),
        }
    }

    schema.build_table(&headers, rows).map_err(ReadError::Schema)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load any sheet export as a `Table`.
pub fn load_table(path: &Path, schema: &Schema) -> Result<Table, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let table = read_table_from_reader(file, schema).map_err(|e| match e {
        ReadError::Csv(source) => LoadError::Csv {
            path: path.display().to_string(),
            source,
        },
        ReadError::Schema(source) => LoadError::Schema {
            path: path.display().to_string(),
            source,
        },
    })?;
    info!(
        "loaded {} {:?} rows from {}",
        table.records.len(),
        table.sheet,
        path.display()
    );
    Ok(table)
}

/// Load a match-sheet export as a view, optionally reversing row order.
pub fn load_view(path: &Path, kind: ViewKind, schema: &Schema, newest_first: bool) -> Result<View, LoadError> {
    let mut table = load_table(path, schema)?;
    if newest_first {
        table.records.reverse();
    }
    Ok(table.into_view(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frcscout_core::schema::{MID_NOTES, PIT_TEAM, TEAM, TELE_SPEAKER};
    use frcscout_core::{TeamId, Value};

    fn read(csv_data: &str, sheet: SheetKind) -> Table {
        match read_table_from_reader(csv_data.as_bytes(), &Schema::for_sheet(sheet)) {
            Ok(t) => t,
            Err(ReadError::Csv(e)) => panic!("csv error: {e}"),
            Err(ReadError::Schema(e)) => panic!("schema error: {e}"),
        }
    }

    #[test]
    fn match_csv_loads_with_aliases() {
        let csv_data = "\
Team,Match Number,Mid Notes,TELE SPEAKER,Climbed
1690,4,2,7,yes
5987,4,1,x,no";
        let table = read(csv_data, SheetKind::Match);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.columns[0], TEAM);
        assert_eq!(table.records[0].team, TeamId::new("1690"));
        assert_eq!(table.records[0].number(MID_NOTES), 2.0);
        assert_eq!(table.records[0].number(TELE_SPEAKER), 7.0);
        assert_eq!(table.records[1].get(TELE_SPEAKER), Some(&Value::Number(0.0)));
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let csv_data = "\u{feff}Teams,AMP AUTO\n1690,2\n";
        let table = read(csv_data, SheetKind::Match);
        assert_eq!(table.records[0].team.as_str(), "1690");
    }

    #[test]
    fn short_rows_are_tolerated() {
        let csv_data = "Teams,AMP AUTO,tele AMP\n1690,2\n5987,1,3\n";
        let table = read(csv_data, SheetKind::Match);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].number("tele AMP"), 0.0);
    }

    #[test]
    fn missing_identifier_column_is_a_schema_error() {
        let result = read_table_from_reader(
            "AMP AUTO,tele AMP\n1,2\n".as_bytes(),
            &Schema::for_sheet(SheetKind::Match),
        );
        assert!(matches!(result, Err(ReadError::Schema(SchemaError::MissingIdentifier { .. }))));
    }

    #[test]
    fn pit_csv_uses_team_number_column() {
        let csv_data = "Team Number,Chassis Type\n1690,swerve\n";
        let table = read(csv_data, SheetKind::Pit);
        assert_eq!(table.columns[0], PIT_TEAM);
        assert_eq!(table.records[0].team.as_str(), "1690");
        assert_eq!(table.records[0].text("Chassis Type").as_deref(), Some("swerve"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_table(
            Path::new("definitely/not/here.csv"),
            &Schema::for_sheet(SheetKind::Match),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn configured_aliases_reach_the_schema() {
        let mut aliases = AliasConfig::default();
        aliases
            .match_sheet
            .insert("Speaker Tele".into(), TELE_SPEAKER.into());
        let schema = schema_for(SheetKind::Match, &aliases).unwrap();
        assert_eq!(schema.canonical_header("speaker tele"), TELE_SPEAKER);
    }
}
