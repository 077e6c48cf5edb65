// Configuration loading and parsing (config/frcscout.toml).

use frcscout_core::scoring::{WeightedColumn, WeightedColumnSelection};
use frcscout_core::strategy::GameRules;
use frcscout_core::ViewKind;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Name of the config file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "frcscout.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("no config found and no default config at {path}")]
    MissingDefaults { path: PathBuf },

    #[error("failed to write {path} from defaults: {source}")]
    SeedError {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub views: ViewPaths,
    #[serde(default)]
    pub tables: TablePaths,
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub rules: GameRules,
    #[serde(default)]
    pub aliases: AliasConfig,
}

impl Config {
    /// Rewrite every relative data path so it is relative to `base` instead
    /// of the working directory.
    pub fn with_base_dir(mut self, base: &Path) -> Self {
        let resolve = |p: &mut Option<String>| {
            if let Some(path) = p {
                if Path::new(path.as_str()).is_relative() {
                    *path = base.join(path.as_str()).display().to_string();
                }
            }
        };
        resolve(&mut self.views.average);
        resolve(&mut self.views.last_match);
        resolve(&mut self.views.last_3_matches);
        resolve(&mut self.views.all_matches);
        resolve(&mut self.tables.pit);
        resolve(&mut self.tables.super_scouting);
        self
    }
}

/// CSV export for each published view. Views without a path are simply not
/// loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewPaths {
    #[serde(default)]
    pub average: Option<String>,
    #[serde(default)]
    pub last_match: Option<String>,
    #[serde(default)]
    pub last_3_matches: Option<String>,
    #[serde(default)]
    pub all_matches: Option<String>,
    /// Views whose rows should be reversed on load so the most recent row
    /// for each team comes first.
    #[serde(default)]
    pub newest_first: Vec<ViewKind>,
}

impl ViewPaths {
    pub fn path(&self, kind: ViewKind) -> Option<&str> {
        match kind {
            ViewKind::Average => self.average.as_deref(),
            ViewKind::LastMatch => self.last_match.as_deref(),
            ViewKind::Last3Matches => self.last_3_matches.as_deref(),
            ViewKind::AllMatches => self.all_matches.as_deref(),
        }
    }

    pub fn reverse_on_load(&self, kind: ViewKind) -> bool {
        self.newest_first.contains(&kind)
    }

    /// Configured views, in `ViewKind::ALL` order.
    pub fn configured(&self) -> Vec<(ViewKind, &str)> {
        ViewKind::ALL
            .into_iter()
            .filter_map(|k| self.path(k).map(|p| (k, p)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TablePaths {
    #[serde(default)]
    pub pit: Option<String>,
    #[serde(default, rename = "super")]
    pub super_scouting: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    /// Selection used by `rank` when no `--column` flags are given.
    #[serde(default)]
    pub default_selection: Vec<WeightedColumn>,
}

impl ScoringConfig {
    pub fn selection(&self) -> Result<WeightedColumnSelection, ConfigError> {
        WeightedColumnSelection::new(self.default_selection.clone()).map_err(|e| {
            ConfigError::ValidationError {
                field: "scoring.default_selection".into(),
                message: e.to_string(),
            }
        })
    }
}

/// Extra header aliases per sheet (raw header -> canonical column).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliasConfig {
    #[serde(default, rename = "match")]
    pub match_sheet: HashMap<String, String>,
    #[serde(default)]
    pub pit: HashMap<String, String>,
    #[serde(default, rename = "super")]
    pub super_sheet: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/frcscout.toml` relative to `base_dir`.
///
/// This does not copy defaults; prefer `load_config()` for normal startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    load_config_file(&path)
}

/// Load and validate a config file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Seed `config/frcscout.toml` from `defaults/frcscout.toml` when no local
/// config exists yet. Returns the path written, or `None` if a local config
/// was already there. A local config is never replaced.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let local = base_dir.join("config").join(CONFIG_FILE);
    if local.is_file() {
        return Ok(None);
    }

    let seed = base_dir.join("defaults").join(CONFIG_FILE);
    if !seed.is_file() {
        return Err(ConfigError::MissingDefaults { path: seed });
    }

    let seed_error = |source: std::io::Error| ConfigError::SeedError {
        path: local.clone(),
        source,
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(seed_error)?;
    std::fs::copy(&seed, &local).map_err(seed_error)?;

    info!("wrote {} from {}", local.display(), seed.display());
    Ok(Some(local))
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.views.configured().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "views".into(),
            message: "at least one view path must be set".into(),
        });
    }

    if config.refresh.interval_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "refresh.interval_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    let selection = config.scoring.selection()?;
    if !config.scoring.default_selection.is_empty() {
        selection.validate().map_err(|e| ConfigError::ValidationError {
            field: "scoring.default_selection".into(),
            message: e.to_string(),
        })?;
    }

    config
        .rules
        .validate()
        .map_err(|e| ConfigError::ValidationError {
            field: "rules".into(),
            message: e.to_string(),
        })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
