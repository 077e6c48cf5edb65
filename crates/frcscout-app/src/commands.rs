// Command implementations shared by the CLI and the integration tests.
// Each returns the rendered output instead of printing it.

use anyhow::{bail, Context as _};
use frcscout_core::analysis::{column_range, match_series, record_tiers, search, team_points, trend, Tier};
use frcscout_core::normalize::ImagePoint;
use frcscout_core::schema::{
    Schema, SheetKind, PIT_TEAM, SUPER_MATCH, SUPER_SCOUT_NAME, SUPER_TEAM,
};
use frcscout_core::scoring::{rank, WeightedColumn, WeightedColumnSelection};
use frcscout_core::strategy::{project_match, summarize_alliance, Alliance, AllianceSummary};
use frcscout_core::{find_team, Record, TeamId, TeamIndex, View, ViewKind};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::loader::{load_table, schema_for, CsvSource};
use crate::report::{self, OutputFormat};

/// Loaded config plus the CSV source built from it.
pub struct Context {
    pub config: Config,
    pub source: CsvSource,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(config: Config, format: OutputFormat) -> anyhow::Result<Self> {
        let source = CsvSource::new(config.clone()).context("invalid header aliases in config")?;
        Ok(Context {
            config,
            source,
            format,
        })
    }

    fn view(&self, kind: ViewKind) -> anyhow::Result<View> {
        self.source
            .load_view(kind)
            .with_context(|| format!("failed to load the {kind} view"))
    }

    fn match_schema(&self) -> anyhow::Result<Schema> {
        Ok(schema_for(SheetKind::Match, &self.config.aliases)?)
    }

    fn render<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<String> {
        match self.format {
            OutputFormat::Text => Ok(text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(value)? + "\n"),
        }
    }
}

/// Parse a `COLUMN=WEIGHT` argument.
pub fn parse_weighted(arg: &str) -> Result<WeightedColumn, String> {
    let (column, weight) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected COLUMN=WEIGHT, got '{arg}'"))?;
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|_| format!("weight in '{arg}' is not a number"))?;
    Ok(WeightedColumn::new(column.trim(), weight))
}

/// A team's row plus where each numeric value sits in its column.
#[derive(Debug, Serialize)]
pub struct TeamReport<'a> {
    pub record: Option<&'a Record>,
    pub tiers: Vec<(String, Tier)>,
}

pub fn team(ctx: &Context, kind: ViewKind, team: &TeamId) -> anyhow::Result<String> {
    let view = ctx.view(kind)?;
    let schema = ctx.match_schema()?;
    let record = find_team(&view, team);
    let tiers = record
        .map(|r| record_tiers(&view, &schema, r))
        .unwrap_or_default();
    let team_report = TeamReport { record, tiers };

    ctx.render(&team_report, || match record {
        Some(r) => report::format_record(r, &view.columns) + &report::format_tiers(&team_report.tiers),
        None => format!("No {kind} data for team {team}\n"),
    })
}

pub fn history(ctx: &Context, kind: ViewKind, team: &TeamId, column: &str) -> anyhow::Result<String> {
    let view = ctx.view(kind)?;
    let series = match_series(&view, team, column);
    ctx.render(&series, || report::format_series(team, column, &series))
}

/// Scale a team's recorded field positions onto a `width` x `height` image.
pub fn shots(
    ctx: &Context,
    kind: ViewKind,
    team: &TeamId,
    column: &str,
    width: f64,
    height: f64,
) -> anyhow::Result<String> {
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        bail!("image size must be positive, got {width}x{height}");
    }
    let view = ctx.view(kind)?;
    let points = team_points(&view, team, column);
    let mapped: Vec<ImagePoint> = points.iter().map(|p| p.to_image(width, height)).collect();
    ctx.render(&mapped, || report::format_points(team, column, &points, &mapped))
}

pub fn rank_teams(
    ctx: &Context,
    kind: ViewKind,
    columns: Vec<WeightedColumn>,
    limit: Option<usize>,
) -> anyhow::Result<String> {
    let selection = if columns.is_empty() {
        ctx.config.scoring.selection()?
    } else {
        WeightedColumnSelection::new(columns)?
    };
    let view = ctx.view(kind)?;
    let ranked = rank(&view, &selection)?;
    info!("ranked {} rows from the {} view", ranked.len(), kind);
    ctx.render(&ranked, || report::format_ranking(&ranked, limit))
}

/// `teams` holds the red alliance followed by the blue alliance.
pub fn strategy(ctx: &Context, kind: ViewKind, teams: &[TeamId]) -> anyhow::Result<String> {
    if teams.len() != 6 {
        bail!("expected 6 team numbers (3 red, 3 blue), got {}", teams.len());
    }
    let red: Alliance = [teams[0].clone(), teams[1].clone(), teams[2].clone()];
    let blue: Alliance = [teams[3].clone(), teams[4].clone(), teams[5].clone()];

    let view = ctx.view(kind)?;
    let projection = project_match(&view, &red, &blue, &ctx.config.rules)?;
    ctx.render(&projection, || report::format_projection(&projection))
}

/// Most teams `compare` takes: two alliances of three.
pub const MAX_COMPARED_TEAMS: usize = 6;

#[derive(Debug, Serialize)]
pub struct ComparedTeam<'a> {
    pub team: TeamId,
    pub record: Option<&'a Record>,
}

/// Side-by-side rows plus ranking-point progress. The first three teams
/// form the blue alliance and any further teams the red one.
#[derive(Debug, Serialize)]
pub struct Comparison<'a> {
    pub columns: &'a [String],
    pub teams: Vec<ComparedTeam<'a>>,
    pub blue: AllianceSummary,
    pub red: Option<AllianceSummary>,
}

pub fn compare(ctx: &Context, kind: ViewKind, teams: &[TeamId]) -> anyhow::Result<String> {
    if teams.iter().all(TeamId::is_empty) {
        bail!("expected at least one team number");
    }
    if teams.len() > MAX_COMPARED_TEAMS {
        bail!("at most {MAX_COMPARED_TEAMS} teams can be compared, got {}", teams.len());
    }
    ctx.config.rules.validate()?;

    let view = ctx.view(kind)?;
    let index = TeamIndex::build(&view);
    let compared: Vec<ComparedTeam> = teams
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| ComparedTeam {
            team: t.clone(),
            record: index.first(t),
        })
        .collect();

    let (blue, red) = teams.split_at(teams.len().min(3));
    let comparison = Comparison {
        columns: &view.columns,
        teams: compared,
        blue: summarize_alliance(&index, blue, &ctx.config.rules),
        red: (!red.is_empty()).then(|| summarize_alliance(&index, red, &ctx.config.rules)),
    };
    info!("compared {} teams from the {} view", comparison.teams.len(), kind);

    ctx.render(&comparison, || {
        let rows: Vec<(TeamId, Option<&Record>)> = comparison
            .teams
            .iter()
            .map(|c| (c.team.clone(), c.record))
            .collect();
        let mut out = report::format_comparison(&view.columns, &rows);
        out.push('\n');
        out.push_str(&report::format_summary("Blue", &comparison.blue));
        if let Some(red) = &comparison.red {
            out.push('\n');
            out.push_str(&report::format_summary("Red", red));
        }
        out
    })
}

pub fn team_trend(ctx: &Context, kind: ViewKind, team: &TeamId) -> anyhow::Result<String> {
    let view = ctx.view(kind)?;
    let schema = ctx.match_schema()?;
    let t = trend(&view, &schema, team);
    ctx.render(&t, || report::format_trend(team, &t))
}

pub fn ranges(ctx: &Context, kind: ViewKind) -> anyhow::Result<String> {
    let view = ctx.view(kind)?;
    let schema = ctx.match_schema()?;
    let numeric = schema.numeric_columns();
    let ranges: Vec<(String, _)> = view
        .columns
        .iter()
        .filter(|c| numeric.iter().any(|n| *n == c.as_str()))
        .filter_map(|c| column_range(&view, c).map(|r| (c.clone(), r)))
        .collect();
    ctx.render(&ranges, || report::format_ranges(&ranges))
}

const PIT_SEARCH_COLUMNS: &[&str] = &[PIT_TEAM];
const SUPER_SEARCH_COLUMNS: &[&str] = &[SUPER_SCOUT_NAME, SUPER_TEAM, SUPER_MATCH];

pub fn search_table(ctx: &Context, sheet: SheetKind, query: &str) -> anyhow::Result<String> {
    let (path, columns) = match sheet {
        SheetKind::Pit => (ctx.config.tables.pit.as_deref(), PIT_SEARCH_COLUMNS),
        SheetKind::Super => (ctx.config.tables.super_scouting.as_deref(), SUPER_SEARCH_COLUMNS),
        SheetKind::Match => bail!("search works on the pit and super scouting tables"),
    };
    let Some(path) = path else {
        bail!("no path configured for the {sheet:?} table");
    };

    let schema = schema_for(sheet, &ctx.config.aliases)?;
    let table = load_table(Path::new(path), &schema)?;
    let hits = search(&table.records, query, columns);

    ctx.render(&hits, || {
        if hits.is_empty() {
            return format!("No rows match '{query}'\n");
        }
        hits.iter()
            .map(|r| report::format_record(r, &table.columns))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
