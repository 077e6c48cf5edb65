// Scouting data pipeline: typed records from sheet exports, team lookups,
// composite ranking and alliance projections. No I/O lives here; callers
// hand in fully loaded views.

pub mod analysis;
pub mod index;
pub mod normalize;
pub mod schema;
pub mod scoring;
pub mod strategy;
pub mod view;

pub use index::{find_all, find_team, TeamIndex};
pub use scoring::{rank, ScoringError, WeightedColumn, WeightedColumnSelection};
pub use strategy::{
    project_match, summarize_alliance, Alliance, AllianceProjection, AllianceSummary, GameRules, MatchProjection,
    StrategyError,
};
pub use view::{Record, TeamId, Value, View, ViewKind};
