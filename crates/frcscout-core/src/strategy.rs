// Alliance strategy projection: amplification cycles and projected points,
// plus the ranking-point progress summary for a hand-picked alliance.
//
// An amplification cycle is scored with tele-op notes only: a fixed number
// of amp notes powers the speaker, after which a fixed number of speaker
// notes score at the amplified value.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::TeamIndex;
use crate::schema::{AMP_AUTO, SHOT_TO_TRAP, SPEAKER_AUTO, TELE_AMP, TELE_SPEAKER};
use crate::view::{TeamId, View};

/// Three team slots. Blank slots contribute nothing.
pub type Alliance = [TeamId; 3];

// ---------------------------------------------------------------------------
// Game constants
// ---------------------------------------------------------------------------

/// Point values and cycle shape for the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub auto_speaker_points: f64,
    pub auto_amp_points: f64,
    pub amplified_speaker_points: f64,
    pub speaker_points: f64,
    pub amp_points: f64,
    /// Speaker notes scored per amplification.
    pub cycle_speaker_notes: u32,
    /// Amp notes needed to start an amplification.
    pub cycle_amp_notes: u32,
    /// Points per note shot into the trap.
    pub trap_points: f64,
    /// Speaker notes an alliance needs for the notes ranking point.
    pub notes_target: f64,
    /// Climb points an alliance needs for the climb ranking point.
    pub climb_target: f64,
}

impl Default for GameRules {
    fn default() -> Self {
        GameRules {
            auto_speaker_points: 5.0,
            auto_amp_points: 2.0,
            amplified_speaker_points: 5.0,
            speaker_points: 2.0,
            amp_points: 1.0,
            cycle_speaker_notes: 4,
            cycle_amp_notes: 2,
            trap_points: 5.0,
            notes_target: 25.0,
            climb_target: 10.0,
        }
    }
}

impl GameRules {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.cycle_speaker_notes == 0 || self.cycle_amp_notes == 0 {
            return Err(StrategyError::InvalidRules(
                "cycle note counts must be greater than 0".into(),
            ));
        }
        let points = [
            ("auto_speaker_points", self.auto_speaker_points),
            ("auto_amp_points", self.auto_amp_points),
            ("amplified_speaker_points", self.amplified_speaker_points),
            ("speaker_points", self.speaker_points),
            ("amp_points", self.amp_points),
            ("trap_points", self.trap_points),
        ];
        for (name, value) in points {
            if !value.is_finite() || value < 0.0 {
                return Err(StrategyError::InvalidRules(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [("notes_target", self.notes_target), ("climb_target", self.climb_target)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(StrategyError::InvalidRules(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Points for one full amplification cycle.
    pub fn cycle_points(&self) -> f64 {
        self.cycle_speaker_notes as f64 * self.amplified_speaker_points
            + self.cycle_amp_notes as f64 * self.amp_points
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StrategyError {
    #[error("team {0} is listed on both alliances")]
    OverlappingAlliances(TeamId),

    #[error("invalid game rules: {0}")]
    InvalidRules(String),
}

/// Projection for one alliance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllianceProjection {
    pub teams: Alliance,
    /// Non-blank slots with no record in the view.
    pub missing_teams: Vec<TeamId>,
    pub auto_speaker: f64,
    pub auto_amp: f64,
    pub tele_speaker: f64,
    pub tele_amp: f64,
    pub full_cycles: u32,
    /// Tele-op notes left after the full cycles.
    pub remaining_speaker: f64,
    pub remaining_amp: f64,
    pub partial_cycle: bool,
    /// Speaker notes scored amplified in the partial cycle.
    pub partial_speaker: f64,
    /// Notes scored unamplified after all cycles.
    pub leftover_speaker: f64,
    pub leftover_amp: f64,
    pub projected_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchProjection {
    pub red: AllianceProjection,
    pub blue: AllianceProjection,
}

/// Progress of a group of teams towards the notes and climb ranking points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllianceSummary {
    pub teams: Vec<TeamId>,
    pub missing_teams: Vec<TeamId>,
    pub total_notes: f64,
    pub notes_target: f64,
    /// Capped at 100.
    pub notes_percent: f64,
    pub climb_points: f64,
    pub climb_target: f64,
    pub climb_percent: f64,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project both alliances of a match from one view.
pub fn project_match(
    view: &View,
    red: &Alliance,
    blue: &Alliance,
    rules: &GameRules,
) -> Result<MatchProjection, StrategyError> {
    rules.validate()?;

    if let Some(shared) = red.iter().find(|t| !t.is_empty() && blue.contains(t)) {
        return Err(StrategyError::OverlappingAlliances(shared.clone()));
    }

    let index = TeamIndex::build(view);
    Ok(MatchProjection {
        red: project_alliance(&index, red, rules),
        blue: project_alliance(&index, blue, rules),
    })
}

/// Project a single alliance against a prebuilt index.
pub fn project_alliance(index: &TeamIndex<'_>, teams: &Alliance, rules: &GameRules) -> AllianceProjection {
    let mut auto_speaker = 0.0;
    let mut auto_amp = 0.0;
    let mut tele_speaker = 0.0;
    let mut tele_amp = 0.0;
    let mut missing_teams = Vec::new();

    for team in teams.iter().filter(|t| !t.is_empty()) {
        match index.first(team) {
            Some(record) => {
                auto_speaker += record.number(SPEAKER_AUTO);
                auto_amp += record.number(AMP_AUTO);
                tele_speaker += record.number(TELE_SPEAKER);
                tele_amp += record.number(TELE_AMP);
            }
            None => missing_teams.push(team.clone()),
        }
    }

    let cycle_speaker = rules.cycle_speaker_notes as f64;
    let cycle_amp = rules.cycle_amp_notes as f64;

    let full_cycles = (tele_speaker / cycle_speaker)
        .min(tele_amp / cycle_amp)
        .floor()
        .max(0.0) as u32;

    let remaining_speaker = tele_speaker - full_cycles as f64 * cycle_speaker;
    let remaining_amp = tele_amp - full_cycles as f64 * cycle_amp;

    let partial_cycle = remaining_amp >= cycle_amp && remaining_speaker > 0.0;
    let (partial_speaker, leftover_speaker, leftover_amp) = if partial_cycle {
        let used = remaining_speaker.min(cycle_speaker);
        (used, remaining_speaker - used, remaining_amp - cycle_amp)
    } else {
        (0.0, remaining_speaker, remaining_amp)
    };

    let projected_points = auto_speaker * rules.auto_speaker_points
        + auto_amp * rules.auto_amp_points
        + full_cycles as f64 * rules.cycle_points()
        + partial_speaker * rules.amplified_speaker_points
        + leftover_speaker * rules.speaker_points
        + leftover_amp * rules.amp_points;

    debug!(
        "alliance {:?}: {} full cycles, partial={}, {:.1} projected points",
        teams.iter().map(TeamId::as_str).collect::<Vec<_>>(),
        full_cycles,
        partial_cycle,
        projected_points
    );

    AllianceProjection {
        teams: teams.clone(),
        missing_teams,
        auto_speaker,
        auto_amp,
        tele_speaker,
        tele_amp,
        full_cycles,
        remaining_speaker,
        remaining_amp,
        partial_cycle,
        partial_speaker,
        leftover_speaker,
        leftover_amp,
        projected_points,
    }
}

// ---------------------------------------------------------------------------
// Ranking-point summary
// ---------------------------------------------------------------------------

/// Sum auto and tele-op speaker notes and trap points over `teams`.
///
/// Each team's values are truncated to whole notes before summing, so an
/// average of 2.9 counts as 2. Blank ids are skipped; ids with no row are
/// listed in `missing_teams` and add nothing.
pub fn summarize_alliance(index: &TeamIndex<'_>, teams: &[TeamId], rules: &GameRules) -> AllianceSummary {
    let mut total_notes = 0.0;
    let mut traps = 0.0;
    let mut missing_teams = Vec::new();

    for team in teams.iter().filter(|t| !t.is_empty()) {
        match index.first(team) {
            Some(record) => {
                total_notes += record.number(SPEAKER_AUTO).trunc() + record.number(TELE_SPEAKER).trunc();
                traps += record.number(SHOT_TO_TRAP).trunc();
            }
            None => missing_teams.push(team.clone()),
        }
    }

    let climb_points = traps * rules.trap_points;
    AllianceSummary {
        teams: teams.to_vec(),
        missing_teams,
        total_notes,
        notes_target: rules.notes_target,
        notes_percent: progress(total_notes, rules.notes_target),
        climb_points,
        climb_target: rules.climb_target,
        climb_percent: progress(climb_points, rules.climb_target),
    }
}

fn progress(value: f64, target: f64) -> f64 {
    (value / target * 100.0).min(100.0)
}
