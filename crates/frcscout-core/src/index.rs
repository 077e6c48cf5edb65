// Team lookups over a view.

use std::collections::HashMap;

use crate::view::{Record, TeamId, View};

// A blank team id never matches: rows without a team number are not
// addressable, and an empty query finds nothing.

/// First record for `team` in view order, or `None` if the team has no rows.
pub fn find_team<'a>(view: &'a View, team: &TeamId) -> Option<&'a Record> {
    if team.is_empty() {
        return None;
    }
    view.records.iter().find(|r| &r.team == team)
}

/// Every record for `team`, in view order. Use this for views that hold one
/// row per team per match.
pub fn find_all<'a>(view: &'a View, team: &TeamId) -> Vec<&'a Record> {
    if team.is_empty() {
        return Vec::new();
    }
    view.records.iter().filter(|r| &r.team == team).collect()
}

/// Precomputed team -> row positions for repeated lookups against one view.
#[derive(Debug)]
pub struct TeamIndex<'a> {
    view: &'a View,
    rows: HashMap<&'a TeamId, Vec<usize>>,
}

impl<'a> TeamIndex<'a> {
    pub fn build(view: &'a View) -> Self {
        let mut rows: HashMap<&'a TeamId, Vec<usize>> = HashMap::new();
        for (i, record) in view.records.iter().enumerate() {
            if record.team.is_empty() {
                continue;
            }
            rows.entry(&record.team).or_default().push(i);
        }
        TeamIndex { view, rows }
    }

    pub fn first(&self, team: &TeamId) -> Option<&'a Record> {
        self.rows
            .get(team)
            .and_then(|idx| idx.first())
            .map(|&i| &self.view.records[i])
    }

    pub fn all(&self, team: &TeamId) -> Vec<&'a Record> {
        self.rows
            .get(team)
            .map(|idx| idx.iter().map(|&i| &self.view.records[i]).collect())
            .unwrap_or_default()
    }

    /// Distinct teams in order of first appearance.
    pub fn teams(&self) -> Vec<&'a TeamId> {
        let mut teams: Vec<(&'a TeamId, usize)> =
            self.rows.iter().map(|(t, idx)| (*t, idx[0])).collect();
        teams.sort_by_key(|(_, first)| *first);
        teams.into_iter().map(|(t, _)| t).collect()
    }

    pub fn contains(&self, team: &TeamId) -> bool {
        self.rows.contains_key(team)
    }
}
