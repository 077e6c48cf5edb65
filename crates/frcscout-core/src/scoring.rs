// Composite scoring: a weighted sum over up to five user-chosen columns.
//
// Weights are percentages applied independently to each column. They are
// not rescaled to sum to 100, so two columns at 100% each add both columns
// at full value.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::view::{Record, Value, View};

/// Maximum number of (column, weight) pairs in one selection.
pub const MAX_SELECTION: usize = 5;

/// Field added to each ranked record.
pub const SCORE_FIELD: &str = "score";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedColumn {
    pub column: String,
    /// Percentage, normally 0-100.
    pub weight: f64,
}

impl WeightedColumn {
    pub fn new(column: impl Into<String>, weight: f64) -> Self {
        WeightedColumn {
            column: column.into(),
            weight,
        }
    }
}

/// Ordered selection of weighted columns, at most `MAX_SELECTION` long.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedColumnSelection(Vec<WeightedColumn>);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScoringError {
    #[error("selection slot {slot} needs both a column and a non-zero weight")]
    MissingSelection { slot: usize },

    #[error("selection slot {slot} needs a finite, non-negative weight")]
    InvalidWeight { slot: usize },

    #[error("at most 5 columns can be weighted, got {0}")]
    TooManyColumns(usize),
}

impl WeightedColumnSelection {
    pub fn new(entries: Vec<WeightedColumn>) -> Result<Self, ScoringError> {
        if entries.len() > MAX_SELECTION {
            return Err(ScoringError::TooManyColumns(entries.len()));
        }
        Ok(WeightedColumnSelection(entries))
    }

    pub fn from_pairs<S: Into<String>>(
        pairs: impl IntoIterator<Item = (S, f64)>,
    ) -> Result<Self, ScoringError> {
        Self::new(
            pairs
                .into_iter()
                .map(|(c, w)| WeightedColumn::new(c, w))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[WeightedColumn] {
        &self.0
    }

    /// Every slot must name a column and carry a finite, positive weight,
    /// and at least one slot must be filled.
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.0.len() > MAX_SELECTION {
            return Err(ScoringError::TooManyColumns(self.0.len()));
        }
        if self.0.is_empty() {
            return Err(ScoringError::MissingSelection { slot: 0 });
        }
        for (slot, entry) in self.0.iter().enumerate() {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(ScoringError::InvalidWeight { slot });
            }
            if entry.column.trim().is_empty() || entry.weight == 0.0 {
                return Err(ScoringError::MissingSelection { slot });
            }
        }
        Ok(())
    }
}

/// Composite score of a single record.
pub fn composite_score(record: &Record, selection: &WeightedColumnSelection) -> f64 {
    selection
        .0
        .iter()
        .map(|e| record.number(&e.column) * (e.weight / 100.0))
        .sum()
}

/// Rank every record of `view` by composite score, highest first.
///
/// Returns copies of the records with a `score` field added; the view is
/// left untouched. Records with equal scores keep their view order.
pub fn rank(view: &View, selection: &WeightedColumnSelection) -> Result<Vec<Record>, ScoringError> {
    selection.validate()?;

    let mut scored: Vec<(f64, Record)> = view
        .records
        .iter()
        .map(|r| {
            let score = composite_score(r, selection);
            (score, r.with_field(SCORE_FIELD, Value::Number(score)))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    debug!(
        "ranked {} records of {} view over {} columns",
        scored.len(),
        view.kind,
        selection.0.len()
    );

    Ok(scored.into_iter().map(|(_, r)| r).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{TeamId, ViewKind};

    fn rec(team: &str, cells: &[(&str, f64)]) -> Record {
        let mut r = Record::new(TeamId::new(team));
        for (k, v) in cells {
            r.values.insert(k.to_string(), Value::Number(*v));
        }
        r
    }

    fn view(records: Vec<Record>) -> View {
        View::new(ViewKind::Average, vec![], records)
    }

    fn scores(ranked: &[Record]) -> Vec<f64> {
        ranked.iter().map(|r| r.number(SCORE_FIELD)).collect()
    }

    #[test]
    fn equal_weights_rank_descending() {
        let v = view(vec![
            rec("1", &[("AMP AUTO", 1.0), ("SPEAKER AUTO", 1.0)]),
            rec("2", &[("AMP AUTO", 4.0), ("SPEAKER AUTO", 2.0)]),
        ]);
        let sel = WeightedColumnSelection::from_pairs([("AMP AUTO", 50.0), ("SPEAKER AUTO", 50.0)])
            .unwrap();

        let ranked = rank(&v, &sel).unwrap();
        assert_eq!(scores(&ranked), vec![3.0, 1.0]);
        assert_eq!(ranked[0].team.as_str(), "2");
    }

    #[test]
    fn ranking_does_not_modify_the_view() {
        let v = view(vec![rec("1", &[("AMP AUTO", 2.0)])]);
        let before = v.clone();
        let sel = WeightedColumnSelection::from_pairs([("AMP AUTO", 100.0)]).unwrap();
        let ranked = rank(&v, &sel).unwrap();
        assert_eq!(v, before);
        assert_eq!(ranked[0].number("AMP AUTO"), 2.0);
        assert!(v.records[0].get(SCORE_FIELD).is_none());
    }

    #[test]
    fn empty_column_in_any_slot_is_rejected() {
        let sel = WeightedColumnSelection::from_pairs([
            ("AMP AUTO", 20.0),
            ("SPEAKER AUTO", 20.0),
            ("", 10.0),
            ("tele AMP", 20.0),
            ("tele Speaker", 30.0),
        ])
        .unwrap();
        let err = rank(&view(vec![]), &sel).unwrap_err();
        assert_eq!(err, ScoringError::MissingSelection { slot: 2 });
    }

    #[test]
    fn zero_weight_in_any_slot_is_rejected() {
        let sel = WeightedColumnSelection::from_pairs([("AMP AUTO", 50.0), ("SPEAKER AUTO", 0.0)])
            .unwrap();
        assert_eq!(
            sel.validate(),
            Err(ScoringError::MissingSelection { slot: 1 })
        );
    }

    #[test]
    fn non_finite_or_negative_weights_are_rejected() {
        let v = view(vec![rec("1", &[("A", 1.0)]), rec("2", &[("A", 9.0)])]);
        for (slot, bad) in [(0, f64::NAN), (0, f64::INFINITY), (0, f64::NEG_INFINITY), (0, -10.0)] {
            let sel = WeightedColumnSelection::from_pairs([("A", bad)]).unwrap();
            assert_eq!(rank(&v, &sel).unwrap_err(), ScoringError::InvalidWeight { slot });
        }

        let parsed: f64 = "NaN".parse().unwrap();
        let sel = WeightedColumnSelection::from_pairs([("A", 50.0), ("B", parsed)]).unwrap();
        assert_eq!(sel.validate(), Err(ScoringError::InvalidWeight { slot: 1 }));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let sel = WeightedColumnSelection::default();
        assert_eq!(
            rank(&view(vec![]), &sel).unwrap_err(),
            ScoringError::MissingSelection { slot: 0 }
        );
    }

    #[test]
    fn more_than_five_columns_is_rejected() {
        let pairs: Vec<(String, f64)> = (0..6).map(|i| (format!("c{i}"), 10.0)).collect();
        assert_eq!(
            WeightedColumnSelection::from_pairs(pairs),
            Err(ScoringError::TooManyColumns(6))
        );
    }

    #[test]
    fn weights_are_not_normalized() {
        // Documented behavior: 100% + 100% counts both columns in full.
        let v = view(vec![rec("1", &[("A", 2.0), ("B", 3.0)])]);
        let sel = WeightedColumnSelection::from_pairs([("A", 100.0), ("B", 100.0)]).unwrap();
        assert_eq!(scores(&rank(&v, &sel).unwrap()), vec![5.0]);
    }

    #[test]
    fn ties_keep_view_order() {
        let v = view(vec![
            rec("a", &[("A", 1.0)]),
            rec("b", &[("A", 5.0)]),
            rec("c", &[("A", 1.0)]),
            rec("d", &[("A", 1.0)]),
        ]);
        let sel = WeightedColumnSelection::from_pairs([("A", 100.0)]).unwrap();
        let order: Vec<String> = rank(&v, &sel)
            .unwrap()
            .iter()
            .map(|r| r.team.to_string())
            .collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn text_cells_are_read_leniently() {
        let mut r = Record::new(TeamId::new("1"));
        r.values.insert("A".into(), Value::Text("4 cycles".into()));
        r.values.insert("B".into(), Value::Text("none".into()));
        let sel = WeightedColumnSelection::from_pairs([("A", 50.0), ("B", 50.0)]).unwrap();
        assert_eq!(composite_score(&r, &sel), 2.0);
    }
}
