//! Flat, one-row-per-entity form of a `Report`, used for persistence.

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::{Metrics, ReconciledEntity, Report, Requirement};

/// Column order of a persisted report.
pub const COLUMNS: &[&str] = &[
    "id",
    "name",
    "power_before",
    "power_after",
    "kill_points_before",
    "kill_points_after",
    "deaths_before",
    "deaths_after",
    "tier4_kills_before",
    "tier4_kills_after",
    "tier5_kills_before",
    "tier5_kills_after",
    "required_kills",
    "required_deaths",
    "power_change",
    "kills_change",
    "deads_change",
    "tier4_kills_change",
    "tier5_kills_change",
    "kills_completion_pct",
    "deaths_completion_pct",
];

/// One persisted report row. The derived columns are written for readers of
/// the file but ignored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub power_before: f64,
    pub power_after: f64,
    pub kill_points_before: f64,
    pub kill_points_after: f64,
    pub deaths_before: f64,
    pub deaths_after: f64,
    pub tier4_kills_before: f64,
    pub tier4_kills_after: f64,
    pub tier5_kills_before: f64,
    pub tier5_kills_after: f64,
    pub required_kills: f64,
    pub required_deaths: f64,

    #[serde(default)]
    pub power_change: f64,
    #[serde(default)]
    pub kills_change: f64,
    #[serde(default)]
    pub deads_change: f64,
    #[serde(default)]
    pub tier4_kills_change: f64,
    #[serde(default)]
    pub tier5_kills_change: f64,
    #[serde(default)]
    pub kills_completion_pct: f64,
    #[serde(default)]
    pub deaths_completion_pct: f64,
}

/// A typed cell for spreadsheet writers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

impl ReportRow {
    /// Cells in [`COLUMNS`] order.
    pub fn cells(&self) -> Vec<Cell<'_>> {
        use Cell::{Number, Text};
        vec![
            Text(&self.id),
            Text(&self.name),
            Number(self.power_before),
            Number(self.power_after),
            Number(self.kill_points_before),
            Number(self.kill_points_after),
            Number(self.deaths_before),
            Number(self.deaths_after),
            Number(self.tier4_kills_before),
            Number(self.tier4_kills_after),
            Number(self.tier5_kills_before),
            Number(self.tier5_kills_after),
            Number(self.required_kills),
            Number(self.required_deaths),
            Number(self.power_change),
            Number(self.kills_change),
            Number(self.deads_change),
            Number(self.tier4_kills_change),
            Number(self.tier5_kills_change),
            Number(self.kills_completion_pct),
            Number(self.deaths_completion_pct),
        ]
    }

    fn into_entity(self) -> ReconciledEntity {
        let before = Metrics {
            power: self.power_before,
            kill_points: self.kill_points_before,
            deaths: self.deaths_before,
            tier4_kills: self.tier4_kills_before,
            tier5_kills: self.tier5_kills_before,
        };
        let after = Metrics {
            power: self.power_after,
            kill_points: self.kill_points_after,
            deaths: self.deaths_after,
            tier4_kills: self.tier4_kills_after,
            tier5_kills: self.tier5_kills_after,
        };
        let requirement = Requirement {
            required_kills: self.required_kills,
            required_deaths: self.required_deaths,
        };
        ReconciledEntity::new(self.id, self.name, before, after, requirement)
    }
}

impl From<&ReconciledEntity> for ReportRow {
    fn from(e: &ReconciledEntity) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            power_before: e.before.power,
            power_after: e.after.power,
            kill_points_before: e.before.kill_points,
            kill_points_after: e.after.kill_points,
            deaths_before: e.before.deaths,
            deaths_after: e.after.deaths,
            tier4_kills_before: e.before.tier4_kills,
            tier4_kills_after: e.after.tier4_kills,
            tier5_kills_before: e.before.tier5_kills,
            tier5_kills_after: e.after.tier5_kills,
            required_kills: e.requirement.required_kills,
            required_deaths: e.requirement.required_deaths,
            power_change: e.power_change,
            kills_change: e.kills_change,
            deads_change: e.deads_change,
            tier4_kills_change: e.tier4_kills_change,
            tier5_kills_change: e.tier5_kills_change,
            kills_completion_pct: e.kills_completion_pct,
            deaths_completion_pct: e.deaths_completion_pct,
        }
    }
}

impl Report {
    pub fn to_rows(&self) -> Vec<ReportRow> {
        self.entities().iter().map(ReportRow::from).collect()
    }

    /// Rebuild a report, recomputing every derived field from the stored
    /// snapshot values and requirements.
    pub fn from_rows(rows: Vec<ReportRow>) -> Result<Self, ReconError> {
        Report::from_entities(rows.into_iter().map(ReportRow::into_entity).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report::from_entities(vec![ReconciledEntity::new(
            "1001".into(),
            "Alice".into(),
            Metrics { power: 5e6, kill_points: 1000.0, deaths: 10.0, tier4_kills: 4.0, tier5_kills: 5.0 },
            Metrics { power: 4.9e6, kill_points: 1500.0, deaths: 12.0, tier4_kills: 9.0, tier5_kills: 8.0 },
            Requirement { required_kills: 400.0, required_deaths: 5.0 },
        )])
        .unwrap()
    }

    #[test]
    fn columns_match_cells() {
        let rows = sample().to_rows();
        assert_eq!(rows[0].cells().len(), COLUMNS.len());
        assert_eq!(rows[0].cells()[0], Cell::Text("1001"));
    }

    #[test]
    fn stale_derived_values_are_recomputed() {
        let mut rows = sample().to_rows();
        rows[0].kills_change = 12345.0;
        rows[0].kills_completion_pct = -1.0;

        let report = Report::from_rows(rows).unwrap();
        assert_eq!(report, sample());
        assert_eq!(report.get("1001").unwrap().kills_completion_pct, 375.0);
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let mut rows = sample().to_rows();
        rows.push(rows[0].clone());
        assert!(matches!(Report::from_rows(rows), Err(ReconError::DuplicateId { .. })));
    }
}
