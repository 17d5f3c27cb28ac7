use std::collections::HashMap;

use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which of the three input datasets a record or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Before,
    After,
    Requirements,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
            Self::Requirements => write!(f, "requirements"),
        }
    }
}

/// The fixed metric set carried by every snapshot row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Metrics {
    pub power: f64,
    pub kill_points: f64,
    pub deaths: f64,
    pub tier4_kills: f64,
    pub tier5_kills: f64,
}

impl Metrics {
    /// Field-wise `self - earlier`. Negative results are kept as-is.
    pub fn since(&self, earlier: &Metrics) -> Metrics {
        Metrics {
            power: self.power - earlier.power,
            kill_points: self.kill_points - earlier.kill_points,
            deaths: self.deaths - earlier.deaths,
            tier4_kills: self.tier4_kills - earlier.tier4_kills,
            tier5_kills: self.tier5_kills - earlier.tier5_kills,
        }
    }
}

/// One validated snapshot row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub metrics: Metrics,
}

/// One validated requirements row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Requirement {
    pub required_kills: f64,
    pub required_deaths: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequirementRecord {
    pub id: String,
    pub requirement: Requirement,
}

// ---------------------------------------------------------------------------
// Reconciled report
// ---------------------------------------------------------------------------

/// `value / required * 100`, with 0 as the sentinel when `required` is 0.
pub fn completion_pct(value: f64, required: f64) -> f64 {
    if required == 0.0 {
        0.0
    } else {
        value / required * 100.0
    }
}

/// Completion measured on a delta. Zero or negative progress reads as 0%.
pub fn progress_pct(change: f64, required: f64) -> f64 {
    if change > 0.0 {
        completion_pct(change, required)
    } else {
        0.0
    }
}

/// An entity present in all three inputs, with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledEntity {
    pub id: String,
    pub name: String,
    pub before: Metrics,
    pub after: Metrics,
    pub requirement: Requirement,
    pub power_change: f64,
    pub kills_change: f64,
    pub deads_change: f64,
    pub tier4_kills_change: f64,
    pub tier5_kills_change: f64,
    pub kills_completion_pct: f64,
    pub deaths_completion_pct: f64,
}

impl ReconciledEntity {
    /// Derive deltas first, then completion percentages against the
    /// after-snapshot values.
    pub fn new(
        id: String,
        name: String,
        before: Metrics,
        after: Metrics,
        requirement: Requirement,
    ) -> Self {
        let delta = after.since(&before);
        Self {
            id,
            name,
            before,
            after,
            requirement,
            power_change: delta.power,
            kills_change: delta.kill_points,
            deads_change: delta.deaths,
            tier4_kills_change: delta.tier4_kills,
            tier5_kills_change: delta.tier5_kills,
            kills_completion_pct: completion_pct(after.kill_points, requirement.required_kills),
            deaths_completion_pct: completion_pct(after.deaths, requirement.required_deaths),
        }
    }

    /// Tier 4 plus tier 5 kills gained between the snapshots.
    pub fn total_kills_change(&self) -> f64 {
        self.tier4_kills_change + self.tier5_kills_change
    }

    /// True when either report completion percentage is below `threshold_pct`.
    pub fn is_below(&self, threshold_pct: f64) -> bool {
        self.kills_completion_pct < threshold_pct || self.deaths_completion_pct < threshold_pct
    }
}

/// The derived artifact of one reconciliation run. Order is the order of the
/// baseline snapshot; ids are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    entities: Vec<ReconciledEntity>,
    index: HashMap<String, usize>,
}

impl Report {
    pub fn from_entities(entities: Vec<ReconciledEntity>) -> Result<Self, ReconError> {
        let mut index = HashMap::with_capacity(entities.len());
        for (i, entity) in entities.iter().enumerate() {
            if index.insert(entity.id.clone(), i).is_some() {
                return Err(ReconError::DuplicateId { id: entity.id.clone() });
            }
        }
        Ok(Self { entities, index })
    }

    pub fn get(&self, id: &str) -> Option<&ReconciledEntity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn entities(&self) -> &[ReconciledEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Counts describing how a run's join went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub before_rows: usize,
    pub after_rows: usize,
    pub requirement_rows: usize,
    pub reconciled: usize,
    /// Baseline ids missing from the after snapshot or the requirements.
    pub excluded: usize,
    /// Rows dropped because their id already appeared in the same dataset.
    pub duplicates: usize,
}

// ---------------------------------------------------------------------------
// Scoring + queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntity {
    #[serde(flatten)]
    pub entity: ReconciledEntity,
    pub dkp_score: f64,
    /// 1-based "min" rank: `1 + number of entities with a strictly higher score`.
    pub rank: usize,
    pub kill_progress_pct: f64,
    pub death_progress_pct: f64,
}

/// Population-wide means over one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub entities: usize,
    pub avg_kills_change: f64,
    pub avg_deads_change: f64,
    pub avg_kills_completion_pct: f64,
    pub avg_deaths_completion_pct: f64,
    pub avg_dkp_score: f64,
    pub total_dkp_score: f64,
}
