//! Read-only queries over one published generation.
//!
//! A `QueryService` binds to a single generation for its whole life, so a
//! multi-step query never mixes two reports.

use std::sync::Arc;

use crate::error::QueryError;
use crate::model::{AggregateSummary, ScoredEntity};
use crate::store::{ReportGeneration, ReportStore};

/// Completion threshold used when a caller does not name one.
pub const DEFAULT_UNMET_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct QueryService {
    generation: Arc<ReportGeneration>,
}

impl QueryService {
    pub fn new(generation: Arc<ReportGeneration>) -> Self {
        Self { generation }
    }

    /// Bind to whatever the store currently publishes.
    pub fn from_store(store: &ReportStore) -> Result<Self, QueryError> {
        store.current().map(Self::new).ok_or(QueryError::NoReport)
    }

    pub fn generation(&self) -> &ReportGeneration {
        &self.generation
    }

    /// Look up one entity by id. Surrounding whitespace is ignored; case is not.
    pub fn lookup(&self, id: &str) -> Result<&ScoredEntity, QueryError> {
        let id = id.trim();
        self.generation
            .get(id)
            .ok_or_else(|| QueryError::NotFound { id: id.to_string() })
    }

    /// Arithmetic means over every reconciled entity.
    pub fn overview(&self) -> Result<AggregateSummary, QueryError> {
        let ranked = self.generation.ranked();
        if ranked.is_empty() {
            return Err(QueryError::EmptyPopulation);
        }

        let n = ranked.len() as f64;
        let mean = |f: fn(&ScoredEntity) -> f64| ranked.iter().map(f).sum::<f64>() / n;
        let total_dkp_score: f64 = ranked.iter().map(|s| s.dkp_score).sum();

        Ok(AggregateSummary {
            entities: ranked.len(),
            avg_kills_change: mean(|s| s.entity.kills_change),
            avg_deads_change: mean(|s| s.entity.deads_change),
            avg_kills_completion_pct: mean(|s| s.entity.kills_completion_pct),
            avg_deaths_completion_pct: mean(|s| s.entity.deaths_completion_pct),
            avg_dkp_score: total_dkp_score / n,
            total_dkp_score,
        })
    }

    /// Entities whose kills or deaths completion is strictly below
    /// `threshold_pct`, in report order.
    pub fn list_unmet(&self, threshold_pct: f64) -> Vec<&ScoredEntity> {
        self.generation
            .in_report_order()
            .filter(|s| s.entity.is_below(threshold_pct))
            .collect()
    }

    /// The first `n` entities by rank. Ties at the cut keep id order.
    pub fn top(&self, n: usize) -> &[ScoredEntity] {
        let ranked = self.generation.ranked();
        &ranked[..n.min(ranked.len())]
    }
}
