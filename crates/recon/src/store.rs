//! Published report generations.
//!
//! One writer at a time builds a complete generation off to the side, then
//! swaps it in. Readers clone the `Arc` and keep reading the generation they
//! started with even if a newer one is published meanwhile.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::config::ScoringWeights;
use crate::error::ReconError;
use crate::model::{Report, ScoredEntity};
use crate::scoring::score_and_rank;

/// An immutable, scored report.
#[derive(Debug)]
pub struct ReportGeneration {
    pub version: u64,
    pub published_at: DateTime<Utc>,
    pub weights: ScoringWeights,
    report: Report,
    /// Rank order.
    scored: Vec<ScoredEntity>,
    by_id: HashMap<String, usize>,
}

impl ReportGeneration {
    pub fn build(version: u64, report: Report, weights: ScoringWeights) -> Self {
        let scored = score_and_rank(&report, &weights);
        let by_id = scored
            .iter()
            .enumerate()
            .map(|(i, s)| (s.entity.id.clone(), i))
            .collect();
        Self {
            version,
            published_at: Utc::now(),
            weights,
            report,
            scored,
            by_id,
        }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Scored entities, best rank first.
    pub fn ranked(&self) -> &[ScoredEntity] {
        &self.scored
    }

    pub fn get(&self, id: &str) -> Option<&ScoredEntity> {
        self.by_id.get(id).map(|&i| &self.scored[i])
    }

    /// Scored entities in report order.
    pub fn in_report_order(&self) -> impl Iterator<Item = &ScoredEntity> + '_ {
        self.report.entities().iter().filter_map(|e| self.get(&e.id))
    }
}

/// Holder of the current generation.
#[derive(Debug, Default)]
pub struct ReportStore {
    current: RwLock<Option<Arc<ReportGeneration>>>,
    /// Writer lock; guards the last published version number.
    writer: Mutex<u64>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The generation a query should bind to, if any has been published.
    pub fn current(&self) -> Option<Arc<ReportGeneration>> {
        self.current.read().clone()
    }

    /// Score `report` and publish it as the next generation.
    pub fn publish(
        &self,
        report: Report,
        weights: ScoringWeights,
    ) -> Result<Arc<ReportGeneration>, ReconError> {
        self.refresh(weights, || Ok::<_, ReconError>(report))
    }

    /// Run `build` under the writer lock and publish its report.
    ///
    /// Fails with `RunInProgress` if another writer is active. If `build`
    /// fails nothing is published and the current generation stays.
    pub fn refresh<E, F>(&self, weights: ScoringWeights, build: F) -> Result<Arc<ReportGeneration>, E>
    where
        E: From<ReconError>,
        F: FnOnce() -> Result<Report, E>,
    {
        let mut last_version = self.writer.try_lock().ok_or(ReconError::RunInProgress)?;
        weights.validate()?;

        let report = build()?;
        let generation = Arc::new(ReportGeneration::build(*last_version + 1, report, weights));

        *self.current.write() = Some(Arc::clone(&generation));
        *last_version = generation.version;

        log::debug!(
            "published report generation {} ({} entities)",
            generation.version,
            generation.report.len()
        );
        Ok(generation)
    }
}
