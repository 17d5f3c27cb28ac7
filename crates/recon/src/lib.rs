//! `kvk-recon`: reconciliation and DKP scoring engine for KvK stat snapshots.
//!
//! Pure engine crate: receives pre-loaded tables, returns reports, scores
//! and query answers. No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod query;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod store;

pub use config::{ColumnMapping, ReconConfig, ScoringWeights};
pub use engine::{reconcile, run, run_tables, ReconOutput};
pub use error::{QueryError, ReconError};
pub use model::{
    AggregateSummary, EntityRecord, Metrics, ReconSummary, ReconciledEntity, Report, Requirement,
    RequirementRecord, ScoredEntity, Source,
};
pub use query::{QueryService, DEFAULT_UNMET_THRESHOLD};
pub use report::ReportRow;
pub use schema::SourceTable;
pub use scoring::score_and_rank;
pub use store::{ReportGeneration, ReportStore};
