use thiserror::Error;

use crate::model::Source;

/// Failures of a reconciliation run or a report load.
///
/// Any of these aborts the run; the previously published generation stays
/// active.
#[derive(Debug, Error)]
pub enum ReconError {
    /// Dataset has no data rows.
    #[error("{dataset} dataset is empty")]
    EmptyDataset { dataset: Source },

    /// Required column (key or metric) is absent from the header row.
    #[error("{dataset} dataset: missing column '{column}'")]
    MissingColumn { dataset: Source, column: String },

    /// Metric cell that is not a finite number. `row` is the 1-based sheet
    /// row, header included.
    #[error("{dataset} dataset, row {row}: cannot parse '{value}' in column '{column}' as a number")]
    InvalidNumber {
        dataset: Source,
        row: usize,
        column: String,
        value: String,
    },

    /// Same id appears twice in a persisted report.
    #[error("report contains id '{id}' more than once")]
    DuplicateId { id: String },

    #[error("invalid scoring weights: {0}")]
    InvalidWeights(String),

    /// Unparsable TOML or a value that fails validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Another reconciliation run holds the writer lock.
    #[error("a reconciliation run is already in progress")]
    RunInProgress,
}

/// Recoverable outcomes of a query. None of these mean the report is broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Nothing has been published yet.
    #[error("no report has been published")]
    NoReport,

    #[error("no entity with id '{id}'")]
    NotFound { id: String },

    /// Aggregates requested over zero reconciled entities.
    #[error("report has no entities")]
    EmptyPopulation,
}
