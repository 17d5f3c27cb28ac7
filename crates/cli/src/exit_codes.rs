//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                   |
//! |---------|------------|-----------------------------------------------|
//! | 0       | Universal  | Success                                       |
//! | 1       | Universal  | General error (unspecified)                   |
//! | 2       | Universal  | CLI usage error (bad args)                    |
//! | 3-9     | data       | Settings, file loading, dataset validation    |
//! | 10-19   | query      | Report lookups and aggregates                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError`'s constructors in main.rs

use kvk_config::ConfigError;
use kvk_io::LoadError;
use kvk_recon::{QueryError, ReconError};

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Data (3-9)
// =============================================================================

/// Settings file unreadable, unparsable or invalid.
pub const EXIT_CONFIG: u8 = 3;

/// A data file could not be read or written (missing, not CSV/Excel, ...).
pub const EXIT_LOAD: u8 = 4;

/// A dataset failed validation: empty, missing column, non-numeric metric.
pub const EXIT_INPUT: u8 = 5;

/// A persisted report is internally inconsistent (duplicate ids).
pub const EXIT_REPORT_INVALID: u8 = 6;

/// Another reconciliation run holds the writer lock.
pub const EXIT_BUSY: u8 = 7;

// =============================================================================
// Query (10-19)
// =============================================================================

/// No report exists yet (`kvk reconcile` has not been run).
pub const EXIT_NO_REPORT: u8 = 10;

/// Lookup id not present in the report.
pub const EXIT_NOT_FOUND: u8 = 11;

/// Aggregate requested over a report with no entities.
pub const EXIT_EMPTY_REPORT: u8 = 12;

// =============================================================================
// Error mapping
// =============================================================================

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::EmptyDataset { .. }
        | ReconError::MissingColumn { .. }
        | ReconError::InvalidNumber { .. } => EXIT_INPUT,
        ReconError::DuplicateId { .. } => EXIT_REPORT_INVALID,
        ReconError::InvalidWeights(_) | ReconError::InvalidConfig(_) => EXIT_CONFIG,
        ReconError::RunInProgress => EXIT_BUSY,
    }
}

pub fn query_exit_code(err: &QueryError) -> u8 {
    match err {
        QueryError::NoReport => EXIT_NO_REPORT,
        QueryError::NotFound { .. } => EXIT_NOT_FOUND,
        QueryError::EmptyPopulation => EXIT_EMPTY_REPORT,
    }
}

pub fn load_exit_code(err: &LoadError) -> u8 {
    match err {
        LoadError::Report { source, .. } => recon_exit_code(source),
        LoadError::Dataset { source, .. } => load_exit_code(source),
        _ => EXIT_LOAD,
    }
}

pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_CONFIG
}
