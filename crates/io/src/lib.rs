// File I/O: snapshot tables in, reports in and out

pub mod csv;
pub mod error;
pub mod loader;
pub mod report;
pub mod xlsx;

pub use error::LoadError;
pub use loader::{load_table, Format};
pub use report::{read_report, write_report};

/// Header row plus string cells, before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
