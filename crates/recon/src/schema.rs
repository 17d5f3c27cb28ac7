//! Load-boundary validation: untyped tables in, typed records out.
//!
//! Everything downstream of this module works on `EntityRecord` /
//! `RequirementRecord` only.

use crate::config::ColumnMapping;
use crate::error::ReconError;
use crate::model::{EntityRecord, Metrics, Requirement, RequirementRecord, Source};

/// A header row plus string cells, as produced by a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub source: Source,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Header names are trimmed; rows with no non-blank cell are dropped.
    pub fn new(source: Source, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();
        Self { source, headers, rows }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, ReconError> {
        self.column(name).ok_or_else(|| ReconError::MissingColumn {
            dataset: self.source,
            column: name.into(),
        })
    }

    fn ensure_not_empty(&self) -> Result<(), ReconError> {
        if self.rows.is_empty() {
            return Err(ReconError::EmptyDataset { dataset: self.source });
        }
        Ok(())
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

/// Blank reads as 0; anything else must be a finite number.
fn number(table: &SourceTable, row_idx: usize, column: &str, raw: &str) -> Result<f64, ReconError> {
    if raw.is_empty() {
        return Ok(0.0);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ReconError::InvalidNumber {
            dataset: table.source,
            row: row_idx + 2,
            column: column.into(),
            value: raw.into(),
        }),
    }
}

/// Validate a before/after snapshot table and convert it to records.
pub fn parse_snapshot(
    table: &SourceTable,
    columns: &ColumnMapping,
) -> Result<Vec<EntityRecord>, ReconError> {
    let id_idx = table.require(&columns.id)?;
    let name_idx = table.column(&columns.name);
    let metric_idx = [
        (table.require(&columns.power)?, columns.power.as_str()),
        (table.require(&columns.kill_points)?, columns.kill_points.as_str()),
        (table.require(&columns.deaths)?, columns.deaths.as_str()),
        (table.require(&columns.tier4_kills)?, columns.tier4_kills.as_str()),
        (table.require(&columns.tier5_kills)?, columns.tier5_kills.as_str()),
    ];
    table.ensure_not_empty()?;

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let mut values = [0.0; 5];
        for (slot, (idx, column)) in values.iter_mut().zip(metric_idx.iter()) {
            *slot = number(table, row_idx, column, cell(row, *idx))?;
        }
        let [power, kill_points, deaths, tier4_kills, tier5_kills] = values;

        records.push(EntityRecord {
            id: cell(row, id_idx).to_string(),
            name: name_idx.map(|i| cell(row, i).to_string()).unwrap_or_default(),
            metrics: Metrics {
                power,
                kill_points,
                deaths,
                tier4_kills,
                tier5_kills,
            },
        });
    }

    log::debug!("{} dataset: {} rows validated", table.source, records.len());
    Ok(records)
}

/// Validate the requirements table and convert it to records.
pub fn parse_requirements(
    table: &SourceTable,
    columns: &ColumnMapping,
) -> Result<Vec<RequirementRecord>, ReconError> {
    let id_idx = table.require(&columns.id)?;
    let kills_idx = table.require(&columns.required_kills)?;
    let deaths_idx = table.require(&columns.required_deaths)?;
    table.ensure_not_empty()?;

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        records.push(RequirementRecord {
            id: cell(row, id_idx).to_string(),
            requirement: Requirement {
                required_kills: number(table, row_idx, &columns.required_kills, cell(row, kills_idx))?,
                required_deaths: number(table, row_idx, &columns.required_deaths, cell(row, deaths_idx))?,
            },
        });
    }

    log::debug!("{} dataset: {} rows validated", table.source, records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn snapshot_headers() -> Vec<String> {
        strings(&[
            " Governor ID ",
            "Governor Name",
            "Power",
            "Kill Points",
            "Deads",
            "Tier 4 Kills",
            "Tier 5 Kills",
        ])
    }

    #[test]
    fn parse_snapshot_trims_headers_and_keys() {
        let table = SourceTable::new(
            Source::Before,
            snapshot_headers(),
            vec![strings(&[" 1001 ", "Alice", "5000000", "1000", "10", "20", "30"])],
        );
        let records = parse_snapshot(&table, &ColumnMapping::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "1001");
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].metrics.kill_points, 1000.0);
        assert_eq!(records[0].metrics.tier5_kills, 30.0);
    }

    #[test]
    fn blank_key_and_blank_metric() {
        let table = SourceTable::new(
            Source::After,
            snapshot_headers(),
            vec![strings(&["", "Nobody", "", "1", "2", "3", "4"])],
        );
        let records = parse_snapshot(&table, &ColumnMapping::default()).unwrap();
        assert_eq!(records[0].id, "");
        assert_eq!(records[0].metrics.power, 0.0);
    }

    #[test]
    fn short_row_reads_missing_cells_as_blank() {
        let table = SourceTable::new(
            Source::After,
            snapshot_headers(),
            vec![strings(&["7", "Bob", "100"])],
        );
        let records = parse_snapshot(&table, &ColumnMapping::default()).unwrap();
        assert_eq!(records[0].metrics.tier5_kills, 0.0);
    }

    #[test]
    fn missing_metric_column_names_source_and_field() {
        let mut headers = snapshot_headers();
        headers.retain(|h| h != "Deads");
        let table = SourceTable::new(Source::After, headers, vec![strings(&["1", "A", "1", "1", "1", "1"])]);
        let err = parse_snapshot(&table, &ColumnMapping::default()).unwrap_err();
        match err {
            ReconError::MissingColumn { dataset, column } => {
                assert_eq!(dataset, Source::After);
                assert_eq!(column, "Deads");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_name_column_is_allowed() {
        let mut headers = snapshot_headers();
        headers.retain(|h| h != "Governor Name");
        let table = SourceTable::new(Source::Before, headers, vec![strings(&["1", "1", "1", "1", "1", "1"])]);
        let records = parse_snapshot(&table, &ColumnMapping::default()).unwrap();
        assert_eq!(records[0].name, "");
    }

    #[test]
    fn empty_dataset_after_dropping_blank_rows() {
        let table = SourceTable::new(
            Source::Before,
            snapshot_headers(),
            vec![strings(&["", " ", "", "", "", "", ""])],
        );
        let err = parse_snapshot(&table, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, ReconError::EmptyDataset { dataset: Source::Before }));
    }

    #[test]
    fn invalid_number_reports_sheet_row() {
        let table = SourceTable::new(
            Source::Before,
            snapshot_headers(),
            vec![
                strings(&["1", "A", "1", "1", "1", "1", "1"]),
                strings(&["2", "B", "1", "lots", "1", "1", "1"]),
            ],
        );
        let err = parse_snapshot(&table, &ColumnMapping::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "before dataset, row 3: cannot parse 'lots' in column 'Kill Points' as a number"
        );
    }

    #[test]
    fn non_finite_number_is_rejected() {
        let table = SourceTable::new(
            Source::Requirements,
            strings(&["Governor ID", "Required Kills", "Required Deaths"]),
            vec![strings(&["1", "NaN", "5"])],
        );
        assert!(parse_requirements(&table, &ColumnMapping::default()).is_err());
    }

    #[test]
    fn parse_requirements_basic() {
        let table = SourceTable::new(
            Source::Requirements,
            strings(&["Governor ID", "Required Kills", "Required Deaths"]),
            vec![strings(&["1", "400", "5"]), strings(&["2", "0", ""])],
        );
        let records = parse_requirements(&table, &ColumnMapping::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].requirement.required_kills, 400.0);
        assert_eq!(records[1].requirement.required_deaths, 0.0);
    }

    #[test]
    fn requirements_missing_key_column() {
        let table = SourceTable::new(
            Source::Requirements,
            strings(&["ID", "Required Kills", "Required Deaths"]),
            vec![strings(&["1", "400", "5"])],
        );
        let err = parse_requirements(&table, &ColumnMapping::default()).unwrap_err();
        assert_eq!(err.to_string(), "requirements dataset: missing column 'Governor ID'");
    }
}
