// Excel import (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::LoadError;
use crate::RawTable;

/// Read the first worksheet; its first row is the header.
pub fn read_table(path: &Path) -> Result<RawTable, LoadError> {
    let range = first_sheet(path)?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows
        .next()
        .ok_or_else(|| LoadError::NoHeader { path: path.to_path_buf() })?;

    Ok(RawTable { headers, rows: rows.collect() })
}

fn first_sheet(path: &Path) -> Result<Range<Data>, LoadError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| LoadError::excel(path, format!("failed to open workbook: {e}")))?;

    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::NoSheets { path: path.to_path_buf() })?;

    log::debug!("{}: reading sheet '{name}'", path.display());
    workbook
        .worksheet_range(&name)
        .map_err(|e| LoadError::excel(path, format!("failed to read sheet '{name}': {e}")))
}

/// Render a cell the way the stats export shows it.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        // Integers without decimals; IDs and counts arrive as floats
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => n.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => dt.as_f64().to_string(),
    }
}
