//! Snapshot loading: pick a reader by extension, hand back a `SourceTable`.

use std::path::Path;

use kvk_recon::{Source, SourceTable};

use crate::error::LoadError;

/// File families the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Delimited,
    Excel,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(Self::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Excel),
            _ => Err(LoadError::UnsupportedFormat { path: path.to_path_buf(), extension }),
        }
    }
}

/// Load one dataset. Errors name the dataset they came from.
pub fn load_table(path: &Path, dataset: Source) -> Result<SourceTable, LoadError> {
    let wrap = |e: LoadError| LoadError::Dataset { dataset, source: Box::new(e) };

    let format = Format::from_path(path).map_err(wrap)?;
    std::fs::metadata(path).map_err(|e| wrap(LoadError::io(path, e)))?;

    let raw = match format {
        Format::Delimited => crate::csv::read_table(path),
        Format::Excel => crate::xlsx::read_table(path),
    }
    .map_err(wrap)?;

    let table = SourceTable::new(dataset, raw.headers, raw.rows);
    log::info!(
        "loaded {dataset} dataset from {} ({} rows)",
        path.display(),
        table.rows.len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn format_by_extension() {
        assert_eq!(Format::from_path(Path::new("a.CSV")).unwrap(), Format::Delimited);
        assert_eq!(Format::from_path(Path::new("a.ods")).unwrap(), Format::Excel);
        let err = Format::from_path(Path::new("a.json")).unwrap_err();
        assert!(err.to_string().contains("'json'"));
    }

    #[test]
    fn load_table_drops_blank_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("req.csv");
        fs::write(&path, "Governor ID,Required Kills\n1,400\n,\n2,0\n").unwrap();

        let table = load_table(&path, Source::Requirements).unwrap();
        assert_eq!(table.source, Source::Requirements);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn missing_file_names_the_dataset() {
        let dir = tempdir().unwrap();
        let err = load_table(&dir.path().join("nope.csv"), Source::After).unwrap_err();
        assert!(err.to_string().starts_with("after dataset: cannot access"));
    }
}
