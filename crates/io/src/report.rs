//! Persisted report files (.csv or .xlsx), one row per reconciled entity.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Reader};
use kvk_recon::report::{Cell, COLUMNS};
use kvk_recon::{Report, ReportRow};
use rust_xlsxwriter::{Format as XlsxFormat, Workbook, XlsxError};

use crate::error::LoadError;
use crate::loader::Format;

const SHEET_NAME: &str = "Report";

/// Write the report next to `path` first, then rename it into place. A failed
/// write leaves any existing file at `path` untouched.
pub fn write_report(report: &Report, path: &Path) -> Result<(), LoadError> {
    let format = Format::from_path(path)?;
    let tmp_path = tmp_path_for(path);

    let written = match format {
        Format::Delimited => write_csv(report, &tmp_path),
        Format::Excel => write_xlsx(report, &tmp_path),
    }
    .and_then(|()| std::fs::rename(&tmp_path, path).map_err(|e| LoadError::io(path, e)));

    if let Err(e) = written {
        // Best effort; the temp file is ours and never read.
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    log::info!("wrote {} report rows to {}", report.len(), path.display());
    Ok(())
}

/// `dir/results.xlsx` → `dir/.results.xlsx.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read a report back. Derived columns in the file are ignored and recomputed.
pub fn read_report(path: &Path) -> Result<Report, LoadError> {
    std::fs::metadata(path).map_err(|e| LoadError::io(path, e))?;
    let rows = match Format::from_path(path)? {
        Format::Delimited => read_csv(path)?,
        Format::Excel => read_xlsx(path)?,
    };
    Report::from_rows(rows).map_err(|source| LoadError::Report { path: path.to_path_buf(), source })
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn write_csv(report: &Report, path: &Path) -> Result<(), LoadError> {
    let mut writer = ::csv::Writer::from_path(path).map_err(|e| csv_write_error(path, e))?;
    for row in report.to_rows() {
        writer.serialize(row).map_err(|e| csv_write_error(path, e))?;
    }
    writer.flush().map_err(|e| LoadError::io(path, e))
}

/// Disk failures surface as `Io`, not as malformed CSV.
fn csv_write_error(path: &Path, err: ::csv::Error) -> LoadError {
    if !err.is_io_error() {
        return LoadError::csv(path, err);
    }
    match err.into_kind() {
        ::csv::ErrorKind::Io(source) => LoadError::io(path, source),
        other => LoadError::io(path, std::io::Error::other(format!("{other:?}"))),
    }
}

fn read_csv(path: &Path) -> Result<Vec<ReportRow>, LoadError> {
    let content = crate::csv::read_file_as_utf8(path)?;
    let mut reader = ::csv::Reader::from_reader(content.as_bytes());
    reader
        .deserialize()
        .collect::<Result<Vec<ReportRow>, _>>()
        .map_err(|e| LoadError::csv(path, e))
}

// ---------------------------------------------------------------------------
// XLSX
// ---------------------------------------------------------------------------

fn write_xlsx(report: &Report, path: &Path) -> Result<(), LoadError> {
    let xlsx_err = |e: XlsxError| match e {
        XlsxError::IoError(source) => LoadError::io(path, source),
        other => LoadError::excel(path, other),
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(SHEET_NAME).map_err(xlsx_err)?;
    let header = XlsxFormat::new().set_bold();

    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *name, &header)
            .map_err(xlsx_err)?;
    }

    for (i, row) in report.to_rows().iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.cells().into_iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Text(s) => worksheet.write_string(r, c, s),
                Cell::Number(n) => worksheet.write_number(r, c, n),
            }
            .map_err(xlsx_err)?;
        }
    }

    worksheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;
    workbook.save(path).map_err(xlsx_err)
}

fn read_xlsx(path: &Path) -> Result<Vec<ReportRow>, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::excel(path, e))?;
    let range = workbook
        .worksheet_range(SHEET_NAME)
        .map_err(|e| LoadError::excel(path, format!("failed to read sheet '{SHEET_NAME}': {e}")))?;

    // Numbers go through `to_string`, which round-trips f64 exactly.
    let mut records = range.rows().map(|row| {
        row.iter()
            .map(|cell| match cell {
                calamine::Data::Float(n) => n.to_string(),
                calamine::Data::Int(n) => n.to_string(),
                other => other.to_string(),
            })
            .collect::<::csv::StringRecord>()
    });
    let headers = records
        .next()
        .ok_or_else(|| LoadError::NoHeader { path: path.to_path_buf() })?;

    records
        .map(|record| record.deserialize::<ReportRow>(Some(&headers)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LoadError::csv(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvk_recon::{Metrics, ReconciledEntity, Requirement};
    use tempfile::tempdir;

    fn sample() -> Report {
        let e = |id: &str, name: &str, kp: f64, deaths: f64| {
            ReconciledEntity::new(
                id.into(),
                name.into(),
                Metrics { power: 1.5e7, kill_points: 1000.0, deaths: 10.0, tier4_kills: 3.0, tier5_kills: 7.0 },
                Metrics { power: 1.4e7, kill_points: kp, deaths, tier4_kills: 13.0, tier5_kills: 7.25 },
                Requirement { required_kills: 300.0, required_deaths: 3.0 },
            )
        };
        Report::from_entities(vec![
            e("1001", "Alice", 1500.0, 12.0),
            e("1002", "", 900.1, 10.0),
            e("0042", "Ünïcode, with comma", 333.25, 11.0),
        ])
        .unwrap()
    }

    #[test]
    fn csv_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&sample(), &path).unwrap();

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("id,name,power_before,power_after,"));
        assert_eq!(read_report(&path).unwrap(), sample());
    }

    #[test]
    fn xlsx_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_report(&sample(), &path).unwrap();
        assert_eq!(read_report(&path).unwrap(), sample());
    }

    #[test]
    fn csv_without_derived_columns_still_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hand-written.csv");
        std::fs::write(
            &path,
            "id,name,power_before,power_after,kill_points_before,kill_points_after,\
             deaths_before,deaths_after,tier4_kills_before,tier4_kills_after,\
             tier5_kills_before,tier5_kills_after,required_kills,required_deaths\n\
             7,Gus,0,0,100,500,0,4,0,0,0,0,1000,8\n",
        )
        .unwrap();

        let report = read_report(&path).unwrap();
        let gus = report.get("7").unwrap();
        assert_eq!(gus.kills_change, 400.0);
        assert_eq!(gus.kills_completion_pct, 50.0);
        assert_eq!(gus.deaths_completion_pct, 50.0);
    }

    #[test]
    fn duplicate_ids_in_file_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        let mut rows = sample().to_rows();
        rows.push(rows[0].clone());
        let mut writer = ::csv::Writer::from_path(&path).unwrap();
        for row in rows {
            writer.serialize(row).unwrap();
        }
        writer.flush().unwrap();

        assert!(matches!(read_report(&path), Err(LoadError::Report { .. })));
    }

    #[test]
    fn successful_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_report(&sample(), &path).unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("results.csv")]);
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        for name in ["results.csv", "results.xlsx"] {
            let dir = tempdir().unwrap();
            let path = dir.path().join(name);
            write_report(&sample(), &path).unwrap();
            let before = std::fs::read(&path).unwrap();

            // A directory where the temp file should go makes the write fail.
            std::fs::create_dir(tmp_path_for(&path)).unwrap();
            let smaller = Report::from_entities(sample().entities()[..1].to_vec()).unwrap();
            let err = write_report(&smaller, &path).unwrap_err();
            assert!(matches!(err, LoadError::Io { .. }), "{name}: {err}");

            assert_eq!(std::fs::read(&path).unwrap(), before, "{name}");
            assert_eq!(read_report(&path).unwrap(), sample(), "{name}");
        }
    }

    #[test]
    fn temp_file_sits_next_to_target() {
        let tmp = tmp_path_for(Path::new("/data/results.xlsx"));
        assert_eq!(tmp, PathBuf::from("/data/.results.xlsx.tmp"));
    }
}
