//! Load → reconcile → publish, shared by `kvk reconcile` and the chat `reload`.

use std::sync::Arc;

use kvk_config::Settings;
use kvk_io::{load_table, read_report, write_report, LoadError};
use kvk_recon::{run_tables, ReconError, ReconSummary, ReportGeneration, ReportStore, Source};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Recon(#[from] ReconError),
}

/// Result of a successful reconciliation run.
#[derive(Debug)]
pub struct RunOutcome {
    pub generation: Arc<ReportGeneration>,
    pub summary: ReconSummary,
}

/// Reconcile the configured sources and publish the result.
///
/// The report file is written before the swap, so a failed write leaves the
/// previous generation active.
pub fn reconcile(settings: &Settings, store: &ReportStore) -> Result<RunOutcome, RunError> {
    let config = settings.recon_config();
    let mut summary = None;

    let generation = store.refresh(settings.scoring, || {
        let before = load_table(&settings.sources.before, Source::Before)?;
        let after = load_table(&settings.sources.after, Source::After)?;
        let requirements = load_table(&settings.sources.requirements, Source::Requirements)?;

        let out = run_tables(&before, &after, &requirements, &config)?;
        write_report(&out.report, &settings.report.path)?;

        summary = Some(out.summary);
        Ok::<_, RunError>(out.report)
    })?;

    Ok(RunOutcome {
        generation,
        summary: summary.unwrap_or_default(),
    })
}

/// Publish the persisted report, scoring it with the configured weights.
pub fn open_report(settings: &Settings, store: &ReportStore) -> Result<Arc<ReportGeneration>, RunError> {
    store.refresh(settings.scoring, || {
        Ok::<_, RunError>(read_report(&settings.report.path)?)
    })
}

/// True when the report file simply does not exist yet.
pub fn is_missing_report(err: &RunError) -> bool {
    matches!(err, RunError::Load(e) if is_not_found(e))
}

/// True when one of the three source files does not exist.
pub fn is_missing_source(err: &RunError) -> bool {
    matches!(err, RunError::Load(LoadError::Dataset { source, .. }) if is_not_found(source))
}

fn is_not_found(err: &LoadError) -> bool {
    matches!(err, LoadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_sources(dir: &std::path::Path) -> Settings {
        fs::write(
            dir.join("before.csv"),
            "Governor ID,Governor Name,Power,Kill Points,Deads,Tier 4 Kills,Tier 5 Kills\n\
             1,A,100,10,1,1,1\n2,B,100,10,1,1,1\n",
        )
        .unwrap();
        fs::write(
            dir.join("after.csv"),
            "Governor ID,Governor Name,Power,Kill Points,Deads,Tier 4 Kills,Tier 5 Kills\n\
             1,A,90,30,3,2,3\n2,B,100,10,1,1,1\n",
        )
        .unwrap();
        fs::write(
            dir.join("req.csv"),
            "Governor ID,Required Kills,Required Deaths\n1,20,2\n2,20,2\n",
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.sources.before = dir.join("before.csv");
        settings.sources.after = dir.join("after.csv");
        settings.sources.requirements = dir.join("req.csv");
        settings.report.path = dir.join("results.csv");
        settings
    }

    #[test]
    fn reconcile_publishes_and_persists() {
        let dir = tempdir().unwrap();
        let settings = write_sources(dir.path());
        let store = ReportStore::new();

        let outcome = reconcile(&settings, &store).unwrap();
        assert_eq!(outcome.generation.version, 1);
        assert_eq!(outcome.summary.reconciled, 2);
        assert!(settings.report.path.exists());

        // A fresh process sees the same report through the file.
        let other = ReportStore::new();
        let reopened = open_report(&settings, &other).unwrap();
        assert_eq!(reopened.report(), outcome.generation.report());
    }

    #[test]
    fn failed_load_keeps_previous_generation() {
        let dir = tempdir().unwrap();
        let mut settings = write_sources(dir.path());
        let store = ReportStore::new();
        reconcile(&settings, &store).unwrap();

        settings.sources.after = dir.path().join("missing.csv");
        let err = reconcile(&settings, &store).unwrap_err();
        assert!(err.to_string().starts_with("after dataset:"));
        assert_eq!(store.current().unwrap().version, 1);
    }

    #[test]
    fn missing_report_is_recognised() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.report.path = dir.path().join("none.xlsx");
        let err = open_report(&settings, &ReportStore::new()).unwrap_err();
        assert!(is_missing_report(&err));
        assert!(!is_missing_source(&err));
    }

    #[test]
    fn missing_source_is_recognised() {
        let dir = tempdir().unwrap();
        let mut settings = write_sources(dir.path());
        settings.sources.requirements = dir.path().join("gone.csv");
        let err = reconcile(&settings, &ReportStore::new()).unwrap_err();
        assert!(is_missing_source(&err));
        assert!(!is_missing_report(&err));

        // A present but broken source is not "missing".
        fs::write(dir.path().join("gone.csv"), "Governor ID\n1\n").unwrap();
        let err = reconcile(&settings, &ReportStore::new()).unwrap_err();
        assert!(!is_missing_source(&err));
    }
}
