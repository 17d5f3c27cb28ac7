// kvk - KvK reconciliation and DKP reporting from the command line

mod chat;
mod exit_codes;
mod format;
mod pipeline;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use kvk_config::{ConfigError, Settings};
use kvk_io::LoadError;
use kvk_recon::{QueryError, QueryService, ReconError, ReportStore};
use serde::Serialize;

use chat::ChatSession;
use exit_codes::{
    config_exit_code, load_exit_code, query_exit_code, recon_exit_code, EXIT_ERROR,
    EXIT_NO_REPORT, EXIT_SUCCESS, EXIT_USAGE,
};
use pipeline::RunError;

#[derive(Parser)]
#[command(name = "kvk")]
#[command(about = "Reconcile KvK snapshots, score DKP and answer player queries")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the per-user config location)
    #[arg(long, global = true, env = "KVK_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the three snapshots, write the report and print a summary
    #[command(after_help = "\
Examples:
  kvk reconcile
  kvk reconcile --before start.xlsx --after pass4.xlsx --requirements required.xlsx
  kvk reconcile --report results.csv --json")]
    Reconcile {
        #[arg(long, value_name = "PATH")]
        before: Option<PathBuf>,
        #[arg(long, value_name = "PATH")]
        after: Option<PathBuf>,
        #[arg(long, value_name = "PATH")]
        requirements: Option<PathBuf>,
        /// Where to write the report (.xlsx or .csv)
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },

    /// Statistics for one Governor ID
    Stats {
        id: String,
        #[arg(long)]
        json: bool,
    },

    /// Averages over every reconciled player
    Overview {
        #[arg(long)]
        json: bool,
    },

    /// Players below the completion threshold, in report order
    #[command(visible_alias = "req")]
    Requirements {
        /// Completion percentage a player must reach (default from settings)
        #[arg(long, value_name = "PCT")]
        threshold: Option<f64>,
        #[arg(long)]
        json: bool,
    },

    /// Highest DKP scores
    Top {
        /// How many players to list (default from settings)
        #[arg(value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        n: Option<usize>,
        #[arg(long)]
        json: bool,
    },

    /// Read chat commands from stdin and print replies
    #[command(after_help = "\
Examples:
  echo '!stats 1001' | kvk chat
  kvk chat --prefix '?'")]
    Chat {
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Write a commented settings template
    Init {
        /// Target file (defaults to --settings or the per-user location)
        path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = dispatch(cli.command, cli.settings);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings, CliError> {
    match path {
        // An explicit file must exist.
        Some(path) => Settings::load_from(&path),
        None => Settings::load_or_default(&Settings::config_path()),
    }
    .map_err(CliError::config)
}

fn dispatch(command: Commands, settings_path: Option<PathBuf>) -> Result<(), CliError> {
    match command {
        Commands::Init { path } => cmd_init(path.or(settings_path)),
        Commands::Reconcile { before, after, requirements, report, json } => {
            let mut settings = load_settings(settings_path)?;
            if let Some(p) = before {
                settings.sources.before = p;
            }
            if let Some(p) = after {
                settings.sources.after = p;
            }
            if let Some(p) = requirements {
                settings.sources.requirements = p;
            }
            if let Some(p) = report {
                settings.report.path = p;
            }
            cmd_reconcile(&settings, json)
        }
        Commands::Stats { id, json } => {
            let settings = load_settings(settings_path)?;
            let service = open(&settings)?;
            let entity = service.lookup(&id).map_err(CliError::query)?;
            if json {
                print_json(entity)
            } else {
                println!("{}", format::stats_reply(entity));
                Ok(())
            }
        }
        Commands::Overview { json } => {
            let settings = load_settings(settings_path)?;
            let service = open(&settings)?;
            let overview = service.overview().map_err(CliError::query)?;
            if json {
                print_json(&overview)
            } else {
                println!("{}", format::overview_reply(&overview));
                Ok(())
            }
        }
        Commands::Requirements { threshold, json } => {
            let settings = load_settings(settings_path)?;
            let threshold = threshold.unwrap_or(settings.report.unmet_threshold);
            if !threshold.is_finite() {
                return Err(CliError::args("--threshold must be a finite number"));
            }
            let service = open(&settings)?;
            let unmet = service.list_unmet(threshold);
            if json {
                print_json(&unmet)
            } else {
                println!("{}", format::unmet_reply(&unmet));
                Ok(())
            }
        }
        Commands::Top { n, json } => {
            let settings = load_settings(settings_path)?;
            let n = n.unwrap_or(settings.report.top_default);
            let service = open(&settings)?;
            let top = service.top(n);
            if json {
                print_json(&top)
            } else {
                println!("{}", format::top_reply(top));
                Ok(())
            }
        }
        Commands::Chat { prefix } => {
            let mut settings = load_settings(settings_path)?;
            if let Some(prefix) = prefix {
                settings.chat.prefix = prefix;
            }
            settings.validate().map_err(CliError::config)?;
            cmd_chat(settings)
        }
    }
}

fn cmd_reconcile(settings: &Settings, json: bool) -> Result<(), CliError> {
    let store = ReportStore::new();
    let outcome = pipeline::reconcile(settings, &store).map_err(CliError::run)?;

    if json {
        print_json(&serde_json::json!({
            "version": outcome.generation.version,
            "published_at": outcome.generation.published_at,
            "summary": outcome.summary,
            "report_path": settings.report.path.display().to_string(),
        }))
    } else {
        eprintln!("{}", format::summary_line(outcome.generation.version, &outcome.summary));
        eprintln!("wrote {}", settings.report.path.display());
        Ok(())
    }
}

/// Publish the persisted report into a fresh store and query it.
fn open(settings: &Settings) -> Result<QueryService, CliError> {
    let store = ReportStore::new();
    pipeline::open_report(settings, &store).map_err(CliError::run)?;
    QueryService::from_store(&store).map_err(CliError::query)
}

fn cmd_chat(settings: Settings) -> Result<(), CliError> {
    let store = Arc::new(ReportStore::new());
    start_chat_report(&settings, &store)?;

    let mut session = ChatSession::new(settings, store);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| CliError::new(EXIT_ERROR, format!("reading stdin: {e}")))?;
        let notices = session.drain_notices();
        let reply = session.handle(&line);
        for text in notices.iter().chain(reply.iter()) {
            writeln!(out, "{text}").map_err(CliError::stdout)?;
        }
        out.flush().map_err(CliError::stdout)?;
    }

    for notice in session.finish() {
        writeln!(out, "{notice}").map_err(CliError::stdout)?;
    }
    Ok(())
}

/// Reconcile the sources at startup. Without them, fall back to the persisted
/// report; without that too, start empty and wait for `reload`.
fn start_chat_report(settings: &Settings, store: &ReportStore) -> Result<(), CliError> {
    let err = match pipeline::reconcile(settings, store) {
        Ok(outcome) => {
            log::info!("{}", format::summary_line(outcome.generation.version, &outcome.summary));
            return Ok(());
        }
        Err(e) if pipeline::is_missing_source(&e) => e,
        Err(e) => return Err(CliError::run(e)),
    };

    log::warn!("{err}; serving the persisted report at {}", settings.report.path.display());
    match pipeline::open_report(settings, store) {
        Ok(generation) => {
            log::info!("serving persisted report v{}", generation.version);
            Ok(())
        }
        Err(e) if pipeline::is_missing_report(&e) => {
            log::warn!("no report at {}; waiting for reload", settings.report.path.display());
            Ok(())
        }
        Err(e) => Err(CliError::run(e)),
    }
}

fn cmd_init(path: Option<PathBuf>) -> Result<(), CliError> {
    let path = path.unwrap_or_else(Settings::config_path);
    Settings::write_default_file(&path).map_err(CliError::config)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("serializing output: {e}")))?;
    println!("{text}");
    Ok(())
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    fn stdout(err: io::Error) -> Self {
        Self::new(EXIT_ERROR, format!("writing output: {err}"))
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::AlreadyExists { .. } => Some("edit the existing file or remove it first"),
            ConfigError::Parse { .. } | ConfigError::Invalid(_) => {
                Some("run `kvk init <path>` for a commented template")
            }
            _ => None,
        };
        let cli = Self::new(config_exit_code(&err), err.to_string());
        match hint {
            Some(h) => cli.with_hint(h),
            None => cli,
        }
    }

    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("map the column under [columns] in the settings file")
            }
            ReconError::RunInProgress => Some("wait for the running reconciliation to finish"),
            _ => None,
        };
        let cli = Self::new(code, err.to_string());
        match hint {
            Some(h) => cli.with_hint(h),
            None => cli,
        }
    }

    pub fn load(err: LoadError) -> Self {
        Self::new(load_exit_code(&err), err.to_string())
    }

    pub fn query(err: QueryError) -> Self {
        let code = query_exit_code(&err);
        let cli = Self::new(code, err.to_string());
        match err {
            QueryError::NoReport => cli.with_hint("run `kvk reconcile` first"),
            _ => cli,
        }
    }

    pub fn run(err: RunError) -> Self {
        if pipeline::is_missing_report(&err) {
            return Self::new(EXIT_NO_REPORT, err.to_string())
                .with_hint("run `kvk reconcile` first");
        }
        match err {
            RunError::Load(e) => Self::load(e),
            RunError::Recon(e) => Self::recon(e),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn req_alias_and_global_settings() {
        let cli = Cli::try_parse_from(["kvk", "req", "--settings", "s.toml", "--threshold", "50"])
            .unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("s.toml")));
        assert!(matches!(
            cli.command,
            Commands::Requirements { threshold: Some(t), json: false } if t == 50.0
        ));
    }

    #[test]
    fn top_requires_a_positive_count() {
        assert!(Cli::try_parse_from(["kvk", "top", "0"]).is_err());
        let cli = Cli::try_parse_from(["kvk", "top", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Top { n: Some(3), json: false }));
    }

    #[test]
    fn missing_report_maps_to_no_report() {
        let err = RunError::Load(LoadError::Io {
            path: "results.xlsx".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        });
        let cli = CliError::run(err);
        assert_eq!(cli.code, EXIT_NO_REPORT);
        assert_eq!(cli.hint.as_deref(), Some("run `kvk reconcile` first"));
    }
}
