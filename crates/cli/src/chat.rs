//! Line-oriented chat adapter: `!stats 1001` in, reply text out.
//!
//! Queries bind to whatever generation is current when the command arrives.
//! `reload` runs on a background thread; its outcome is queued as a notice
//! and handed out with the next reply.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use kvk_config::Settings;
use kvk_recon::{QueryError, QueryService, ReconError, ReportStore};
use thiserror::Error;

use crate::format;
use crate::pipeline::{self, RunError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats(String),
    Overview,
    Requirements,
    Top(Option<usize>),
    Reload,
    Help,
}

/// Lines that start with the prefix but are not a valid command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Usage: {0}")]
    Usage(String),

    #[error("Unknown command `{0}`.")]
    Unknown(String),
}

impl Command {
    /// `None` when the line is not addressed to the bot at all.
    pub fn parse(line: &str, prefix: &str) -> Option<Result<Self, ParseError>> {
        let body = line.trim().strip_prefix(prefix)?;
        let mut words = body.split_whitespace();
        let name = words.next()?.to_lowercase();
        let args: Vec<&str> = words.collect();

        let usage = |form: &str| Err(ParseError::Usage(format!("{prefix}{form}")));

        Some(match (name.as_str(), args.as_slice()) {
            ("stats", [id]) => Ok(Self::Stats((*id).to_string())),
            ("stats", _) => usage("stats <Governor ID>"),
            ("overview", []) => Ok(Self::Overview),
            ("requirements" | "req", []) => Ok(Self::Requirements),
            ("help" | "commands", _) => Ok(Self::Help),
            ("reload", []) => Ok(Self::Reload),
            ("top", []) => Ok(Self::Top(None)),
            ("top", [n]) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Self::Top(Some(n))),
                _ => usage("top [n], where n is a positive number"),
            },
            ("top", _) => usage("top [n]"),
            ("overview" | "requirements" | "req" | "reload", _) => usage(name.as_str()),
            _ => Err(ParseError::Unknown(format!("{prefix}{name}"))),
        })
    }
}

pub struct ChatSession {
    settings: Arc<Settings>,
    store: Arc<ReportStore>,
    reload: Option<JoinHandle<()>>,
    notices_tx: Sender<String>,
    notices_rx: Receiver<String>,
}

impl ChatSession {
    pub fn new(settings: Settings, store: Arc<ReportStore>) -> Self {
        let (notices_tx, notices_rx) = mpsc::channel();
        Self {
            settings: Arc::new(settings),
            store,
            reload: None,
            notices_tx,
            notices_rx,
        }
    }

    fn prefix(&self) -> &str {
        &self.settings.chat.prefix
    }

    /// Reply to one input line, or `None` if the line is not a command.
    pub fn handle(&mut self, line: &str) -> Option<String> {
        let reply = match Command::parse(line, self.prefix())? {
            Ok(command) => self.run(command),
            Err(ParseError::Unknown(name)) => format!(
                "Unknown command `{name}`. Type {}help for the list.",
                self.prefix()
            ),
            Err(err) => err.to_string(),
        };
        Some(reply)
    }

    fn query(&self, f: impl FnOnce(&QueryService) -> Result<String, QueryError>) -> String {
        QueryService::from_store(&self.store)
            .and_then(|q| f(&q))
            .unwrap_or_else(|e| format::query_error_reply(&e, self.prefix()))
    }

    fn run(&mut self, command: Command) -> String {
        match command {
            Command::Stats(id) => self.query(|q| q.lookup(&id).map(format::stats_reply)),
            Command::Overview => self.query(|q| q.overview().map(|o| format::overview_reply(&o))),
            Command::Requirements => {
                let threshold = self.settings.report.unmet_threshold;
                self.query(|q| Ok(format::unmet_reply(&q.list_unmet(threshold))))
            }
            Command::Top(n) => {
                let n = n.unwrap_or(self.settings.report.top_default);
                self.query(|q| Ok(format::top_reply(q.top(n))))
            }
            Command::Help => format::help_reply(self.prefix()),
            Command::Reload => self.start_reload(),
        }
    }

    fn start_reload(&mut self) -> String {
        if self.reload.as_ref().is_some_and(|h| !h.is_finished()) {
            return "⏳ A reload is already running.".to_string();
        }

        let settings = Arc::clone(&self.settings);
        let store = Arc::clone(&self.store);
        let tx = self.notices_tx.clone();

        self.reload = Some(std::thread::spawn(move || {
            let notice = match pipeline::reconcile(&settings, &store) {
                Ok(outcome) => format!(
                    "✅ Reload finished: {}",
                    format::summary_line(outcome.generation.version, &outcome.summary)
                ),
                Err(RunError::Recon(ReconError::RunInProgress)) => {
                    "⏳ A reload is already running.".to_string()
                }
                Err(e) => {
                    log::error!("reload failed: {e}");
                    format!("❌ Reload failed: {e}. The previous report stays active.")
                }
            };
            // The session may be gone by now; nothing to report to then.
            let _ = tx.send(notice);
        }));

        "🔄 Reloading the report from the source files...".to_string()
    }

    /// Notices from reloads that have finished since the last call.
    pub fn drain_notices(&self) -> Vec<String> {
        self.notices_rx.try_iter().collect()
    }

    /// Wait for a running reload, then return every pending notice.
    pub fn finish(&mut self) -> Vec<String> {
        if let Some(handle) = self.reload.take() {
            if handle.join().is_err() {
                log::error!("reload thread panicked");
            }
        }
        self.drain_notices()
    }
}
