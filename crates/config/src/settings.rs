// Application settings
// Loaded from ~/.config/kvk/settings.toml

use std::fs;
use std::path::{Path, PathBuf};

use kvk_recon::{ColumnMapping, ReconConfig, ScoringWeights, DEFAULT_UNMET_THRESHOLD};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where the three input datasets live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    pub before: PathBuf,
    pub after: PathBuf,
    pub requirements: PathBuf,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            before: PathBuf::from("start_kvk.xlsx"),
            after: PathBuf::from("pass4.xlsx"),
            requirements: PathBuf::from("required.xlsx"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Persisted report (.xlsx or .csv). Queries read it when no run has
    /// happened in this process.
    pub path: PathBuf,

    /// Completion percentage below which an entity is listed as unmet.
    pub unmet_threshold: f64,

    /// Rows shown by `top` when no count is given.
    pub top_default: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("results.xlsx"),
            unmet_threshold: DEFAULT_UNMET_THRESHOLD,
            top_default: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Leading marker of a command line, e.g. `!stats 1001`.
    pub prefix: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { prefix: "!".into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sources: SourcePaths,
    pub report: ReportSettings,
    pub columns: ColumnMapping,
    pub scoring: ScoringWeights,
    pub chat: ChatSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kvk")
            .join("settings.toml")
    }

    /// Parse only. Relative paths are left as written.
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Load settings from `path`, resolving relative data paths against the
    /// file's directory.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;

        if let Some(dir) = path.parent() {
            settings.resolve_relative_to(dir);
        }
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Like [`Settings::load_from`], but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            log::info!("no settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Write a commented settings file with every default spelled out.
    /// Refuses to overwrite an existing file.
    pub fn write_default_file(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists { path: path.to_path_buf() });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, DEFAULT_SETTINGS).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.recon_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.chat.prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("chat.prefix must not be empty".into()));
        }
        if self.report.top_default == 0 {
            return Err(ConfigError::Invalid("report.top_default must be at least 1".into()));
        }
        if !self.report.unmet_threshold.is_finite() {
            return Err(ConfigError::Invalid("report.unmet_threshold must be a number".into()));
        }
        Ok(())
    }

    /// The engine-facing subset.
    pub fn recon_config(&self) -> ReconConfig {
        ReconConfig {
            columns: self.columns.clone(),
            scoring: self.scoring,
        }
    }

    fn resolve_relative_to(&mut self, dir: &Path) {
        for path in [
            &mut self.sources.before,
            &mut self.sources.after,
            &mut self.sources.requirements,
            &mut self.report.path,
        ] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}

const DEFAULT_SETTINGS: &str = r#"# kvk settings
# Relative paths are resolved against this file's directory.

[sources]
before = "start_kvk.xlsx"
after = "pass4.xlsx"
requirements = "required.xlsx"

[report]
# .xlsx or .csv
path = "results.xlsx"
unmet_threshold = 100.0
top_default = 10

# Header names in the stats exports
[columns]
id = "Governor ID"
name = "Governor Name"
power = "Power"
kill_points = "Kill Points"
deaths = "Deads"
tier4_kills = "Tier 4 Kills"
tier5_kills = "Tier 5 Kills"
required_kills = "Required Kills"
required_deaths = "Required Deaths"

# DKP = deaths gained * deaths + T5 kills gained * tier5 + T4 kills gained * tier4
[scoring]
deaths = 15.0
tier5 = 10.0
tier4 = 4.0

[chat]
prefix = "!"
"#;
