//! Optional RON settings file for the headless app.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chatlog_core::DEFAULT_VERB;
use chatlog_engine::{EngineSettings, UpgradePacing};
use engine_logging::LogDestination;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "chatlog.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    #[default]
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// First word of the filter statistics text.
    pub verb: String,
    pub log_target: LogTarget,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
    pub upgrade_pause_before_ms: u64,
    pub upgrade_pause_after_ms: u64,
    pub count_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            verb: DEFAULT_VERB.to_string(),
            log_target: LogTarget::default(),
            log_level: LogLevel::default(),
            log_file: None,
            upgrade_pause_before_ms: millis(engine.upgrade_pacing.before_step),
            upgrade_pause_after_ms: millis(engine.upgrade_pacing.after_step),
            count_page_size: engine.count_page_size,
        }
    }
}

impl AppConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            upgrade_pacing: UpgradePacing {
                before_step: Duration::from_millis(self.upgrade_pause_before_ms),
                after_step: Duration::from_millis(self.upgrade_pause_after_ms),
            },
            count_page_size: self.count_page_size,
        }
    }

    pub fn init_logging(&self) {
        engine_logging::initialize(
            self.log_target.into(),
            self.log_level.into(),
            self.log_file.as_deref(),
        );
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Reads settings from `path`. `Ok(None)` when the file does not exist.
///
/// Runs before logging is set up, so problems are returned for the caller to log.
pub fn load(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
