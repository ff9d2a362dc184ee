//! One-shot process logging bootstrap.
//!
//! [`init`] installs the global `tracing` subscriber exactly once, before
//! other components start. It takes a base [`TraceConfig`] (target, minimum
//! severity as a single-letter code, output format); if a structured override
//! file exists at [`OVERRIDE_PATH`] it is read once and merged field-by-field
//! over the base as the authoritative configuration. There is no runtime
//! reconfiguration and no teardown.
//!
//! The `RUST_LOG` environment variable, when set, takes precedence over the
//! configured level for fine-grained per-target filtering.
//!
//! # Example
//!
//! ```no_run
//! use handoff::trace::{self, TraceConfig};
//!
//! trace::init(TraceConfig::default())?;
//! tracing::info!("process started");
//! # Ok::<(), handoff::trace::TraceError>(())
//! ```

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Well-known path checked at startup for an authoritative override file.
pub const OVERRIDE_PATH: &str = "trace.json";

/// Errors raised while bootstrapping logging.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The override file or log file could not be opened or read.
    #[error("failed to access logging configuration: {0}")]
    Io(#[from] io::Error),
    /// The override file is not valid JSON for the expected shape.
    #[error("malformed logging override file: {0}")]
    Config(#[from] serde_json::Error),
    /// A severity code outside `D`, `I`, `W`, `E`, `C`.
    #[error("unknown severity code {0:?}")]
    UnknownLevel(String),
    /// A global subscriber was already installed.
    #[error("logging already initialized")]
    AlreadyInitialized,
}

/// Minimum severity, written as a single-letter code.
///
/// Codes are matched case-insensitively on the first character:
/// `D`ebug, `I`nfo, `W`arning, `E`rror, `C`ritical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelCode {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LevelCode {
    /// Parses a single-letter severity code.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnknownLevel`] for an empty string or a letter
    /// outside the known codes.
    pub fn from_code(code: &str) -> Result<Self, TraceError> {
        match code.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('D') => Ok(Self::Debug),
            Some('I') => Ok(Self::Info),
            Some('W') => Ok(Self::Warning),
            Some('E') => Ok(Self::Error),
            Some('C') => Ok(Self::Critical),
            _ => Err(TraceError::UnknownLevel(code.to_owned())),
        }
    }

    /// Maps the code to a `tracing` level filter.
    ///
    /// `Critical` maps to [`LevelFilter::ERROR`], the highest severity
    /// `tracing` distinguishes.
    #[must_use]
    pub const fn filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Default human-readable format.
    Full,
    /// Abbreviated single-line format.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

/// Base logging configuration.
///
/// Defaults: stderr, `Info`, full format.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Log file appended to; `None` logs to stderr.
    pub file: Option<PathBuf>,
    /// Minimum severity.
    pub level: LevelCode,
    /// Line format.
    pub format: Format,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: LevelCode::Info,
            format: Format::Full,
        }
    }
}

/// Shape of the structured override file. Absent fields keep the base value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraceOverrides {
    file: Option<PathBuf>,
    level: Option<String>,
    format: Option<Format>,
}

impl TraceConfig {
    /// Merges overrides over this config, field by field.
    fn apply(&mut self, overrides: TraceOverrides) -> Result<(), TraceError> {
        if let Some(file) = overrides.file {
            self.file = Some(file);
        }
        if let Some(level) = overrides.level {
            self.level = LevelCode::from_code(&level)?;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        Ok(())
    }
}

/// Reads the override file if one exists at `path`.
fn load_overrides(path: &Path) -> Result<Option<TraceOverrides>, TraceError> {
    if !path.is_file() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

/// Installs the global subscriber from `config`, merged with the override
/// file at [`OVERRIDE_PATH`] when present.
///
/// Call once at process start. Components started afterwards log through the
/// installed subscriber and never reconfigure it.
///
/// # Errors
///
/// Returns [`TraceError::AlreadyInitialized`] on a second call, and I/O or
/// config errors when the override file or log file is unusable.
pub fn init(config: TraceConfig) -> Result<(), TraceError> {
    init_with_override(config, Path::new(OVERRIDE_PATH))
}

/// [`init`] with an explicit override-file path.
pub fn init_with_override(mut config: TraceConfig, path: &Path) -> Result<(), TraceError> {
    if let Some(overrides) = load_overrides(path)? {
        config.apply(overrides)?;
    }
    install(config)
}

fn install(config: TraceConfig) -> Result<(), TraceError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.level.filter().into()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let writer = Arc::new(file);
            match config.format {
                Format::Full => registry
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .try_init(),
                Format::Compact => registry
                    .with(fmt::layer().compact().with_ansi(false).with_writer(writer))
                    .try_init(),
                Format::Json => registry
                    .with(fmt::layer().json().with_writer(writer))
                    .try_init(),
            }
        }
        None => match config.format {
            Format::Full => registry
                .with(fmt::layer().with_writer(io::stderr))
                .try_init(),
            Format::Compact => registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .try_init(),
            Format::Json => registry
                .with(fmt::layer().json().with_writer(io::stderr))
                .try_init(),
        },
    };

    result.map_err(|_| TraceError::AlreadyInitialized)
}
