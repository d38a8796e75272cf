//! Level filtering and the optional log file behind the output macros.
//!
//! The macros in the crate root print to the terminal in color and hand every
//! emitted line to `tracing`. When a log directory is configured, a
//! `tracing-subscriber` fmt layer appends those events, without color and with
//! a local timestamp, to `<logdir>/playlist-master.log`.

use std::{
    fmt,
    fs::{self, OpenOptions},
    io,
    path::Path,
    sync::{Mutex, OnceLock},
};

use clap::ValueEnum;
use serde::Deserialize;
use tracing::{Level, level_filters::LevelFilter};
use tracing_subscriber::{
    Layer, filter::Targets, fmt::time::ChronoLocal, layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

pub const LOG_FILE_NAME: &str = "playlist-master.log";

const LOG_TARGET: &str = "playlist_master";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Notset,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Notset => "NOTSET",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// `tracing` level of a message logged at this level. `tracing` has no
    /// level above ERROR, so critical messages share it.
    pub fn tracing_level(self) -> Level {
        match self {
            LogLevel::Notset => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error | LogLevel::Critical => Level::ERROR,
        }
    }

    /// Filter letting through this level and everything more severe.
    pub fn level_filter(self) -> LevelFilter {
        LevelFilter::from_level(self.tracing_level())
    }
}

#[derive(Debug)]
pub enum LogError {
    Io(io::Error),
    AlreadyInitialized,
    Subscriber(TryInitError),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Io(e) => write!(f, "{}", e),
            LogError::AlreadyInitialized => write!(f, "logging is already initialized"),
            LogError::Subscriber(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LogError {}

impl From<io::Error> for LogError {
    fn from(err: io::Error) -> Self {
        LogError::Io(err)
    }
}

impl From<TryInitError> for LogError {
    fn from(err: TryInitError) -> Self {
        LogError::Subscriber(err)
    }
}

static FILTER: OnceLock<LevelFilter> = OnceLock::new();

/// Installs the process-wide level and, with a log directory, the file
/// subscriber.
///
/// # Errors
///
/// Fails on a second call, when the log file cannot be opened, or when another
/// global `tracing` subscriber is already installed.
pub fn init(level: LogLevel, logdir: Option<&Path>) -> Result<(), LogError> {
    let filter = level.level_filter();
    FILTER
        .set(filter)
        .map_err(|_| LogError::AlreadyInitialized)?;

    let Some(dir) = logdir else {
        return Ok(());
    };

    fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_filter(Targets::new().with_target(LOG_TARGET, filter));

    tracing_subscriber::registry().with(file_layer).try_init()?;
    Ok(())
}

/// Whether `level` passes `filter`.
pub fn allows(filter: LevelFilter, level: LogLevel) -> bool {
    level.tracing_level() <= filter
}

/// Whether the macros print messages of `level`. Before `init` the default
/// level applies.
pub fn enabled(level: LogLevel) -> bool {
    let filter = FILTER
        .get()
        .copied()
        .unwrap_or_else(|| LogLevel::default().level_filter());
    allows(filter, level)
}

/// Forwards a printed message to the installed subscriber.
pub fn record(level: LogLevel, message: &str) {
    match level {
        LogLevel::Notset => tracing::trace!("{}", message),
        LogLevel::Debug => tracing::debug!("{}", message),
        LogLevel::Info => tracing::info!("{}", message),
        LogLevel::Warning => tracing::warn!("{}", message),
        LogLevel::Error => tracing::error!("{}", message),
        LogLevel::Critical => tracing::error!(critical = true, "{}", message),
    }
}
