//! Playlist download and conversion library
//!
//! This library reads playlists from Spotify or YouTube Music, locates each
//! track on the other service with a fuzzy title/artist matcher, and then either
//! downloads and tags the audio locally or appends the matches to a Spotify
//! playlist.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command implementations (`download`, `convert`, `auth`)
//! - `config` - `.env`, `config.toml` and command-line settings
//! - `logging` - Level filtering and log file output for the print macros
//! - `management` - Persisted Spotify user token
//! - `matcher` - Fuzzy cross-service track matching
//! - `resolve` - Search and match every track of a playlist
//! - `server` - Local HTTP server for OAuth callbacks
//! - `service` - Contracts for the external services
//! - `spotify` - Spotify Web API client
//! - `tagging` - Metadata tag writing for downloaded files
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//! - `youtube` - YouTube Music access through yt-dlp

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod management;
pub mod matcher;
pub mod resolve;
pub mod server;
pub mod service;
pub mod spotify;
pub mod tagging;
pub mod types;
pub mod utils;
pub mod youtube;

/// A convenient Result type alias for operations that may fail.
///
/// Boxes any error that is `Send + Sync` so command plumbing can use `?`
/// across the different error types of the service modules.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching playlist {}", playlist_id);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    if $crate::logging::enabled($crate::logging::LogLevel::Info) {
      let message = std::format!($($arg)*);
      println!("[{}] {}", "o".blue().bold(), message);
      $crate::logging::record($crate::logging::LogLevel::Info, &message);
    }
  })
}

/// Prints a success message with a green checkmark.
///
/// Filtered like `info!`.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    if $crate::logging::enabled($crate::logging::LogLevel::Info) {
      let message = std::format!($($arg)*);
      println!("[{}] {}", "✓".green().bold(), message);
      $crate::logging::record($crate::logging::LogLevel::Info, &message);
    }
  })
}

/// Prints a dimmed diagnostic message. Hidden unless the log level is `debug`
/// or `notset`.
#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    if $crate::logging::enabled($crate::logging::LogLevel::Debug) {
      let message = std::format!($($arg)*);
      println!("[{}] {}", "·".dimmed(), message.dimmed());
      $crate::logging::record($crate::logging::LogLevel::Debug, &message);
    }
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Used for unrecoverable errors only. The message is always printed,
/// whatever the configured log level.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    let message = std::format!($($arg)*);
    println!("[{}] {}", "!".red().bold(), message);
    $crate::logging::record($crate::logging::LogLevel::Critical, &message);
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues, such as a single track that could not be
/// converted.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    if $crate::logging::enabled($crate::logging::LogLevel::Warning) {
      let message = std::format!($($arg)*);
      println!("[{}] {}", "!".yellow().bold(), message);
      $crate::logging::record($crate::logging::LogLevel::Warning, &message);
    }
  })
}
