//! Contracts for the external services the matcher is fed from and writes to.
//!
//! Every capability is a small async trait so the resolver can run against the
//! real Spotify and yt-dlp clients as well as in-memory fakes in tests.

use std::{
    fmt,
    future::Future,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use serde::Deserialize;

use crate::types::{ServiceTrack, TrackDescriptor, TrackRef};

#[derive(Debug)]
pub enum ServiceError {
    NotFound(String),
    Auth(String),
    RateLimited { retry_after: u64 },
    Write(String),
    Parse(String),
    Tool(String),
    Http(reqwest::Error),
    Io(std::io::Error),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound(what) => write!(f, "not found: {}", what),
            ServiceError::Auth(msg) => write!(f, "authentication failed: {}", msg),
            ServiceError::RateLimited { retry_after } => {
                write!(f, "rate limited, retry after {} seconds", retry_after)
            }
            ServiceError::Write(msg) => write!(f, "write failed: {}", msg),
            ServiceError::Parse(msg) => write!(f, "unexpected response: {}", msg),
            ServiceError::Tool(msg) => write!(f, "external tool failed: {}", msg),
            ServiceError::Http(e) => write!(f, "http error: {}", e),
            ServiceError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Http(e) => Some(e),
            ServiceError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Http(err)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(err)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Spotify,
    Youtube,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Spotify => write!(f, "spotify"),
            Platform::Youtube => write!(f, "youtube"),
        }
    }
}

pub trait PlaylistSource {
    /// Ordered tracks of a playlist.
    fn fetch_playlist(
        &self,
        playlist_id: &str,
    ) -> impl Future<Output = Result<Vec<ServiceTrack>, ServiceError>> + Send;
}

pub trait TrackSearch {
    /// Candidates for `query`, in the service's relevance order.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<ServiceTrack>, ServiceError>> + Send;
}

pub trait PlaylistSink {
    fn add_to_playlist(
        &self,
        playlist_id: &str,
        tracks: &[TrackRef],
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

pub trait AudioFetcher {
    /// Downloads the audio of `track` into `output_dir` and returns the path of
    /// the written file.
    fn download_audio(
        &self,
        track: &TrackRef,
        output_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf, ServiceError>> + Send;
}

/// Query used to look a track up on another service.
pub fn search_query(track: &TrackDescriptor, explicit: bool) -> String {
    let query = format!("{} {}", track.artist.trim(), track.title.trim())
        .trim()
        .to_string();
    if explicit {
        format!("{} explicit", query)
    } else {
        query
    }
}
