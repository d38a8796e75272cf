//! Configuration management for playlist-master.
//!
//! Settings come from three layers, highest priority first:
//! 1. Command-line options
//! 2. The TOML config file (`./config.toml` unless `--config` says otherwise)
//! 3. Environment variables, optionally loaded from a `.env` file in the local
//!    data directory
//!
//! Anything still unset falls back to the defaults in this module.

use std::{
    env, fmt,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    logging::LogLevel, matcher::DEFAULT_THRESHOLD, service::Platform, utils,
    youtube::ThumbnailQuality,
};

pub const CONFIG_DEFAULT_PATH: &str = "./config.toml";
pub const LOG_DEFAULT_DIR: &str = "./log";
pub const OUTPUT_DEFAULT_DIR: &str = "./music";
pub const YT_DLP_DEFAULT_BINARY: &str = "yt-dlp";
pub const YT_DLP_DEFAULT_OPTIONS: &str = "-x --audio-format mp3 -o %(title)s.%(ext)s";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

const CONFIG_SKELETON: &str = "[playlist-master]\n\n[yt-dlp]\n\n[sp-oauth]\n";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives in `<local data dir>/playlist-master/.env`, e.g.
/// `~/.local/share/playlist-master/.env` on Linux. The directory is created
/// when missing.
///
/// # Errors
///
/// Returns an error string when the directory cannot be created or the file
/// cannot be read. A missing file is an error too; callers usually only warn
/// about it since every variable has another source.
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("playlist-master/.env");
    path
}

/// Address the local OAuth callback server binds to.
pub fn server_addr() -> String {
    env::var("SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8888".to_string())
}

/// Spotify user that owns newly created playlists. When unset, the user is
/// looked up with the stored token.
pub fn spotify_user() -> Option<String> {
    env::var("SPOTIFY_USER_ID").ok().filter(|v| !v.is_empty())
}

pub fn spotify_client_id() -> Option<String> {
    env::var("SPOTIFY_API_AUTH_CLIENT_ID")
        .ok()
        .filter(|v| !v.is_empty())
}

/// The client secret must never end up in logs.
pub fn spotify_client_secret() -> Option<String> {
    env::var("SPOTIFY_API_AUTH_CLIENT_SECRET")
        .ok()
        .filter(|v| !v.is_empty())
}

pub fn spotify_redirect_uri() -> String {
    env::var("SPOTIFY_API_REDIRECT_URI")
        .unwrap_or_else(|_| "http://127.0.0.1:8888/callback".to_string())
}

pub fn spotify_scope() -> String {
    env::var("SPOTIFY_API_AUTH_SCOPE")
        .unwrap_or_else(|_| "playlist-modify-public playlist-modify-private".to_string())
}

pub fn spotify_apiauth_url() -> String {
    env::var("SPOTIFY_API_AUTH_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/authorize".to_string())
}

pub fn spotify_apiurl() -> String {
    env::var("SPOTIFY_API_URL").unwrap_or_else(|_| "https://api.spotify.com/v1".to_string())
}

pub fn spotify_apitoken_url() -> String {
    env::var("SPOTIFY_API_TOKEN_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/api/token".to_string())
}

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "cannot read config: {}", e),
            ConfigError::ParseError(e) => write!(f, "cannot parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(rename = "playlist-master")]
    pub general: GeneralSection,
    #[serde(rename = "yt-dlp")]
    pub yt_dlp: YtDlpSection,
    #[serde(rename = "sp-oauth")]
    pub sp_oauth: OAuthSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    pub platform: Option<Platform>,
    pub thumbnail_quality: Option<ThumbnailQuality>,
    pub genlogs: Option<bool>,
    pub logdir: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub output_dir: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub concurrency: Option<usize>,
    pub search_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct YtDlpSection {
    pub options: Option<String>,
    pub binary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OAuthSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: FileConfig,
    pub path: PathBuf,
    /// The requested file did not exist and the default path was used.
    pub fell_back: bool,
    /// A skeleton file was written because nothing existed yet.
    pub created: bool,
}

/// Reads the config file.
///
/// When `requested` does not exist, `default_path` is used instead; when that
/// is missing too, a skeleton containing the empty sections is written there
/// first.
pub async fn load_file(
    requested: Option<&Path>,
    default_path: &Path,
) -> Result<LoadedConfig, ConfigError> {
    let mut fell_back = false;
    let path = match requested {
        Some(p) if p.is_file() => p.to_path_buf(),
        Some(_) => {
            fell_back = true;
            default_path.to_path_buf()
        }
        None => default_path.to_path_buf(),
    };

    let mut created = false;
    if !path.is_file() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }
        async_fs::write(&path, CONFIG_SKELETON).await?;
        created = true;
    }

    let content = async_fs::read_to_string(&path).await?;
    Ok(LoadedConfig {
        config: FileConfig::parse(&content)?,
        path,
        fell_back,
        created,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Parses `-t/--threshold`; only finite values in `[0, 1]` are accepted.
pub fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", value))?;
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(format!("`{}` is not between 0 and 1", value));
    }
    Ok(threshold)
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub platform: Option<Platform>,
    pub thumbnail_quality: Option<ThumbnailQuality>,
    pub genlogs: bool,
    pub logdir: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub yt_dlp: Option<String>,
    pub sp_oauth: Option<Credentials>,
    pub output_dir: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub platform: Platform,
    pub thumbnail_quality: ThumbnailQuality,
    pub genlogs: bool,
    pub logdir: PathBuf,
    pub log_level: LogLevel,
    pub output_dir: PathBuf,
    pub threshold: f64,
    pub concurrency: usize,
    pub search_limit: u32,
    pub yt_dlp_binary: String,
    pub yt_dlp_options: Vec<String>,
    pub credentials: Option<Credentials>,
}

impl Settings {
    /// Merges command line, file and environment into final settings.
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Self {
        let general = file.general;

        let credentials = overrides
            .sp_oauth
            .or_else(|| match (
                file.sp_oauth.client_id.filter(|v| !v.is_empty()),
                file.sp_oauth.client_secret.filter(|v| !v.is_empty()),
            ) {
                (Some(client_id), Some(client_secret)) => Some(Credentials {
                    client_id,
                    client_secret,
                }),
                _ => None,
            })
            .or_else(|| match (spotify_client_id(), spotify_client_secret()) {
                (Some(client_id), Some(client_secret)) => Some(Credentials {
                    client_id,
                    client_secret,
                }),
                _ => None,
            });

        let yt_dlp_options = overrides
            .yt_dlp
            .or(file.yt_dlp.options)
            .unwrap_or_else(|| YT_DLP_DEFAULT_OPTIONS.to_string());

        Self {
            platform: overrides
                .platform
                .or(general.platform)
                .unwrap_or(Platform::Spotify),
            thumbnail_quality: overrides
                .thumbnail_quality
                .or(general.thumbnail_quality)
                .unwrap_or_default(),
            genlogs: overrides.genlogs || general.genlogs.unwrap_or(false),
            logdir: overrides
                .logdir
                .or(general.logdir)
                .unwrap_or_else(|| PathBuf::from(LOG_DEFAULT_DIR)),
            log_level: overrides
                .log_level
                .or(general.log_level)
                .unwrap_or_default(),
            output_dir: overrides
                .output_dir
                .or(general.output_dir)
                .unwrap_or_else(|| PathBuf::from(OUTPUT_DEFAULT_DIR)),
            threshold: overrides
                .threshold
                .filter(|t| t.is_finite())
                .or(general.threshold.filter(|t| t.is_finite()))
                .unwrap_or(DEFAULT_THRESHOLD)
                .clamp(0.0, 1.0),
            concurrency: overrides
                .concurrency
                .or(general.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY)
                .max(1),
            search_limit: general.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1),
            yt_dlp_binary: file
                .yt_dlp
                .binary
                .unwrap_or_else(|| YT_DLP_DEFAULT_BINARY.to_string()),
            yt_dlp_options: utils::split_args(&yt_dlp_options),
            credentials,
        }
    }

    /// Directory for the log file, when file logging is on.
    pub fn log_target(&self) -> Option<&Path> {
        self.genlogs.then_some(self.logdir.as_path())
    }
}
