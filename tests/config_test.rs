use std::path::PathBuf;

use playlist_master::config::{self, Credentials, FileConfig, Overrides, Settings};
use playlist_master::logging::LogLevel;
use playlist_master::matcher::DEFAULT_THRESHOLD;
use playlist_master::service::Platform;
use playlist_master::youtube::ThumbnailQuality;
use tempfile::tempdir;

const FULL_CONFIG: &str = r#"
[playlist-master]
platform = "youtube"
thumbnail_quality = "maxres"
genlogs = true
logdir = "/var/log/pm"
log_level = "warning"
output_dir = "/srv/music"
threshold = 0.7
concurrency = 8
search_limit = 5

[yt-dlp]
binary = "/opt/yt-dlp"
options = "-x --audio-format opus -o '%(artist)s - %(title)s.%(ext)s'"

[sp-oauth]
client_id = "file-id"
client_secret = "file-secret"
"#;

#[test]
fn test_parse_full_config() {
    let config = FileConfig::parse(FULL_CONFIG).unwrap();

    assert_eq!(config.general.platform, Some(Platform::Youtube));
    assert_eq!(config.general.thumbnail_quality, Some(ThumbnailQuality::Maxres));
    assert_eq!(config.general.genlogs, Some(true));
    assert_eq!(config.general.log_level, Some(LogLevel::Warning));
    assert_eq!(config.general.threshold, Some(0.7));
    assert_eq!(config.general.concurrency, Some(8));
    assert_eq!(config.yt_dlp.binary.as_deref(), Some("/opt/yt-dlp"));
    assert_eq!(config.sp_oauth.client_id.as_deref(), Some("file-id"));
}

#[test]
fn test_parse_empty_sections() {
    let config = FileConfig::parse("[playlist-master]\n\n[yt-dlp]\n\n[sp-oauth]\n").unwrap();

    assert_eq!(config.general.platform, None);
    assert_eq!(config.yt_dlp.options, None);
    assert_eq!(config.sp_oauth.client_secret, None);
}

#[test]
fn test_parse_rejects_unknown_values() {
    assert!(FileConfig::parse("[playlist-master]\nplatform = \"tidal\"\n").is_err());
    assert!(FileConfig::parse("[playlist-master]\nthreshold = \"high\"\n").is_err());
}

#[test]
fn test_file_values_are_used() {
    let settings = Settings::resolve(
        FileConfig::parse(FULL_CONFIG).unwrap(),
        Overrides::default(),
    );

    assert_eq!(settings.platform, Platform::Youtube);
    assert_eq!(settings.thumbnail_quality, ThumbnailQuality::Maxres);
    assert!(settings.genlogs);
    assert_eq!(settings.logdir, PathBuf::from("/var/log/pm"));
    assert_eq!(settings.log_level, LogLevel::Warning);
    assert_eq!(settings.output_dir, PathBuf::from("/srv/music"));
    assert_eq!(settings.threshold, 0.7);
    assert_eq!(settings.concurrency, 8);
    assert_eq!(settings.search_limit, 5);
    assert_eq!(settings.yt_dlp_binary, "/opt/yt-dlp");
    assert_eq!(
        settings.yt_dlp_options,
        vec![
            "-x",
            "--audio-format",
            "opus",
            "-o",
            "%(artist)s - %(title)s.%(ext)s"
        ]
    );
    assert_eq!(
        settings.credentials,
        Some(Credentials {
            client_id: "file-id".to_string(),
            client_secret: "file-secret".to_string(),
        })
    );
    assert_eq!(settings.log_target(), Some(PathBuf::from("/var/log/pm").as_path()));
}

#[test]
fn test_command_line_wins_over_file() {
    let overrides = Overrides {
        platform: Some(Platform::Spotify),
        thumbnail_quality: Some(ThumbnailQuality::Medium),
        log_level: Some(LogLevel::Debug),
        yt_dlp: Some("-x".to_string()),
        sp_oauth: Some(Credentials {
            client_id: "cli-id".to_string(),
            client_secret: "cli-secret".to_string(),
        }),
        output_dir: Some(PathBuf::from("out")),
        threshold: Some(0.9),
        concurrency: Some(2),
        ..Overrides::default()
    };

    let settings = Settings::resolve(FileConfig::parse(FULL_CONFIG).unwrap(), overrides);

    assert_eq!(settings.platform, Platform::Spotify);
    assert_eq!(settings.thumbnail_quality, ThumbnailQuality::Medium);
    assert_eq!(settings.log_level, LogLevel::Debug);
    assert_eq!(settings.yt_dlp_options, vec!["-x"]);
    assert_eq!(
        settings.credentials.map(|c| c.client_id),
        Some("cli-id".to_string())
    );
    assert_eq!(settings.output_dir, PathBuf::from("out"));
    assert_eq!(settings.threshold, 0.9);
    assert_eq!(settings.concurrency, 2);
}

#[test]
fn test_defaults_without_file_values() {
    let settings = Settings::resolve(FileConfig::default(), Overrides::default());

    assert_eq!(settings.platform, Platform::Spotify);
    assert_eq!(settings.thumbnail_quality, ThumbnailQuality::Default);
    assert!(!settings.genlogs);
    assert_eq!(settings.log_target(), None);
    assert_eq!(settings.logdir, PathBuf::from(config::LOG_DEFAULT_DIR));
    assert_eq!(settings.log_level, LogLevel::Info);
    assert_eq!(settings.output_dir, PathBuf::from(config::OUTPUT_DEFAULT_DIR));
    assert_eq!(settings.threshold, DEFAULT_THRESHOLD);
    assert_eq!(settings.concurrency, config::DEFAULT_CONCURRENCY);
    assert_eq!(settings.yt_dlp_binary, config::YT_DLP_DEFAULT_BINARY);
    assert_eq!(
        settings.yt_dlp_options,
        vec!["-x", "--audio-format", "mp3", "-o", "%(title)s.%(ext)s"]
    );
}

#[test]
fn test_out_of_range_values_are_clamped() {
    let overrides = Overrides {
        threshold: Some(1.5),
        concurrency: Some(0),
        ..Overrides::default()
    };

    let settings = Settings::resolve(FileConfig::default(), overrides);

    assert_eq!(settings.threshold, 1.0);
    assert_eq!(settings.concurrency, 1);
}

#[test]
fn test_non_finite_threshold_falls_back() {
    let overrides = Overrides {
        threshold: Some(f64::NAN),
        ..Overrides::default()
    };
    let settings = Settings::resolve(FileConfig::default(), overrides);
    assert_eq!(settings.threshold, DEFAULT_THRESHOLD);

    let file = FileConfig::parse("[playlist-master]\nthreshold = nan\n").unwrap();
    let settings = Settings::resolve(file, Overrides::default());
    assert_eq!(settings.threshold, DEFAULT_THRESHOLD);

    // a broken override does not hide a valid file value
    let file = FileConfig::parse("[playlist-master]\nthreshold = 0.7\n").unwrap();
    let overrides = Overrides {
        threshold: Some(f64::INFINITY),
        ..Overrides::default()
    };
    let settings = Settings::resolve(file, overrides);
    assert_eq!(settings.threshold, 0.7);
}

#[test]
fn test_threshold_argument_must_be_finite_and_in_range() {
    assert_eq!(config::parse_threshold("0.7"), Ok(0.7));
    assert_eq!(config::parse_threshold("1"), Ok(1.0));
    assert_eq!(config::parse_threshold(" 0 "), Ok(0.0));

    for bad in ["NaN", "nan", "inf", "-inf", "1.5", "-0.1", "high", ""] {
        assert!(config::parse_threshold(bad).is_err(), "{} accepted", bad);
    }
}

#[tokio::test]
async fn test_missing_config_creates_skeleton() {
    let dir = tempdir().unwrap();
    let default_path = dir.path().join("config.toml");
    let requested = dir.path().join("nope.toml");

    let loaded = config::load_file(Some(&requested), &default_path)
        .await
        .unwrap();

    assert!(loaded.fell_back);
    assert!(loaded.created);
    assert_eq!(loaded.path, default_path);

    let content = std::fs::read_to_string(&default_path).unwrap();
    assert!(content.contains("[playlist-master]"));
    assert!(content.contains("[yt-dlp]"));
    assert!(content.contains("[sp-oauth]"));
    assert!(!requested.exists());
}

#[tokio::test]
async fn test_existing_config_is_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, FULL_CONFIG).unwrap();

    let loaded = config::load_file(Some(&path), &dir.path().join("config.toml"))
        .await
        .unwrap();

    assert!(!loaded.fell_back);
    assert!(!loaded.created);
    assert_eq!(loaded.path, path);
    assert_eq!(loaded.config.general.search_limit, Some(5));
}

#[tokio::test]
async fn test_broken_config_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[playlist-master\n").unwrap();

    let result = config::load_file(None, &path).await;

    assert!(matches!(result, Err(config::ConfigError::ParseError(_))));
}
