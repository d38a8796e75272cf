use std::path::{Path, PathBuf};

use clap::{
    Args, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use playlist_master::{
    cli,
    config::{self, Credentials, Overrides, Settings},
    error,
    logging::{self, LogLevel},
    service::Platform,
    warning,
    youtube::ThumbnailQuality,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download a Spotify or YouTube Music playlist as tagged audio files
    Download(DownloadOptions),

    /// Recreate a YouTube Music playlist on Spotify
    Convert(ConvertOptions),

    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Args, Debug, Clone)]
pub struct CommonOptions {
    /// Path to the config file
    #[clap(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write logs to a file in the log directory
    #[clap(short = 'g', long)]
    pub genlogs: bool,

    /// Directory for log files
    #[clap(short = 'l', long, value_name = "DIR")]
    pub logdir: Option<PathBuf>,

    /// Minimum level of printed and logged messages
    #[clap(short = 'e', long = "log-level", value_enum)]
    pub log_level: Option<LogLevel>,

    /// Spotify client id and secret
    #[clap(
        short = 's',
        long = "sp-oauth",
        num_args = 2,
        value_names = ["CLIENT_ID", "CLIENT_SECRET"]
    )]
    pub sp_oauth: Option<Vec<String>>,

    /// Minimum similarity (0.0 - 1.0) for a search result to count as match
    #[clap(short = 't', long, value_parser = config::parse_threshold)]
    pub threshold: Option<f64>,

    /// Number of tracks searched at the same time
    #[clap(short = 'j', long)]
    pub concurrency: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadOptions {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Service the playlist lives on
    #[clap(short = 'p', long, value_enum)]
    pub platform: Option<Platform>,

    /// Resolution of the cover art taken from YouTube thumbnails
    #[clap(short = 'q', long = "thumbnail-quality", value_enum)]
    pub thumbnail_quality: Option<ThumbnailQuality>,

    /// Options passed to yt-dlp, e.g. "-x --audio-format mp3"
    #[clap(short = 'd', long = "yt-dlp", allow_hyphen_values = true)]
    pub yt_dlp: Option<String>,

    /// Directory the audio files are written to
    #[clap(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Playlist id or link
    pub playlist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ConvertOptions {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Add the tracks to this existing Spotify playlist
    #[clap(long, conflicts_with = "name")]
    pub target: Option<String>,

    /// Name of the Spotify playlist to create
    #[clap(long)]
    pub name: Option<String>,

    /// Only show the matches, change nothing on Spotify
    #[clap(long)]
    pub dry_run: bool,

    /// YouTube Music playlist id or link
    pub playlist_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

impl CommonOptions {
    fn overrides(&self) -> Overrides {
        let sp_oauth = self.sp_oauth.as_ref().and_then(|values| match values.as_slice() {
            [client_id, client_secret] => Some(Credentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            _ => None,
        });

        Overrides {
            genlogs: self.genlogs,
            logdir: self.logdir.clone(),
            log_level: self.log_level,
            sp_oauth,
            threshold: self.threshold,
            concurrency: self.concurrency,
            ..Overrides::default()
        }
    }
}

/// Loads `.env` and the config file, merges them with the command line and
/// installs the logger.
async fn setup(common: &CommonOptions, overrides: Overrides) -> Settings {
    let env_result = config::load_env().await;

    let loaded = match config::load_file(
        common.config.as_deref(),
        Path::new(config::CONFIG_DEFAULT_PATH),
    )
    .await
    {
        Ok(loaded) => loaded,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };

    let settings = Settings::resolve(loaded.config, overrides);
    if let Err(e) = logging::init(settings.log_level, settings.log_target()) {
        warning!(
            "Cannot write logs to {}: {}",
            settings.logdir.display(),
            e
        );
    }

    if let Err(e) = env_result {
        warning!("Cannot load environment. Err: {}", e);
    }
    if loaded.fell_back {
        warning!(
            "Config file {} not found, using {}",
            common
                .config
                .as_deref()
                .unwrap_or(Path::new(config::CONFIG_DEFAULT_PATH))
                .display(),
            loaded.path.display()
        );
    }
    if loaded.created {
        warning!("Created empty config file {}", loaded.path.display());
    }

    settings
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Download(opt) => {
            let overrides = Overrides {
                platform: opt.platform,
                thumbnail_quality: opt.thumbnail_quality,
                yt_dlp: opt.yt_dlp.clone(),
                output_dir: opt.output_dir.clone(),
                ..opt.common.overrides()
            };
            let settings = setup(&opt.common, overrides).await;
            cli::download(&settings, &opt.playlist_id).await
        }
        Command::Convert(opt) => {
            let settings = setup(&opt.common, opt.common.overrides()).await;
            cli::convert(
                &settings,
                &opt.playlist_id,
                opt.target,
                opt.name,
                opt.dry_run,
            )
            .await
        }
        Command::Auth(opt) => {
            let settings = setup(&opt.common, opt.common.overrides()).await;
            cli::auth(&settings).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
