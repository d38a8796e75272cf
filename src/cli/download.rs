use std::{path::PathBuf, sync::Arc};

use reqwest::Client;

use crate::{
    config::Settings,
    debug, error, info,
    matcher::Matcher,
    resolve::{self, ResolveOptions},
    service::{AudioFetcher, Platform, PlaylistSource},
    spotify::SpotifyClient,
    success, tagging,
    types::{ServiceTrack, TrackMetadata, TrackTableRow},
    warning,
    youtube::{self, YtDlp},
};

use super::{print_table, progress_bar, report_unconverted, table_rows, track_row};

/// Downloads every track of a playlist into the output directory.
///
/// Spotify playlists are first resolved against YouTube Music; YouTube Music
/// playlists are downloaded as they are.
pub async fn download(settings: &Settings, playlist_id: &str) {
    let ytdlp = Arc::new(YtDlp::new(
        settings.yt_dlp_binary.clone(),
        settings.yt_dlp_options.clone(),
        settings.thumbnail_quality,
        settings.search_limit,
    ));

    match youtube::version(ytdlp.binary()).await {
        Ok(version) => debug!("using {} {}", ytdlp.binary(), version),
        Err(e) => error!("{}", e),
    }

    if let Err(e) = async_fs::create_dir_all(&settings.output_dir).await {
        error!(
            "Cannot create output directory {}: {}",
            settings.output_dir.display(),
            e
        );
    }

    match settings.platform {
        Platform::Spotify => download_from_spotify(settings, playlist_id, ytdlp).await,
        Platform::Youtube => download_from_youtube(settings, playlist_id, &ytdlp).await,
    }
}

async fn download_from_spotify(settings: &Settings, playlist_id: &str, ytdlp: Arc<YtDlp>) {
    let spotify = SpotifyClient::new(settings.credentials.clone(), settings.search_limit);

    info!("Fetching Spotify playlist {}", playlist_id);
    let tracks = match spotify.fetch_playlist(playlist_id).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to fetch playlist: {}", e),
    };
    success!("Found {} tracks", tracks.len());

    let options = ResolveOptions {
        matcher: Matcher::with_threshold(settings.threshold),
        concurrency: settings.concurrency,
        explicit_queries: true,
    };

    let pb = progress_bar(tracks.len() as u64, "Searching YouTube Music");
    let outcomes = resolve::resolve_tracks(tracks, Arc::clone(&ytdlp), options, pb.clone()).await;
    pb.finish_and_clear();

    let mut rows = table_rows(&outcomes);
    let http = Client::new();
    let matched = outcomes.iter().filter(|o| o.matched().is_some()).count();
    let pb = progress_bar(matched as u64, "Downloading");

    for (outcome, row) in outcomes.iter().zip(rows.iter_mut()) {
        let Some(video) = outcome.matched() else {
            continue;
        };

        // Tags come from Spotify, the audio from YouTube.
        let metadata = outcome
            .source
            .metadata
            .clone()
            .unwrap_or_else(|| fallback_metadata(&outcome.source));
        fetch_and_tag(&ytdlp, &http, settings, video, metadata, row).await;
        pb.inc(1);
    }
    pb.finish_and_clear();

    print_table(rows);
    report_unconverted(&outcomes);
}

async fn download_from_youtube(settings: &Settings, playlist_id: &str, ytdlp: &YtDlp) {
    info!("Fetching YouTube Music playlist {}", playlist_id);
    let tracks = match ytdlp.fetch_playlist(playlist_id).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to fetch playlist: {}", e),
    };
    success!("Found {} tracks", tracks.len());

    let http = Client::new();
    let pb = progress_bar(tracks.len() as u64, "Downloading");
    let mut rows = Vec::with_capacity(tracks.len());

    for (position, track) in tracks.iter().enumerate() {
        let mut row = track_row(position, &track.descriptor);

        let listed = track.metadata.clone().unwrap_or_else(|| fallback_metadata(track));
        let metadata = match ytdlp.track_details(&track.reference).await {
            Ok(details) => match details.metadata {
                Some(full) => youtube::merge_metadata(full, listed),
                None => listed,
            },
            Err(e) => {
                debug!("no details for {}: {}", track.reference.url(), e);
                listed
            }
        };
        fetch_and_tag(ytdlp, &http, settings, track, metadata, &mut row).await;
        rows.push(row);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let downloaded = rows.iter().filter(|r| r.status == "downloaded").count();
    print_table(rows);
    info!("{} of {} tracks downloaded", downloaded, tracks.len());
}

/// Downloads `video` and writes `metadata` into the file. The table row gets
/// the final status.
async fn fetch_and_tag(
    ytdlp: &YtDlp,
    http: &Client,
    settings: &Settings,
    video: &ServiceTrack,
    metadata: TrackMetadata,
    row: &mut TrackTableRow,
) {
    let path = match ytdlp.download_audio(&video.reference, &settings.output_dir).await {
        Ok(path) => path,
        Err(e) => {
            warning!("unable to download {}: {}", video.reference.url(), e);
            row.status = "download failed".to_string();
            return;
        }
    };

    row.status = "downloaded".to_string();
    apply_metadata(http, path, metadata).await;
}

async fn apply_metadata(http: &Client, path: PathBuf, metadata: TrackMetadata) {
    let artwork = match &metadata.art_url {
        Some(url) => tagging::fetch_artwork(http, url).await,
        None => None,
    };

    let display = path.display().to_string();
    let written = tokio::task::spawn_blocking(move || {
        tagging::write_tags(&path, &metadata, artwork.as_deref())
    })
    .await;

    match written {
        Ok(Ok(())) => debug!("metadata applied to {}", display),
        Ok(Err(e)) => warning!("unable to apply metadata to {}: {}", display, e),
        Err(e) => warning!("unable to apply metadata to {}: {}", display, e),
    }
}

fn fallback_metadata(track: &ServiceTrack) -> TrackMetadata {
    TrackMetadata {
        artists: vec![track.descriptor.artist.clone()],
        title: track.descriptor.title.clone(),
        album_title: track.descriptor.album.clone(),
        ..TrackMetadata::default()
    }
}
