use std::sync::Arc;

use crate::{
    config::Settings,
    error, info,
    matcher::Matcher,
    resolve::{self, ResolveOptions},
    service::{PlaylistSink, PlaylistSource},
    spotify::{self, SpotifyClient},
    success,
    types::TrackRef,
    warning,
    youtube::YtDlp,
};

use super::{print_table, progress_bar, report_unconverted, table_rows};

pub const DEFAULT_PLAYLIST_NAME: &str = "Converted from YouTube Music";

/// Recreates a YouTube Music playlist on Spotify.
///
/// Matched tracks are appended to `target` when given, otherwise to a new
/// private playlist named `name`. With `dry_run` nothing is written.
pub async fn convert(
    settings: &Settings,
    playlist_id: &str,
    target: Option<String>,
    name: Option<String>,
    dry_run: bool,
) {
    let ytdlp = YtDlp::new(
        settings.yt_dlp_binary.clone(),
        settings.yt_dlp_options.clone(),
        settings.thumbnail_quality,
        settings.search_limit,
    );

    info!("Fetching YouTube Music playlist {}", playlist_id);
    let tracks = match ytdlp.fetch_playlist(playlist_id).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to fetch playlist: {}", e),
    };
    success!("Found {} tracks", tracks.len());

    let client = Arc::new(SpotifyClient::new(
        settings.credentials.clone(),
        settings.search_limit,
    ));
    let options = ResolveOptions {
        matcher: Matcher::with_threshold(settings.threshold),
        concurrency: settings.concurrency,
        explicit_queries: false,
    };

    let pb = progress_bar(tracks.len() as u64, "Searching Spotify");
    let outcomes = resolve::resolve_tracks(tracks, Arc::clone(&client), options, pb.clone()).await;
    pb.finish_and_clear();

    print_table(table_rows(&outcomes));
    report_unconverted(&outcomes);

    let refs: Vec<TrackRef> = outcomes
        .iter()
        .filter_map(|o| o.matched())
        .map(|t| t.reference.clone())
        .collect();

    if dry_run {
        info!("Dry run, {} tracks were not added", refs.len());
        return;
    }

    if refs.is_empty() {
        warning!("No track matched, nothing to add.");
        return;
    }

    let playlist_id = match target {
        Some(id) => id,
        None => {
            let name = name.unwrap_or_else(|| DEFAULT_PLAYLIST_NAME.to_string());
            let description = format!("Converted from YouTube Music playlist {}", playlist_id);
            match spotify::playlist::create(&client, &name, &description).await {
                Ok(created) => {
                    success!("Playlist {} created.", created.name);
                    created.id
                }
                Err(e) => error!("Failed to create playlist: {}", e),
            }
        }
    };

    match client.add_to_playlist(&playlist_id, &refs).await {
        Ok(()) => success!("Added {} tracks to playlist {}", refs.len(), playlist_id),
        Err(e) => error!("Failed to add tracks to playlist: {}", e),
    }
}
