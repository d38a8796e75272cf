//! # YouTube Music Module
//!
//! YouTube Music access goes through the `yt-dlp` executable: playlists are
//! read with flat extraction, searches use yt-dlp's `ytsearchN:` prefix and
//! audio is downloaded with the options from the `[yt-dlp]` config section.

mod ytdlp;

pub use ytdlp::{parse_entry, parse_listing, version};

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;

use crate::{
    service::{AudioFetcher, PlaylistSource, ServiceError, TrackSearch},
    types::{ServiceTrack, TrackDescriptor, TrackMetadata, TrackRef, YtDlpEntry},
};

use ytdlp::Invocation;

/// Resolution of the cover art taken from the video thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    #[default]
    Default,
    Medium,
    High,
    Standard,
    Maxres,
}

impl ThumbnailQuality {
    pub fn thumbnail_url(self, video_id: &str) -> String {
        let name = match self {
            ThumbnailQuality::Default => "default",
            ThumbnailQuality::Medium => "mqdefault",
            ThumbnailQuality::High => "hqdefault",
            ThumbnailQuality::Standard => "sddefault",
            ThumbnailQuality::Maxres => "maxresdefault",
        };
        format!("https://i.ytimg.com/vi/{}/{}.jpg", video_id, name)
    }
}

pub struct YtDlp {
    binary: String,
    options: Vec<String>,
    thumbnail_quality: ThumbnailQuality,
    search_limit: u32,
}

impl YtDlp {
    pub fn new(
        binary: impl Into<String>,
        options: Vec<String>,
        thumbnail_quality: ThumbnailQuality,
        search_limit: u32,
    ) -> Self {
        Self {
            binary: binary.into(),
            options,
            thumbnail_quality,
            search_limit,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn to_service_track(&self, entry: YtDlpEntry) -> ServiceTrack {
        to_service_track(entry, self.thumbnail_quality)
    }

    /// Full metadata of one video. Playlist listings are flat and lack the
    /// album artists, release year and track number.
    pub async fn track_details(&self, track: &TrackRef) -> Result<ServiceTrack, ServiceError> {
        let entry = Invocation::new(&self.binary).details(track.url()).await?;
        Ok(self.to_service_track(entry))
    }
}

impl PlaylistSource for YtDlp {
    async fn fetch_playlist(&self, playlist_id: &str) -> Result<Vec<ServiceTrack>, ServiceError> {
        let listing = Invocation::new(&self.binary)
            .arg(playlist_url(playlist_id))
            .listing()
            .await?;

        let album = listing.id.as_deref().is_some_and(is_album_playlist);
        let total = listing.entries.len() as u32;
        let mut tracks: Vec<ServiceTrack> = listing
            .entries
            .into_iter()
            .map(|e| self.to_service_track(e))
            .collect();

        if album {
            for (position, track) in tracks.iter_mut().enumerate() {
                number_album_track(track, position, total);
            }
        }
        Ok(tracks)
    }
}

impl TrackSearch for YtDlp {
    async fn search(&self, query: &str) -> Result<Vec<ServiceTrack>, ServiceError> {
        let listing = Invocation::new(&self.binary)
            .arg(format!("ytsearch{}:{}", self.search_limit, query))
            .listing()
            .await?;

        Ok(listing
            .entries
            .into_iter()
            .map(|e| self.to_service_track(e))
            .collect())
    }
}

impl AudioFetcher for YtDlp {
    async fn download_audio(
        &self,
        track: &TrackRef,
        output_dir: &Path,
    ) -> Result<PathBuf, ServiceError> {
        if let TrackRef::Spotify { uri } = track {
            return Err(ServiceError::Tool(format!(
                "{} is not a YouTube video and cannot be downloaded",
                uri
            )));
        }

        let stdout = Invocation::new(&self.binary)
            .args(self.options.iter().cloned())
            .args(["--no-playlist", "--no-simulate", "--print", "after_move:filepath", "-P"])
            .arg(output_dir.to_string_lossy())
            .arg(track.url())
            .run()
            .await?;

        ytdlp::downloaded_path(&stdout, output_dir).ok_or_else(|| {
            ServiceError::Tool(format!("{} did not report a file for {}", self.binary, track.url()))
        })
    }
}

/// Accepts a playlist id or any YouTube / YouTube Music playlist URL.
pub fn playlist_url(input: &str) -> String {
    let input = input.trim();
    if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://music.youtube.com/playlist?list={}", input)
    }
}

/// Auto-generated "Artist - Topic" channels carry the artist name.
fn clean_artist(name: &str) -> String {
    name.trim()
        .strip_suffix(" - Topic")
        .unwrap_or(name.trim())
        .to_string()
}

/// YouTube Music album playlists use the `OLAK5uy_` id prefix.
pub fn is_album_playlist(playlist_id: &str) -> bool {
    playlist_id.starts_with("OLAK5uy_")
}

/// Album playlists list the tracks in album order.
pub fn number_album_track(track: &mut ServiceTrack, position: usize, total: u32) {
    if let Some(metadata) = track.metadata.as_mut() {
        metadata.track_number = metadata.track_number.or(Some(position as u32 + 1));
        metadata.total_tracks = metadata.total_tracks.or(Some(total));
    }
}

/// Fills the gaps of fully extracted metadata with what the playlist listing
/// already knew.
pub fn merge_metadata(details: TrackMetadata, listed: TrackMetadata) -> TrackMetadata {
    TrackMetadata {
        artists: if details.artists.is_empty() {
            listed.artists
        } else {
            details.artists
        },
        album_artists: if details.album_artists.is_empty() {
            listed.album_artists
        } else {
            details.album_artists
        },
        title: if details.title.is_empty() {
            listed.title
        } else {
            details.title
        },
        album_title: details.album_title.or(listed.album_title),
        release_year: details.release_year.or(listed.release_year),
        art_url: details.art_url.or(listed.art_url),
        track_number: details.track_number.or(listed.track_number),
        total_tracks: details.total_tracks.or(listed.total_tracks),
        disc_number: details.disc_number.or(listed.disc_number),
        explicit: details.explicit || listed.explicit,
    }
}

fn split_names(names: &str) -> Vec<String> {
    names
        .split(", ")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn to_service_track(entry: YtDlpEntry, thumbnail_quality: ThumbnailQuality) -> ServiceTrack {
    let artists = match entry.artists.filter(|a| !a.is_empty()) {
        Some(list) => list,
        None => entry
            .artist
            .as_deref()
            .or(entry.channel.as_deref())
            .or(entry.uploader.as_deref())
            .map(clean_artist)
            .map(|a| split_names(&a))
            .unwrap_or_default(),
    };
    let album_artists = match entry.album_artists.filter(|a| !a.is_empty()) {
        Some(list) => list,
        None => entry
            .album_artist
            .as_deref()
            .map(split_names)
            .unwrap_or_default(),
    };

    let title = entry.track.or(entry.title).unwrap_or_default();
    let duration_seconds = entry.duration.filter(|d| *d >= 0.0).map(|d| d.round() as u32);
    let release_year = entry.release_year.map(|y| y.to_string()).or_else(|| {
        entry
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
    });

    let metadata = TrackMetadata {
        artists: artists.clone(),
        album_artists,
        title: title.clone(),
        album_title: entry.album.clone(),
        release_year,
        art_url: Some(thumbnail_quality.thumbnail_url(&entry.id)),
        track_number: entry.track_number.filter(|n| *n > 0),
        disc_number: entry.disc_number.filter(|n| *n > 0),
        ..TrackMetadata::default()
    };

    ServiceTrack {
        descriptor: TrackDescriptor {
            title,
            artist: artists.join(", "),
            album: entry.album,
            duration_seconds,
        },
        reference: TrackRef::YouTube { video_id: entry.id },
        metadata: Some(metadata),
    }
}
