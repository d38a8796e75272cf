use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Service-independent description of a song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl TrackDescriptor {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_seconds: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

/// Outcome of matching one source track against a candidate list.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched {
        /// Position of the accepted candidate in the input sequence.
        index: usize,
        candidate: TrackDescriptor,
        score: f64,
    },
    NoMatch {
        best_score: f64,
    },
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    pub fn score(&self) -> f64 {
        match self {
            MatchResult::Matched { score, .. } => *score,
            MatchResult::NoMatch { best_score } => *best_score,
        }
    }

    pub fn candidate(&self) -> Option<&TrackDescriptor> {
        match self {
            MatchResult::Matched { candidate, .. } => Some(candidate),
            MatchResult::NoMatch { .. } => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            MatchResult::Matched { index, .. } => Some(*index),
            MatchResult::NoMatch { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackRef {
    Spotify { uri: String },
    YouTube { video_id: String },
}

impl TrackRef {
    pub fn url(&self) -> String {
        match self {
            TrackRef::Spotify { uri } => uri.clone(),
            TrackRef::YouTube { video_id } => {
                format!("https://music.youtube.com/watch?v={}", video_id)
            }
        }
    }
}

/// Tag payload written into downloaded files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub artists: Vec<String>,
    pub album_artists: Vec<String>,
    pub title: String,
    pub album_title: Option<String>,
    pub release_year: Option<String>,
    pub art_url: Option<String>,
    pub track_number: Option<u32>,
    pub total_tracks: Option<u32>,
    pub disc_number: Option<u32>,
    pub explicit: bool,
}

/// A track as returned by a service: what it is, where it lives, and
/// whatever tagging metadata the service provided.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceTrack {
    pub descriptor: TrackDescriptor,
    pub reference: TrackRef,
    pub metadata: Option<TrackMetadata>,
}

impl ServiceTrack {
    pub fn is_explicit(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.explicit)
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub title: String,
    pub artist: String,
    #[tabled(rename = "match")]
    pub matched: String,
    pub score: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
    /// Client the token was issued to; refreshing needs it.
    #[serde(default)]
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppToken {
    pub access_token: String,
    pub expires_in: u64,
}

// Spotify Web API payloads

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksResponse {
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    // Kept raw: episodes and local files do not share the track shape.
    pub track: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub tracks: SearchTracks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTracks {
    pub items: Vec<SpotifyTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub disc_number: u32,
    pub artists: Vec<SpotifyArtist>,
    pub album: SpotifyAlbum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    pub release_date: Option<String>,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

// yt-dlp `-J --flat-playlist` output

#[derive(Debug, Clone, Deserialize)]
pub struct YtDlpListing {
    pub id: Option<String>,
    #[serde(default)]
    pub entries: Vec<YtDlpEntry>,
}

/// One video as printed by `yt-dlp -J`. Flat playlist entries only carry the
/// first few fields; the music fields come with full extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct YtDlpEntry {
    pub id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub channel: Option<String>,
    pub uploader: Option<String>,
    pub album: Option<String>,
    pub duration: Option<f64>,
    pub track: Option<String>,
    pub artists: Option<Vec<String>>,
    pub album_artist: Option<String>,
    pub album_artists: Option<Vec<String>>,
    pub release_year: Option<u32>,
    /// `YYYYMMDD`
    pub release_date: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
}
