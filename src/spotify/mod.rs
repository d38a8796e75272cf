//! # Spotify Integration Module
//!
//! Thin client for the parts of the Spotify Web API that playlist-master needs:
//!
//! - [`auth`] - client-credentials tokens for reads and the OAuth 2.0 PKCE flow
//!   for writes to the user's playlists
//! - [`playlist`] - reading playlist tracks, creating playlists, adding tracks
//! - [`search`] - track search used as the candidate list for the matcher
//!
//! All requests go through [`send`], which maps HTTP statuses onto
//! [`ServiceError`] and handles the two transient cases Spotify produces in
//! practice: `429 Too Many Requests` (honouring `Retry-After` up to two
//! minutes) and `502 Bad Gateway` (retried after ten seconds).

pub mod auth;
pub mod playlist;
pub mod search;

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::{sync::Mutex, time::sleep};

use crate::{
    config::Credentials,
    debug,
    management::TokenManager,
    service::{PlaylistSink, PlaylistSource, ServiceError, TrackSearch},
    types::{ServiceTrack, TrackRef},
    warning,
};

const MAX_RETRY_AFTER: u64 = 120;
const BAD_GATEWAY_RETRIES: u32 = 3;
// refresh the app token this many seconds before Spotify expires it
const APP_TOKEN_MARGIN: u64 = 60;

struct CachedToken {
    access_token: String,
    expires_at: u64,
}

pub struct SpotifyClient {
    http: Client,
    credentials: Option<Credentials>,
    app_token: Mutex<Option<CachedToken>>,
    search_limit: u32,
}

impl SpotifyClient {
    pub fn new(credentials: Option<Credentials>, search_limit: u32) -> Self {
        Self {
            http: Client::new(),
            credentials,
            app_token: Mutex::new(None),
            search_limit,
        }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Client-credentials token for catalog reads, cached until shortly before
    /// it expires.
    pub async fn app_token(&self) -> Result<String, ServiceError> {
        let mut cached = self.app_token.lock().await;
        let now = Utc::now().timestamp() as u64;

        if let Some(token) = cached.as_ref() {
            if now < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ServiceError::Auth(
                "no Spotify client id/secret; use --sp-oauth or the [sp-oauth] config section"
                    .to_string(),
            )
        })?;

        let token = auth::client_credentials_token(&self.http, credentials).await?;
        debug!("obtained Spotify app token valid for {}s", token.expires_in);

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in.saturating_sub(APP_TOKEN_MARGIN),
        });
        Ok(access_token)
    }

    /// Token of the user that authorized through `playlist-master auth`.
    pub async fn user_token(&self) -> Result<String, ServiceError> {
        let mut token_mgr = TokenManager::load().await.map_err(|e| {
            ServiceError::Auth(format!(
                "failed to load token, please run playlist-master auth ({})",
                e
            ))
        })?;
        token_mgr.get_valid_token().await
    }
}

impl PlaylistSource for SpotifyClient {
    async fn fetch_playlist(&self, playlist_id: &str) -> Result<Vec<ServiceTrack>, ServiceError> {
        playlist::get_playlist_tracks(self, &parse_playlist_id(playlist_id)).await
    }
}

impl TrackSearch for SpotifyClient {
    async fn search(&self, query: &str) -> Result<Vec<ServiceTrack>, ServiceError> {
        search::search_tracks(self, query, self.search_limit).await
    }
}

impl PlaylistSink for SpotifyClient {
    async fn add_to_playlist(
        &self,
        playlist_id: &str,
        tracks: &[TrackRef],
    ) -> Result<(), ServiceError> {
        let uris: Vec<String> = tracks
            .iter()
            .filter_map(|t| match t {
                TrackRef::Spotify { uri } => Some(uri.clone()),
                TrackRef::YouTube { .. } => None,
            })
            .collect();

        playlist::add_tracks(self, &parse_playlist_id(playlist_id), &uris).await
    }
}

/// Accepts a bare playlist id, a `spotify:playlist:` URI or an
/// `open.spotify.com` link.
pub fn parse_playlist_id(input: &str) -> String {
    let input = input.trim();
    if let Some(id) = input.strip_prefix("spotify:playlist:") {
        return id.to_string();
    }

    if input.contains("open.spotify.com") {
        if let Some(rest) = input.split("/playlist/").nth(1) {
            let end = rest.find(['?', '/', '#']).unwrap_or(rest.len());
            return rest[..end].to_string();
        }
    }

    input.to_string()
}

/// Sends the request built by `build`, retrying on rate limits and bad
/// gateways.
pub(crate) async fn send<F>(build: F, what: &str) -> Result<Response, ServiceError>
where
    F: Fn() -> RequestBuilder,
{
    let mut bad_gateways = 0;

    loop {
        let response = build().send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after(&response);
                if retry_after > MAX_RETRY_AFTER {
                    warning!(
                        "Retry after has reached an abnormal high of {} seconds. Try again later.",
                        retry_after
                    );
                    return Err(ServiceError::RateLimited { retry_after });
                }
                debug!("rate limited on {}, waiting {}s", what, retry_after);
                sleep(Duration::from_secs(retry_after)).await;
            }
            StatusCode::BAD_GATEWAY if bad_gateways < BAD_GATEWAY_RETRIES => {
                bad_gateways += 1;
                sleep(Duration::from_secs(10)).await;
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ServiceError::Auth(format!("{} ({})", what, status)));
            }
            StatusCode::NOT_FOUND => return Err(ServiceError::NotFound(what.to_string())),
            _ => {
                return match response.error_for_status() {
                    Ok(r) => Ok(r),
                    Err(e) => Err(e.into()),
                };
            }
        }
    }
}

fn retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(1)
}
