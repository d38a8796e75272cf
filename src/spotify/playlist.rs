use crate::{
    config, debug,
    service::ServiceError,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        CreatePlaylistResponse, CurrentUserResponse, PlaylistTracksResponse, ServiceTrack,
        SpotifyTrack, TrackDescriptor, TrackMetadata, TrackRef,
    },
    utils, warning,
};

use super::{SpotifyClient, send};

const PAGE_SIZE: u32 = 100;
const ADD_CHUNK_SIZE: usize = 100;

/// Retrieves every track of a playlist, following the `next` links.
///
/// Items without a usable track object (removed tracks, local files, podcast
/// episodes) are skipped with a warning instead of failing the whole playlist.
pub async fn get_playlist_tracks(
    client: &SpotifyClient,
    playlist_id: &str,
) -> Result<Vec<ServiceTrack>, ServiceError> {
    let token = client.app_token().await?;
    let what = format!("playlist {}", playlist_id);

    let mut url = format!(
        "{uri}/playlists/{id}/tracks?limit={limit}",
        uri = config::spotify_apiurl(),
        id = playlist_id,
        limit = PAGE_SIZE
    );
    let mut tracks = Vec::new();

    loop {
        let response = send(|| client.http().get(&url).bearer_auth(&token), &what).await?;
        let page = response.json::<PlaylistTracksResponse>().await?;
        debug!(
            "fetched {} of {} playlist items",
            tracks.len() + page.items.len(),
            page.total.unwrap_or_default()
        );

        for item in page.items {
            match item.track.map(serde_json::from_value::<SpotifyTrack>) {
                Some(Ok(track)) => tracks.push(to_service_track(track)),
                Some(Err(e)) => warning!("unable to retrieve track: {}", e),
                None => warning!("unable to retrieve track"),
            }
        }

        match page.next {
            Some(next) => url = next,
            None => break,
        }
    }

    Ok(tracks)
}

/// Creates a private playlist owned by the authorized user.
pub async fn create(
    client: &SpotifyClient,
    name: &str,
    description: &str,
) -> Result<CreatePlaylistResponse, ServiceError> {
    let token = client.user_token().await?;
    let user_id = match config::spotify_user() {
        Some(user) => user,
        None => current_user_id(client, &token).await?,
    };

    let api_url = format!(
        "{uri}/users/{user_id}/playlists",
        uri = config::spotify_apiurl(),
        user_id = user_id
    );
    let body = CreatePlaylistRequest {
        name: name.to_string(),
        description: description.to_string(),
        public: false,
        collaborative: false,
    };

    let response = send(
        || client.http().post(&api_url).bearer_auth(&token).json(&body),
        "create playlist",
    )
    .await
    .map_err(as_write_error)?;

    Ok(response.json::<CreatePlaylistResponse>().await?)
}

/// Appends tracks in chunks of 100, the most Spotify accepts per request.
pub async fn add_tracks(
    client: &SpotifyClient,
    playlist_id: &str,
    uris: &[String],
) -> Result<(), ServiceError> {
    if uris.is_empty() {
        return Ok(());
    }

    let token = client.user_token().await?;
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = config::spotify_apiurl(),
        id = playlist_id
    );
    let what = format!("playlist {}", playlist_id);

    for chunk in uris.chunks(ADD_CHUNK_SIZE) {
        let body = AddTrackToPlaylistRequest {
            uris: chunk.to_vec(),
        };
        let response = send(
            || client.http().post(&api_url).bearer_auth(&token).json(&body),
            &what,
        )
        .await
        .map_err(as_write_error)?;

        let snapshot = response.json::<AddTrackToPlaylistResponse>().await?;
        debug!("playlist {} now at snapshot {}", playlist_id, snapshot.snapshot_id);
    }

    Ok(())
}

async fn current_user_id(client: &SpotifyClient, token: &str) -> Result<String, ServiceError> {
    let api_url = format!("{uri}/me", uri = config::spotify_apiurl());
    let response = send(|| client.http().get(&api_url).bearer_auth(token), "current user").await?;
    Ok(response.json::<CurrentUserResponse>().await?.id)
}

fn as_write_error(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::Http(e) => ServiceError::Write(e.to_string()),
        other => other,
    }
}

/// Maps a Spotify track onto the matcher descriptor and the tagging metadata.
pub fn to_service_track(track: SpotifyTrack) -> ServiceTrack {
    let artists: Vec<String> = track.artists.iter().map(|a| a.name.clone()).collect();
    let album = &track.album;

    let album_artists = if album.album_type == "compilation" {
        vec!["Various Artists".to_string()]
    } else {
        album.artists.iter().map(|a| a.name.clone()).collect()
    };

    let metadata = TrackMetadata {
        artists: artists.clone(),
        album_artists,
        title: track.name.clone(),
        album_title: (album.album_type != "single").then(|| album.name.clone()),
        release_year: utils::release_year(album.release_date.as_deref()),
        art_url: album.images.first().map(|i| i.url.clone()),
        track_number: Some(track.track_number).filter(|n| *n > 0),
        total_tracks: Some(album.total_tracks).filter(|n| *n > 0),
        disc_number: Some(track.disc_number).filter(|n| *n > 0),
        explicit: track.explicit,
    };

    let descriptor = TrackDescriptor {
        title: track.name,
        artist: artists.first().cloned().unwrap_or_default(),
        album: Some(track.album.name).filter(|a| !a.is_empty()),
        duration_seconds: Some(((track.duration_ms + 500) / 1000) as u32),
    };

    ServiceTrack {
        descriptor,
        reference: TrackRef::Spotify { uri: track.uri },
        metadata: Some(metadata),
    }
}
