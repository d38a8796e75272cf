use crate::{
    config,
    service::ServiceError,
    types::{SearchResponse, ServiceTrack},
};

use super::{SpotifyClient, playlist::to_service_track, send};

/// Track search; results keep Spotify's relevance order.
pub async fn search_tracks(
    client: &SpotifyClient,
    query: &str,
    limit: u32,
) -> Result<Vec<ServiceTrack>, ServiceError> {
    let token = client.app_token().await?;
    let api_url = format!("{uri}/search", uri = config::spotify_apiurl());
    let limit = limit.clamp(1, 50).to_string();

    let response = send(
        || {
            client
                .http()
                .get(&api_url)
                .bearer_auth(&token)
                .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
        },
        "search",
    )
    .await?;

    let json = response.json::<SearchResponse>().await?;
    Ok(json.tracks.items.into_iter().map(to_service_track).collect())
}
