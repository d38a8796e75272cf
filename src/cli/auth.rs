use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    config::{self, Settings},
    error, spotify, success,
    types::PkceToken,
};

pub async fn auth(settings: &Settings) {
    let client_id = match settings
        .credentials
        .as_ref()
        .map(|c| c.client_id.clone())
        .or_else(config::spotify_client_id)
    {
        Some(id) => id,
        None => error!(
            "No Spotify client id configured. Set SPOTIFY_API_AUTH_CLIENT_ID in {} or the [sp-oauth] section.",
            config::env_path().display()
        ),
    };

    let shared_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
    match spotify::auth::auth(shared_state, &client_id).await {
        Ok(()) => success!("Authorization successful."),
        Err(e) => error!("Authorization failed: {}", e),
    }
}
