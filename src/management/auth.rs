use std::path::PathBuf;

use chrono::Utc;
use reqwest::Client;

use crate::{config, service::ServiceError, spotify, types::Token, warning};

// refresh this many seconds before the token actually expires
const EXPIRY_MARGIN: u64 = 240;

pub struct TokenManager {
    token: Token,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager { token }
    }

    pub async fn load() -> Result<Self, String> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(path, json).await.map_err(|e| e.to_string())
    }

    /// Access token, refreshed and re-persisted first when it is about to
    /// expire.
    pub async fn get_valid_token(&mut self) -> Result<String, ServiceError> {
        if self.is_expired() {
            let client_id = if self.token.client_id.is_empty() {
                config::spotify_client_id().unwrap_or_default()
            } else {
                self.token.client_id.clone()
            };

            let new_token =
                spotify::auth::refresh_token(&Client::new(), &self.token.refresh_token, &client_id)
                    .await?;
            self.token = new_token;
            if let Err(e) = self.persist().await {
                warning!("Failed to save refreshed token: {}", e);
            }
        }

        Ok(self.token.access_token.clone())
    }

    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN >= self.token.obtained_at + self.token.expires_in
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("playlist-master/cache/token.json");
        path
    }
}
