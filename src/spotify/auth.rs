use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    config::{self, Credentials},
    info,
    management::TokenManager,
    server::start_api_server,
    service::ServiceError,
    types::{AppToken, PkceToken, Token},
    utils, warning,
};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    scope: Option<String>,
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn into_token(self, previous_refresh: Option<&str>, client_id: &str) -> Token {
        Token {
            access_token: self.access_token,
            // refresh responses may omit the refresh token; the old one stays valid
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string))
                .unwrap_or_default(),
            scope: self.scope.unwrap_or_default(),
            expires_in: self.expires_in.unwrap_or(3600),
            obtained_at: Utc::now().timestamp() as u64,
            client_id: client_id.to_string(),
        }
    }
}

/// Runs the OAuth 2.0 PKCE flow and persists the resulting user token.
///
/// 1. Generates the code verifier and its SHA256 challenge
/// 2. Starts the local callback server
/// 3. Opens the authorization URL in the browser
/// 4. Waits up to 60 seconds for the callback to store a token
/// 5. Persists the token for later playlist writes
///
/// The user token is only needed by `convert`, which writes to the user's
/// playlists; reading playlists and searching use client credentials.
///
/// # Errors
///
/// Fails when no client id is configured, the browser flow times out or the
/// token cannot be written to the cache.
pub async fn auth(
    shared_state: Arc<Mutex<Option<PkceToken>>>,
    client_id: &str,
) -> Result<(), ServiceError> {
    // generate PKCE verifier and challenge
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    // start API server
    let server_state = Arc::clone(&shared_state);
    let server_client_id = client_id.to_string();
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state, server_client_id).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = reqwest::Url::parse_with_params(
        &config::spotify_apiauth_url(),
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", config::spotify_redirect_uri().as_str()),
            ("code_challenge", code_challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("scope", config::spotify_scope().as_str()),
        ],
    )
    .map_err(|e| ServiceError::Auth(format!("invalid authorization url: {}", e)))?;

    // Store verifier in shared state before redirect
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier: code_verifier.clone(),
            token: None,
        });
    }

    info!("Waiting for Spotify authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state)
        .await
        .ok_or_else(|| ServiceError::Auth("authentication failed or timed out".to_string()))?;

    TokenManager::new(token)
        .persist()
        .await
        .map_err(|e| ServiceError::Write(format!("failed to save token to cache: {}", e)))
}

/// Polls the shared state once a second, for at most 60 seconds, until the
/// callback handler has stored a token.
async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let max_wait = Duration::from_secs(60);
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|p| p.token.as_ref()) {
            return Some(token.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges a refresh token for a new access token.
pub async fn refresh_token(
    http: &Client,
    refresh_token: &str,
    client_id: &str,
) -> Result<Token, ServiceError> {
    let response = http
        .post(config::spotify_apitoken_url())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ])
        .send()
        .await?
        .error_for_status()
        .map_err(|e| ServiceError::Auth(format!("token refresh rejected: {}", e)))?;

    let json = response.json::<TokenResponse>().await?;
    Ok(json.into_token(Some(refresh_token), client_id))
}

/// Completes the PKCE flow by exchanging the authorization code together with
/// the verifier generated at the start of the flow.
pub async fn exchange_code_pkce(
    code: &str,
    verifier: &str,
    client_id: &str,
) -> Result<Token, ServiceError> {
    let redirect_uri = config::spotify_redirect_uri();

    let response = Client::new()
        .post(config::spotify_apitoken_url())
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await?
        .error_for_status()
        .map_err(|e| ServiceError::Auth(format!("code exchange rejected: {}", e)))?;

    let json = response.json::<TokenResponse>().await?;
    Ok(json.into_token(None, client_id))
}

/// Client-credentials grant: an app token that can read public catalog data
/// and playlists but cannot act on behalf of a user.
pub async fn client_credentials_token(
    http: &Client,
    credentials: &Credentials,
) -> Result<AppToken, ServiceError> {
    let response = http
        .post(config::spotify_apitoken_url())
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ServiceError::Auth(format!(
            "client credentials rejected ({})",
            response.status()
        )));
    }

    Ok(response.json::<AppToken>().await?)
}
