use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{Res, api, config, types::PkceToken};

/// Callback state shared with the handler: the pending PKCE exchange and the
/// client id the code was requested for.
#[derive(Clone)]
pub struct CallbackState {
    pub pkce: Arc<Mutex<Option<PkceToken>>>,
    pub client_id: String,
}

pub async fn start_api_server(state: Arc<Mutex<Option<PkceToken>>>, client_id: String) -> Res<()> {
    let app = Router::new()
        .route("/health", get(api::health))
        .route(
            "/callback",
            get(api::callback).layer(Extension(CallbackState {
                pkce: state,
                client_id,
            })),
        );

    let addr = SocketAddr::from_str(&config::server_addr())
        .map_err(|e| format!("Failed to parse server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
