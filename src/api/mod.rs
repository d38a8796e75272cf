//! # API Module
//!
//! HTTP endpoints of the short-lived local server started by
//! `playlist-master auth`.
//!
//! - [`callback`] - receives the authorization code from Spotify and completes
//!   the PKCE exchange
//! - [`health`] - reports status and version, handy to check that the redirect
//!   URI points at the right address

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
