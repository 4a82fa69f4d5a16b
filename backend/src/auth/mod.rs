//! Google sign-in.
//!
//! This module provides:
//! - `OidcClient` for the authorization-code flow against the provider
//! - the signed-cookie `SessionData` the flow writes into
//! - the `/` and `/id_token` handlers

mod client;
pub mod handlers;
pub mod session;
pub mod types;

pub use client::{verify_state, AuthError, OidcClient, LOGIN_SCOPES};
pub use handlers::{home, id_token};
pub use session::{SessionData, SESSION_COOKIE};
