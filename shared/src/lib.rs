//! Payload types exchanged between the sign-in server and its clients.

pub mod api;

pub use api::{ErrorResponse, IdTokenResponse, LoginStatusResponse};
