//! Credential authority client
//!
//! A session credential is requested with `POST /token` carrying the room
//! and participant names, and comes back as a connection URL plus an opaque
//! access token.

pub mod client;
pub mod messages;

pub use client::{Credential, CredentialError, CredentialSource, HttpCredentialFetcher};
pub use messages::{AuthorityErrorBody, TokenRequest, TokenResponse};
