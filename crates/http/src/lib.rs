//! Questscribe HTTP client
//!
//! A thin, typed client for the storytelling backend. Authorization decisions
//! are always made by the server; this crate only carries the credential.

pub mod client;

pub use client::error::ClientError;
pub use client::{ApiClient, ApiClientBuilder};
