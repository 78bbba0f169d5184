//! Outbound HTTP for formgate.
//!
//! Three clients, each holding its own connection pool:
//!
//! - [`UpstreamClient`] forwards translated submissions to the backend API
//! - [`ChallengeVerifier`] checks bot challenge tokens
//! - [`WebhookNotifier`] fans successful submissions out to side channels
//!
//! None of them retry. A failed call is surfaced to the browser at once,
//! and the browser decides whether to try again.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod notify;
pub mod verifier;

pub use client::{endpoint_url, ClientConfig, UpstreamCall, UpstreamClient, UpstreamResponse};
pub use error::{Result, UpstreamError};
pub use notify::{WebhookNotifier, WebhookTarget};
pub use verifier::{ChallengeVerifier, VerifierConfig, DEFAULT_VERIFY_URL};
