//! HTTP request handlers for the formgate API.
//!
//! Handlers are grouped by functionality:
//! - `gateway` - the generic handler behind every endpoint table row
//! - `readiness` - questionnaire listing that degrades to an empty list
//! - `revalidate` - secret-protected page cache invalidation
//! - `health` - health check and readiness probes
//!
//! # Error Handling
//!
//! Gateway responses are always the `{ok, ...}` envelope. Internal error
//! text is logged and never returned.

pub mod gateway;
pub mod health;
pub mod readiness;
pub mod revalidate;

pub use health::{health_check, liveness_check, readiness_check};
pub use revalidate::revalidate;
