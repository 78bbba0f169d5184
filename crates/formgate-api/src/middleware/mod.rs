//! HTTP middleware applied ahead of the gateway handler.
//!
//! Provides the rate-limit token guard used by the high-volume public forms
//! (bug reports, chat, newsletter).
pub mod rate_limit;
