//! Domain model for the formgate submission gateway.
//!
//! Every public form endpoint of the marketing site is described by a row
//! in a static table ([`catalog::ENDPOINTS`]). A row says which fields are
//! required, how inbound names map onto the backend API's names, whether bot
//! verification applies and how upstream failures are reported. The HTTP
//! layer drives all rows through one generic pipeline:
//!
//! 1. **Parse** - body or query string into a JSON object ([`inbound`])
//! 2. **Validate** - ordered rules, first failure wins ([`validation`])
//! 3. **Bot gate** - bypass credentials, then challenge ([`bypass`])
//! 4. **Translate** - inbound names to upstream names ([`translate`])
//! 5. **Envelope** - upstream reply to `{ok, ...}` ([`envelope`])
//!
//! Nothing in this crate performs I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bypass;
pub mod catalog;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod inbound;
pub mod translate;
pub mod validation;

pub use bypass::{should_bypass, BypassCredentials};
pub use endpoint::{
    BotCheck, EndpointSpec, Method, Mode, Notify, Segment, StatusPolicy, UpstreamPath,
};
pub use envelope::Envelope;
pub use error::{GatewayError, Result};
pub use translate::{translate, FieldMap, Transform};
pub use validation::{validate, Rule, ValidationFailure};

/// JSON object type used for inbound and upstream payloads.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
