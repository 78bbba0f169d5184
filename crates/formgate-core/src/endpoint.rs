//! Declarative description of one gateway endpoint.
//!
//! An [`EndpointSpec`] is plain data: it is built in `const` context so the
//! whole route table lives in a `static` and costs nothing at startup.

use std::time::Duration;

use crate::{translate::FieldMap, validation::Rule, JsonMap};

/// Message returned when a request fails validation and the endpoint does not
/// override it.
pub const DEFAULT_INVALID_MESSAGE: &str = "Missing required fields.";

/// HTTP method accepted locally. Upstream calls use the same method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Inputs come from the query string; upstream call has no body.
    Get,
    /// Inputs come from a JSON body; upstream call carries the translated body.
    Post,
}

/// Bot-verification requirement for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCheck {
    /// Internal or already-authenticated endpoint.
    Skip,
    /// Third-party challenge verification only.
    Verify,
    /// Bypass credentials are honored before the challenge is verified.
    VerifyOrBypass,
}

/// How upstream failure statuses are reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Caller sees the upstream status.
    Mirror,
    /// Caller always sees 502 Bad Gateway.
    Gateway,
}

/// Execution strategy for the upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single call against the primary base URL.
    Proxy,
    /// Try each configured base URL until one answers.
    Failover,
    /// Never fail: fall back to an empty listing.
    Degrade,
}

/// Side-channel webhook fired after a successful upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    /// CRM lead webhook.
    Crm,
    /// Marketing automation webhook.
    Automation,
}

impl Notify {
    /// Envelope field that reports whether the webhook accepted the payload.
    pub const fn result_key(self) -> &'static str {
        match self {
            Self::Crm => "crmDelivered",
            Self::Automation => "automationDelivered",
        }
    }
}

/// One piece of an upstream path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Fixed text. May contain `/` to cover several path segments.
    Literal(&'static str),
    /// Substituted from the named inbound field.
    Param(&'static str),
}

/// Upstream path relative to the configured base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamPath(pub &'static [Segment]);

impl UpstreamPath {
    /// Resolves the path into individual, unescaped segments.
    ///
    /// Returns `None` when a parameter is missing or not a scalar. Callers are
    /// expected to percent-encode each segment.
    pub fn render(&self, input: &JsonMap) -> Option<Vec<String>> {
        let mut segments = Vec::new();
        for segment in self.0 {
            match segment {
                Segment::Literal(text) => {
                    segments.extend(text.split('/').filter(|s| !s.is_empty()).map(String::from));
                },
                Segment::Param(field) => {
                    let value = match input.get(*field)? {
                        serde_json::Value::String(s) if !s.is_empty() => s.clone(),
                        serde_json::Value::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    segments.push(value);
                },
            }
        }
        Some(segments)
    }

    /// Human-readable template such as `/public/tests/{testId}/results`.
    pub fn template(&self) -> String {
        let mut out = String::new();
        for segment in self.0 {
            out.push('/');
            match segment {
                Segment::Literal(text) => out.push_str(text.trim_matches('/')),
                Segment::Param(field) => {
                    out.push('{');
                    out.push_str(field);
                    out.push('}');
                },
            }
        }
        out
    }
}

/// Full description of a gateway endpoint.
#[derive(Debug, Clone, Copy)]
pub struct EndpointSpec {
    /// Short name used in logs, e.g. `stripe.invoice`.
    pub name: &'static str,
    /// Local route, e.g. `/api/stripe/invoice`.
    pub route: &'static str,
    /// Accepted method.
    pub method: Method,
    /// Upstream path.
    pub upstream: UpstreamPath,
    /// Validation rules, checked in order.
    pub rules: &'static [Rule],
    /// Error text when validation fails.
    pub invalid_message: &'static str,
    /// Field translation into the upstream body.
    pub fields: &'static [FieldMap],
    /// Copy every inbound field before applying `fields`.
    pub forward_unmapped: bool,
    /// Bot verification requirement.
    pub bot_check: BotCheck,
    /// Failure status policy.
    pub status_policy: StatusPolicy,
    /// Latency budget for the upstream call.
    pub timeout: Option<Duration>,
    /// Error text when the upstream failure body carries none.
    pub default_error: &'static str,
    /// Protected by the rate-limit token guard.
    pub rate_limited: bool,
    /// Webhook fired after success.
    pub notify: Option<Notify>,
    /// Call strategy.
    pub mode: Mode,
}

impl EndpointSpec {
    const fn new(
        name: &'static str,
        route: &'static str,
        method: Method,
        upstream: &'static [Segment],
    ) -> Self {
        Self {
            name,
            route,
            method,
            upstream: UpstreamPath(upstream),
            rules: &[],
            invalid_message: DEFAULT_INVALID_MESSAGE,
            fields: &[],
            forward_unmapped: false,
            bot_check: BotCheck::Skip,
            status_policy: StatusPolicy::Mirror,
            timeout: None,
            default_error: "Request failed.",
            rate_limited: false,
            notify: None,
            mode: Mode::Proxy,
        }
    }

    /// Starts a POST endpoint with permissive defaults.
    pub const fn post(
        name: &'static str,
        route: &'static str,
        upstream: &'static [Segment],
    ) -> Self {
        Self::new(name, route, Method::Post, upstream)
    }

    /// Starts a GET endpoint with permissive defaults.
    pub const fn get(
        name: &'static str,
        route: &'static str,
        upstream: &'static [Segment],
    ) -> Self {
        Self::new(name, route, Method::Get, upstream)
    }

    /// Sets validation rules and the message returned when they fail.
    pub const fn rules(mut self, rules: &'static [Rule], message: &'static str) -> Self {
        self.rules = rules;
        self.invalid_message = message;
        self
    }

    /// Sets the upstream field mapping.
    pub const fn fields(mut self, fields: &'static [FieldMap]) -> Self {
        self.fields = fields;
        self
    }

    /// Forwards every inbound field, then applies the mapping.
    pub const fn forward_unmapped(mut self) -> Self {
        self.forward_unmapped = true;
        self
    }

    /// Sets the bot verification requirement.
    pub const fn bot_check(mut self, check: BotCheck) -> Self {
        self.bot_check = check;
        self
    }

    /// Reports every upstream failure as 502.
    pub const fn gateway_status(mut self) -> Self {
        self.status_policy = StatusPolicy::Gateway;
        self
    }

    /// Bounds the upstream call.
    pub const fn timeout_ms(mut self, millis: u64) -> Self {
        self.timeout = Some(Duration::from_millis(millis));
        self
    }

    /// Sets the fallback upstream error message.
    pub const fn default_error(mut self, message: &'static str) -> Self {
        self.default_error = message;
        self
    }

    /// Puts the endpoint behind the rate-limit token guard.
    pub const fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }

    /// Fires a webhook after a successful upstream call.
    pub const fn notify(mut self, notify: Notify) -> Self {
        self.notify = Some(notify);
        self
    }

    /// Sets the call strategy.
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}
