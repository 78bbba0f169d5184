//! Inbound-to-upstream field translation.

use serde_json::Value;

use crate::{bypass::BOT_TOKEN_FIELD, endpoint::EndpointSpec, validation::is_truthy, JsonMap};

/// Value adjustment applied while copying a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Copy as-is; missing becomes `null`.
    Verbatim,
    /// Trim surrounding whitespace from strings.
    Trim,
    /// Replace falsy values with a fixed string.
    Fallback(&'static str),
    /// Replace falsy values with `null`.
    NullIfFalsy,
}

impl Transform {
    fn apply(self, value: Option<&Value>) -> Value {
        match (self, value) {
            (Self::Fallback(fallback), v) if !v.is_some_and(is_truthy) => {
                Value::String(fallback.to_string())
            },
            (Self::NullIfFalsy, v) if !v.is_some_and(is_truthy) => Value::Null,
            (Self::Trim, Some(Value::String(s))) => Value::String(s.trim().to_string()),
            (_, Some(v)) => v.clone(),
            (_, None) => Value::Null,
        }
    }
}

/// Copies one inbound field into the upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    /// Inbound field name.
    pub from: &'static str,
    /// Upstream field name.
    pub to: &'static str,
    /// Adjustment applied to the value.
    pub transform: Transform,
}

impl FieldMap {
    /// Copies `from` into `to` unchanged.
    pub const fn rename(from: &'static str, to: &'static str) -> Self {
        Self { from, to, transform: Transform::Verbatim }
    }

    /// Copies a field whose name is the same on both sides.
    pub const fn keep(name: &'static str) -> Self {
        Self::rename(name, name)
    }

    /// Trims string values.
    pub const fn trimmed(mut self) -> Self {
        self.transform = Transform::Trim;
        self
    }

    /// Substitutes `fallback` for falsy values.
    pub const fn or(mut self, fallback: &'static str) -> Self {
        self.transform = Transform::Fallback(fallback);
        self
    }

    /// Sends `null` for falsy values.
    pub const fn or_null(mut self) -> Self {
        self.transform = Transform::NullIfFalsy;
        self
    }
}

/// Builds the upstream body for `spec` from a validated inbound body.
pub fn translate(body: &JsonMap, spec: &EndpointSpec) -> JsonMap {
    let mut out = JsonMap::new();

    if spec.forward_unmapped {
        out.extend(
            body.iter()
                .filter(|(key, _)| key.as_str() != BOT_TOKEN_FIELD)
                .map(|(key, value)| (key.clone(), value.clone())),
        );
    }

    for field in spec.fields {
        out.insert(field.to.to_string(), field.transform.apply(body.get(field.from)));
    }

    out
}
