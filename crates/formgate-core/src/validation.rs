//! Required-field validation.
//!
//! Rules are checked in order and the first failure wins. A missing body is
//! validated like an empty object, so every rule on it fails.

use serde_json::Value;

use crate::JsonMap;

/// A single requirement on an inbound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Field must be truthy: present and not `null`, `false`, `0` or `""`.
    Present(&'static str),
    /// Field must be a string with at least `n` characters after trimming.
    MinTrimmedLen(&'static str, usize),
    /// Field must be an array with at least one element.
    NonEmptyArray(&'static str),
}

impl Rule {
    /// Field the rule applies to.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Present(field) | Self::MinTrimmedLen(field, _) | Self::NonEmptyArray(field) => {
                field
            },
        }
    }

    fn check(&self, body: &JsonMap) -> bool {
        let value = body.get(self.field());
        match self {
            Self::Present(_) => value.is_some_and(is_truthy),
            Self::MinTrimmedLen(_, min) => value
                .and_then(Value::as_str)
                .is_some_and(|s| s.trim().chars().count() >= *min),
            Self::NonEmptyArray(_) => {
                value.and_then(Value::as_array).is_some_and(|items| !items.is_empty())
            },
        }
    }
}

/// The rule that rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationFailure {
    /// First failing rule.
    pub rule: Rule,
}

impl ValidationFailure {
    /// Name of the offending field, for logs.
    pub const fn field(&self) -> &'static str {
        self.rule.field()
    }
}

/// Checks `body` against `rules`.
///
/// # Errors
///
/// Returns the first rule that does not hold.
pub fn validate(body: Option<&JsonMap>, rules: &[Rule]) -> Result<(), ValidationFailure> {
    let empty = JsonMap::new();
    let body = body.unwrap_or(&empty);

    match rules.iter().find(|rule| !rule.check(body)) {
        Some(rule) => Err(ValidationFailure { rule: *rule }),
        None => Ok(()),
    }
}

/// JavaScript truthiness of a JSON value.
///
/// Empty arrays and objects are truthy; `NaN` cannot occur in JSON.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn falsy_values_fail_presence() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            let body = obj(json!({ "name": value }));
            assert!(validate(Some(&body), &[Rule::Present("name")]).is_err(), "{value}");
        }
    }

    #[test]
    fn truthy_values_pass_presence() {
        for value in [json!(true), json!(1), json!("x"), json!([]), json!({}), json!(" ")] {
            let body = obj(json!({ "name": value }));
            assert!(validate(Some(&body), &[Rule::Present("name")]).is_ok(), "{value}");
        }
    }

    #[test]
    fn missing_body_fails_every_rule() {
        let failure = validate(None, &[Rule::Present("email")]).unwrap_err();
        assert_eq!(failure.field(), "email");
        assert!(validate(None, &[]).is_ok());
    }

    #[test]
    fn first_failing_rule_is_reported() {
        let body = obj(json!({ "name": "Ada" }));
        let rules = [Rule::Present("name"), Rule::Present("email"), Rule::Present("company")];
        assert_eq!(validate(Some(&body), &rules).unwrap_err().rule, Rule::Present("email"));
    }

    #[test]
    fn trimmed_length_counts_characters() {
        let rule = [Rule::MinTrimmedLen("seedKeyword", 2)];
        assert!(validate(Some(&obj(json!({"seedKeyword": "a"}))), &rule).is_err());
        assert!(validate(Some(&obj(json!({"seedKeyword": "  a  "}))), &rule).is_err());
        assert!(validate(Some(&obj(json!({"seedKeyword": " ab "}))), &rule).is_ok());
        assert!(validate(Some(&obj(json!({"seedKeyword": "ü"}))), &rule).is_err());
        assert!(validate(Some(&obj(json!({"seedKeyword": 42}))), &rule).is_err());
    }

    #[test]
    fn non_empty_array_rule() {
        let rule = [Rule::NonEmptyArray("competitor_urls")];
        assert!(validate(Some(&obj(json!({"competitor_urls": []}))), &rule).is_err());
        assert!(validate(Some(&obj(json!({"competitor_urls": "x"}))), &rule).is_err());
        assert!(validate(Some(&obj(json!({"competitor_urls": ["https://a.io"]}))), &rule).is_ok());
    }

    proptest! {
        #[test]
        fn non_empty_strings_are_present(s in ".+") {
            let body = obj(json!({ "field": s }));
            prop_assert!(validate(Some(&body), &[Rule::Present("field")]).is_ok());
        }

        #[test]
        fn min_trimmed_len_matches_trimmed_char_count(s in "\\PC{0,12}", min in 0usize..6) {
            let body = obj(json!({ "field": s.clone() }));
            let expected = s.trim().chars().count() >= min;
            let actual = validate(Some(&body), &[Rule::MinTrimmedLen("field", min)]).is_ok();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn nonzero_numbers_are_truthy(n in any::<i64>()) {
            prop_assert_eq!(is_truthy(&json!(n)), n != 0);
        }
    }
}
