#![no_main]

//! Fuzz target for inbound body handling.
//!
//! Feeds arbitrary bytes through parsing, every endpoint's validation rules,
//! field translation, upstream path rendering and error-message extraction.
//! None of these may panic, whatever the browser sends.

use formgate_core::{
    catalog::ENDPOINTS, envelope::upstream_error_message, inbound, translate, validate,
};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    fuzz_inbound_body(data);
});

fn fuzz_inbound_body(data: &[u8]) {
    let body = inbound::parse_body(data);
    let _ = inbound::bot_token(body.as_ref());

    for spec in ENDPOINTS {
        let passed = validate(body.as_ref(), spec.rules).is_ok();

        if let Some(body) = body.as_ref() {
            let payload = translate(body, spec);
            // Translation never leaks the raw challenge token field.
            assert!(!payload.contains_key("turnstileToken"));

            if passed {
                let _ = spec.upstream.render(body);
            }
        }
    }

    if let Ok(value) = serde_json::from_slice::<Value>(data) {
        let _ = upstream_error_message(&value, "default");
    }
}
