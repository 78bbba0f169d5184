//! Performance benchmarks for the per-request pipeline.
//!
//! Everything the gateway does before the upstream call is CPU-bound:
//! body parsing, validation, bypass checks and field translation. These
//! benchmarks keep that overhead negligible next to a network hop.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use formgate_core::{
    catalog::{self, ENDPOINTS},
    inbound, should_bypass, translate, validate, BypassCredentials, Method,
};
use serde_json::{json, Value};

fn sample_body(route: &str) -> Value {
    match route {
        "/api/leads" => json!({
            "name": "Ada",
            "email": "ada@example.com",
            "company": "Analytical Engines",
            "details": "Need a new site with booking",
            "budget": "10k-25k",
            "timeline": "Q1",
        }),
        "/api/keyword-research/research" => {
            json!({ "seedKeyword": "  emergency plumber  ", "turnstileToken": "cf-token" })
        },
        "/api/stripe/subscription" => json!({
            "priceId": "price_123",
            "planKey": "growth",
            "planLabel": "Growth",
            "name": "Ada",
            "email": "ada@example.com",
            "requestId": "req-1",
        }),
        _ => json!({ "message": "hello", "turnstileToken": "cf-token" }),
    }
}

/// Benchmarks parse + validate + translate for representative endpoints.
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(1));

    for route in ["/api/leads", "/api/keyword-research/research", "/api/stripe/subscription"] {
        let Some(spec) = catalog::find(route) else { continue };
        let raw = serde_json::to_vec(&sample_body(route)).unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("endpoint", spec.name), &raw, |b, raw| {
            b.iter(|| {
                let body = inbound::parse_body(black_box(raw));
                let valid = validate(body.as_ref(), spec.rules).is_ok();
                let payload = body.map(|body| translate(&body, spec));
                black_box((valid, payload))
            });
        });
    }

    group.finish();
}

/// Benchmarks validation alone across the whole route table.
fn bench_validation(c: &mut Criterion) {
    let bodies: Vec<_> = ENDPOINTS
        .iter()
        .filter(|spec| spec.method == Method::Post)
        .map(|spec| (spec, sample_body(spec.route).as_object().cloned()))
        .collect();

    c.bench_function("validate_all_endpoints", |b| {
        b.iter(|| {
            for (spec, body) in &bodies {
                black_box(validate(black_box(body.as_ref()), spec.rules).is_ok());
            }
        });
    });
}

/// Benchmarks the bypass comparison with and without a match.
fn bench_bypass(c: &mut Criterion) {
    let mut group = c.benchmark_group("bypass");
    let matching = BypassCredentials {
        header: None,
        cookie: Some("internal-secret".to_string()),
        body_token: Some("cf-token".to_string()),
    };
    let missing = BypassCredentials {
        header: Some("guess".to_string()),
        cookie: None,
        body_token: Some("cf-token".to_string()),
    };

    group.bench_function("match", |b| {
        b.iter(|| should_bypass(black_box(Some("internal-secret")), black_box(&matching)));
    });
    group.bench_function("miss", |b| {
        b.iter(|| should_bypass(black_box(Some("internal-secret")), black_box(&missing)));
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_validation, bench_bypass);
criterion_main!(benches);
