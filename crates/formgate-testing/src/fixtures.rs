//! Valid request bodies for every POST endpoint.

use formgate_core::{catalog::ENDPOINTS, EndpointSpec, Method};
use serde_json::{json, Value};

/// Challenge token carried by fixtures of bot-checked endpoints.
pub const CHALLENGE_TOKEN: &str = "cf-test-token";

/// A body that passes validation for `route`, or `None` for unknown and
/// GET routes.
pub fn valid_body(route: &str) -> Option<Value> {
    let body = match route {
        "/api/ab-testing/assign" => json!({ "testId": "hero-copy", "sessionId": "s-1" }),
        "/api/ab-testing/conversion" => {
            json!({ "testId": "hero-copy", "eventName": "signup", "userId": "u-1" })
        },
        "/api/bug-report" => json!({
            "message": "TypeError: x is undefined",
            "stack": "at render (app.js:1:1)",
            "url": "https://example.com/pricing",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/chat" => json!({
            "name": "Ada",
            "email": "ada@example.com",
            "message": "Do you integrate with Shopify?",
            "pageUrl": "https://example.com/",
            "userAgent": "Mozilla/5.0",
            "referrer": "",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/chat/ai" => json!({
            "message": "What does the audit include?",
            "sessionId": "chat-1",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/competitor/compare" => json!({
            "user_url": "https://example.com",
            "competitor_urls": ["https://rival.example"],
            "email": "ada@example.com",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/consultation/book" => json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "+15555550100",
            "company": "Analytical Engines",
            "preferred_date": "2026-11-02",
            "preferred_time": "10:00",
            "message": "Growth strategy",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/content/generate" => json!({
            "content_type": "blog",
            "topic": "local SEO",
            "email": "ada@example.com",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/intelligence/report" => json!({
            "url": "https://example.com",
            "email": "ada@example.com",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/keyword-research/research" => json!({
            "seedKeyword": "plumber",
            "email": "ada@example.com",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/lead-potential/calculate" => json!({
            "industry": "retail",
            "monthly_website_visitors": 12000,
            "current_conversion_rate": 1.5,
            "average_deal_value": 250,
            "email": "ada@example.com",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/leads" => json!({
            "name": "Ada",
            "email": "ada@example.com",
            "company": "Analytical Engines",
            "details": "Need a new site",
        }),
        "/api/newsletter" => json!({
            "email": "ada@example.com",
            "leadMagnet": "seo-checklist",
            "turnstileToken": CHALLENGE_TOKEN,
        }),
        "/api/stripe/invoice" => json!({
            "tier": "growth",
            "locations": 3,
            "urgency": "standard",
            "support": "email",
            "name": "Ada",
            "email": "ada@example.com",
            "daysUntilDue": 14,
            "requestId": "req-1",
        }),
        "/api/stripe/payment-intent" => json!({
            "planKey": "starter",
            "name": "Ada",
            "email": "ada@example.com",
            "requestId": "req-2",
        }),
        "/api/stripe/subscription" => json!({
            "priceId": "price_123",
            "planKey": "growth",
            "planLabel": "Growth",
            "name": "Ada",
            "email": "ada@example.com",
            "requestId": "req-3",
        }),
        _ => return None,
    };
    Some(body)
}

/// Every POST endpoint in the route table.
pub fn post_endpoints() -> impl Iterator<Item = &'static EndpointSpec> {
    ENDPOINTS.iter().filter(|spec| spec.method == Method::Post)
}
