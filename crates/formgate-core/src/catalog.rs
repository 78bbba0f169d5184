//! The route table.
//!
//! One row per public form endpoint. Field names on the left of each mapping
//! are what the browser sends; names on the right are what the backend API
//! expects.

use crate::{
    endpoint::{BotCheck, EndpointSpec, Mode, Notify, Segment::Literal, Segment::Param},
    translate::FieldMap,
    validation::Rule::{MinTrimmedLen, NonEmptyArray, Present},
};

const CHALLENGE_TOKEN: FieldMap = FieldMap::rename("turnstileToken", "turnstile_token");

const AB_ASSIGN_FIELDS: &[FieldMap] = &[
    FieldMap::rename("testId", "test_id"),
    FieldMap::rename("userId", "user_id").or_null(),
    FieldMap::rename("sessionId", "session_id").or_null(),
];

const AB_CONVERSION_FIELDS: &[FieldMap] = &[
    FieldMap::rename("testId", "test_id"),
    FieldMap::rename("eventName", "event_name"),
    FieldMap::rename("userId", "user_id").or_null(),
    FieldMap::rename("sessionId", "session_id").or_null(),
];

const BUG_REPORT_FIELDS: &[FieldMap] = &[CHALLENGE_TOKEN];

const CHAT_FIELDS: &[FieldMap] = &[
    FieldMap::keep("name"),
    FieldMap::keep("email"),
    FieldMap::keep("message"),
    FieldMap::rename("pageUrl", "page_url"),
    FieldMap::rename("userAgent", "user_agent"),
    FieldMap::keep("referrer"),
    CHALLENGE_TOKEN,
];

const CHAT_AI_FIELDS: &[FieldMap] = &[
    FieldMap::keep("message"),
    FieldMap::rename("sessionId", "session_id").or_null(),
    FieldMap::keep("name").or_null(),
    FieldMap::keep("email").or_null(),
    CHALLENGE_TOKEN.or_null(),
];

const COMPETITOR_FIELDS: &[FieldMap] = &[
    FieldMap::keep("user_url"),
    FieldMap::keep("competitor_urls"),
    FieldMap::keep("email"),
    CHALLENGE_TOKEN,
];

const CONSULTATION_FIELDS: &[FieldMap] = &[
    FieldMap::keep("name"),
    FieldMap::keep("email"),
    FieldMap::keep("phone"),
    FieldMap::keep("company"),
    FieldMap::keep("preferred_date"),
    FieldMap::keep("preferred_time"),
    FieldMap::keep("message"),
    CHALLENGE_TOKEN,
];

const CONTENT_FIELDS: &[FieldMap] = &[
    FieldMap::keep("content_type"),
    FieldMap::keep("topic"),
    FieldMap::keep("tone").or("professional"),
    FieldMap::keep("length").or("medium"),
    FieldMap::keep("email"),
    CHALLENGE_TOKEN,
];

const INTELLIGENCE_FIELDS: &[FieldMap] =
    &[FieldMap::keep("url"), FieldMap::keep("email"), CHALLENGE_TOKEN];

const KEYWORD_FIELDS: &[FieldMap] = &[
    FieldMap::rename("seedKeyword", "seed_keyword").trimmed(),
    FieldMap::keep("email"),
    CHALLENGE_TOKEN,
];

const LEAD_POTENTIAL_FIELDS: &[FieldMap] = &[
    FieldMap::keep("industry"),
    FieldMap::keep("monthly_website_visitors"),
    FieldMap::keep("current_conversion_rate"),
    FieldMap::keep("average_deal_value"),
    FieldMap::keep("email"),
    CHALLENGE_TOKEN,
];

const LEADS_FIELDS: &[FieldMap] = &[FieldMap::keep("source").or("web")];

const NEWSLETTER_FIELDS: &[FieldMap] =
    &[FieldMap::keep("email"), FieldMap::keep("leadMagnet"), CHALLENGE_TOKEN];

const INVOICE_FIELDS: &[FieldMap] = &[
    FieldMap::keep("tier"),
    FieldMap::keep("locations"),
    FieldMap::keep("urgency"),
    FieldMap::keep("support"),
    FieldMap::keep("name"),
    FieldMap::keep("email"),
    FieldMap::rename("daysUntilDue", "days_until_due"),
    FieldMap::rename("requestId", "request_id"),
];

const PAYMENT_INTENT_FIELDS: &[FieldMap] = &[
    FieldMap::rename("planKey", "plan_key"),
    FieldMap::keep("name"),
    FieldMap::keep("email"),
    FieldMap::rename("requestId", "request_id"),
];

const SUBSCRIPTION_FIELDS: &[FieldMap] = &[
    FieldMap::rename("priceId", "price_id"),
    FieldMap::rename("planKey", "plan_key"),
    FieldMap::rename("planLabel", "plan_label"),
    FieldMap::keep("name"),
    FieldMap::keep("email"),
    FieldMap::rename("requestId", "request_id"),
];

/// `POST /api/ab-testing/assign`
pub const AB_TESTING_ASSIGN: EndpointSpec = EndpointSpec::post(
    "ab_testing.assign",
    "/api/ab-testing/assign",
    &[Literal("public/ab-testing/assign")],
)
.rules(&[Present("testId")], "Test ID is required")
.fields(AB_ASSIGN_FIELDS)
.default_error("Assignment failed");

/// `POST /api/ab-testing/conversion`
pub const AB_TESTING_CONVERSION: EndpointSpec = EndpointSpec::post(
    "ab_testing.conversion",
    "/api/ab-testing/conversion",
    &[Literal("public/ab-testing/conversion")],
)
.rules(&[Present("testId"), Present("eventName")], "Test ID and event name are required")
.fields(AB_CONVERSION_FIELDS)
.default_error("Conversion tracking failed");

/// `GET /api/ab-testing/results?testId=...`
pub const AB_TESTING_RESULTS: EndpointSpec = EndpointSpec::get(
    "ab_testing.results",
    "/api/ab-testing/results",
    &[Literal("public/ab-testing/tests"), Param("testId"), Literal("results")],
)
.rules(&[Present("testId")], "Test ID is required")
.default_error("Failed to get results");

/// `GET /api/ab-testing/tests`
pub const AB_TESTING_TESTS: EndpointSpec = EndpointSpec::get(
    "ab_testing.tests",
    "/api/ab-testing/tests",
    &[Literal("public/ab-testing/tests")],
)
.timeout_ms(10_000)
.default_error("Failed to get tests")
.mode(Mode::Failover);

/// `POST /api/bug-report`
pub const BUG_REPORT: EndpointSpec =
    EndpointSpec::post("bug_report", "/api/bug-report", &[Literal("public/bug-reports")])
        .rules(&[Present("message")], "Missing error message.")
        .fields(BUG_REPORT_FIELDS)
        .forward_unmapped()
        .bot_check(BotCheck::VerifyOrBypass)
        .gateway_status()
        .default_error("Failed to store bug report.")
        .rate_limited();

/// `POST /api/chat`
pub const CHAT: EndpointSpec = EndpointSpec::post("chat", "/api/chat", &[Literal("public/chat")])
    .rules(&[Present("name"), Present("message")], "Missing required fields.")
    .fields(CHAT_FIELDS)
    .bot_check(BotCheck::Verify)
    .gateway_status()
    .default_error("Failed to send chat message.")
    .rate_limited();

/// `POST /api/chat/ai`
pub const CHAT_AI: EndpointSpec =
    EndpointSpec::post("chat.ai", "/api/chat/ai", &[Literal("public/chat/ai-response")])
        .rules(&[Present("message")], "Missing message.")
        .fields(CHAT_AI_FIELDS)
        .bot_check(BotCheck::VerifyOrBypass)
        .default_error("AI response failed.");

/// `POST /api/competitor/compare`
pub const COMPETITOR_COMPARE: EndpointSpec = EndpointSpec::post(
    "competitor.compare",
    "/api/competitor/compare",
    &[Literal("public/competitor/compare")],
)
.rules(&[Present("user_url"), NonEmptyArray("competitor_urls")], "Missing required fields.")
.fields(COMPETITOR_FIELDS)
.bot_check(BotCheck::Verify)
.default_error("Comparison failed.");

/// `POST /api/consultation/book`
pub const CONSULTATION_BOOK: EndpointSpec = EndpointSpec::post(
    "consultation.book",
    "/api/consultation/book",
    &[Literal("public/consultation/book")],
)
.rules(&[Present("name"), Present("email")], "Missing name or email.")
.fields(CONSULTATION_FIELDS)
.bot_check(BotCheck::Verify)
.default_error("Booking failed.");

/// `POST /api/content/generate`
pub const CONTENT_GENERATE: EndpointSpec = EndpointSpec::post(
    "content.generate",
    "/api/content/generate",
    &[Literal("public/content/generate")],
)
.rules(&[Present("content_type"), Present("topic")], "Missing required fields.")
.fields(CONTENT_FIELDS)
.bot_check(BotCheck::VerifyOrBypass)
.default_error("Content generation failed.");

/// `POST /api/intelligence/report`
pub const INTELLIGENCE_REPORT: EndpointSpec = EndpointSpec::post(
    "intelligence.report",
    "/api/intelligence/report",
    &[Literal("public/intelligence/report")],
)
.rules(&[Present("url"), Present("email")], "Missing URL or email.")
.fields(INTELLIGENCE_FIELDS)
.bot_check(BotCheck::VerifyOrBypass)
.default_error("Report generation failed.");

/// `POST /api/keyword-research/research`
pub const KEYWORD_RESEARCH: EndpointSpec = EndpointSpec::post(
    "keyword_research.research",
    "/api/keyword-research/research",
    &[Literal("public/keyword-research/research")],
)
.rules(&[MinTrimmedLen("seedKeyword", 2)], "Seed keyword must be at least 2 characters.")
.fields(KEYWORD_FIELDS)
.bot_check(BotCheck::VerifyOrBypass)
.default_error("Keyword research failed.");

/// `POST /api/lead-potential/calculate`
pub const LEAD_POTENTIAL: EndpointSpec = EndpointSpec::post(
    "lead_potential.calculate",
    "/api/lead-potential/calculate",
    &[Literal("public/lead-potential/calculate")],
)
.rules(
    &[
        Present("industry"),
        Present("monthly_website_visitors"),
        Present("current_conversion_rate"),
        Present("average_deal_value"),
    ],
    "Missing required fields.",
)
.fields(LEAD_POTENTIAL_FIELDS)
.bot_check(BotCheck::Verify)
.default_error("Calculation failed.");

/// `POST /api/leads`
pub const LEADS: EndpointSpec =
    EndpointSpec::post("leads", "/api/leads", &[Literal("public/leads")])
        .rules(
            &[Present("name"), Present("email"), Present("company"), Present("details")],
            "Missing required fields.",
        )
        .fields(LEADS_FIELDS)
        .forward_unmapped()
        .gateway_status()
        .default_error("Failed to store lead.")
        .notify(Notify::Crm);

/// `POST /api/newsletter`
pub const NEWSLETTER: EndpointSpec =
    EndpointSpec::post("newsletter", "/api/newsletter", &[Literal("public/newsletter")])
        .rules(&[Present("email")], "Email is required.")
        .fields(NEWSLETTER_FIELDS)
        .bot_check(BotCheck::Verify)
        .gateway_status()
        .default_error("Failed to store signup.")
        .rate_limited()
        .notify(Notify::Automation);

/// `GET /api/readiness/questions`
pub const READINESS_QUESTIONS: EndpointSpec = EndpointSpec::get(
    "readiness.questions",
    "/api/readiness/questions",
    &[Literal("public/readiness/questions")],
)
.timeout_ms(3000)
.default_error("Failed to load questions.")
.mode(Mode::Degrade);

/// `POST /api/stripe/invoice`
pub const STRIPE_INVOICE: EndpointSpec =
    EndpointSpec::post("stripe.invoice", "/api/stripe/invoice", &[Literal("public/stripe/invoice")])
        .rules(
            &[
                Present("tier"),
                Present("locations"),
                Present("urgency"),
                Present("support"),
                Present("name"),
                Present("email"),
            ],
            "Missing required fields.",
        )
        .fields(INVOICE_FIELDS)
        .gateway_status()
        .timeout_ms(3000)
        .default_error("Invoice failed.");

/// `POST /api/stripe/payment-intent`
pub const STRIPE_PAYMENT_INTENT: EndpointSpec = EndpointSpec::post(
    "stripe.payment_intent",
    "/api/stripe/payment-intent",
    &[Literal("public/stripe/payment-intent")],
)
.rules(&[Present("planKey"), Present("name"), Present("email")], "Missing required fields.")
.fields(PAYMENT_INTENT_FIELDS)
.gateway_status()
.default_error("Payment failed.");

/// `POST /api/stripe/subscription`
pub const STRIPE_SUBSCRIPTION: EndpointSpec = EndpointSpec::post(
    "stripe.subscription",
    "/api/stripe/subscription",
    &[Literal("public/stripe/subscription")],
)
.rules(&[Present("priceId"), Present("name"), Present("email")], "Missing required fields.")
.fields(SUBSCRIPTION_FIELDS)
.gateway_status()
.default_error("Subscription failed.");

/// Every endpoint served by the gateway.
pub static ENDPOINTS: &[EndpointSpec] = &[
    AB_TESTING_ASSIGN,
    AB_TESTING_CONVERSION,
    AB_TESTING_RESULTS,
    AB_TESTING_TESTS,
    BUG_REPORT,
    CHAT,
    CHAT_AI,
    COMPETITOR_COMPARE,
    CONSULTATION_BOOK,
    CONTENT_GENERATE,
    INTELLIGENCE_REPORT,
    KEYWORD_RESEARCH,
    LEAD_POTENTIAL,
    LEADS,
    NEWSLETTER,
    READINESS_QUESTIONS,
    STRIPE_INVOICE,
    STRIPE_PAYMENT_INTENT,
    STRIPE_SUBSCRIPTION,
];

/// Looks up an endpoint by its local route.
pub fn find(route: &str) -> Option<&'static EndpointSpec> {
    ENDPOINTS.iter().find(|spec| spec.route == route)
}
