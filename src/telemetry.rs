//! Telemetry metric name constants.
//!
//! Centralised metric names for platewise operations. Hosts install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `platewise_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: collaborator name (e.g. "usda", "openai")
//! - `operation`: call made (e.g. "search_foods", "generate_structured")
//! - `status`: outcome: "ok" or "error"
//! - `strategy`: resolver strategy name (e.g. "database", "ai_estimate")

/// Total outbound requests to collaborators.
///
/// Labels: `provider`, `operation`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "platewise_requests_total";

/// Outbound request duration in seconds.
///
/// Labels: `provider`, `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "platewise_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`, `operation`.
pub const RETRIES_TOTAL: &str = "platewise_retries_total";

/// Total items resolved, by the strategy that produced the profile.
///
/// Labels: `source` ("database" | "ai_estimate"), `status` ("ok" | "error").
pub const ITEMS_RESOLVED_TOTAL: &str = "platewise_items_resolved_total";

/// Total fallbacks from one resolver strategy to the next.
///
/// Labels: `strategy` (the strategy that gave up).
pub const FALLBACKS_TOTAL: &str = "platewise_fallbacks_total";

/// Total lookup cache hits.
///
/// Labels: `operation`.
pub const CACHE_HITS_TOTAL: &str = "platewise_cache_hits_total";

/// Total lookup cache misses.
///
/// Labels: `operation`.
pub const CACHE_MISSES_TOTAL: &str = "platewise_cache_misses_total";

/// Record the outcome and duration of one outbound request.
pub(crate) fn record_request(
    provider: &str,
    operation: &'static str,
    start: std::time::Instant,
    ok: bool,
) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(REQUESTS_TOTAL,
        "provider" => provider.to_owned(),
        "operation" => operation,
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS,
        "provider" => provider.to_owned(),
        "operation" => operation,
    )
    .record(start.elapsed().as_secs_f64());
}
