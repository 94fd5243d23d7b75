//! Metrics tracking middleware
//!
//! Tracks request latency, counts and status codes, plus authentication
//! events, in a process-wide Prometheus registry rendered at `/metrics`.

use axum::{extract::Request, middleware::Next, response::Response};
use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
    http_duration: HistogramVec,
    auth_events: IntCounterVec,
}

impl Metrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new(
                "cuidapet_http_requests_total",
                "HTTP requests by endpoint and status",
            ),
            &["endpoint", "status"],
        )?;
        let http_duration = HistogramVec::new(
            HistogramOpts::new(
                "cuidapet_http_request_duration_seconds",
                "HTTP request latency",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5]),
            &["endpoint"],
        )?;
        let auth_events = IntCounterVec::new(
            Opts::new("cuidapet_auth_events_total", "Authentication audit events"),
            &["event"],
        )?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;
        registry.register(Box::new(auth_events.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            http_duration,
            auth_events,
        })
    }
}

lazy_static! {
    static ref METRICS: Option<Metrics> = match Metrics::new() {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialise metrics registry");
            None
        }
    };
}

/// Metrics tracking middleware
///
/// Records:
/// - Request count per endpoint and status
/// - Request latency distribution
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = normalize_endpoint(request.uri().path());

    let response = next.run(request).await;

    if let Some(metrics) = METRICS.as_ref() {
        let status = response.status();
        metrics
            .http_requests
            .with_label_values(&[endpoint.as_str(), status.as_str()])
            .inc();
        metrics
            .http_duration
            .with_label_values(&[endpoint.as_str()])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}

/// Count one authentication event
pub fn record_auth_event(event: &str) {
    if let Some(metrics) = METRICS.as_ref() {
        metrics.auth_events.with_label_values(&[event]).inc();
    }
}

/// Render all metrics in the Prometheus text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    let Some(metrics) = METRICS.as_ref() else {
        return Ok(String::new());
    };

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Normalize endpoint paths for consistent metrics
///
/// Replaces numeric ID segments with placeholders to group similar endpoints
fn normalize_endpoint(path: &str) -> String {
    path.split('/')
        .map(|seg| if is_numeric(seg) { ":id" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}

/// Check if a string is numeric (likely an ID)
fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
