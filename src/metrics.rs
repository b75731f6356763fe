/// Metrics and telemetry for the admin gate
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Invitation issuance and access-code verification outcomes
/// - Gate decisions and audit write failures
/// - Background job execution

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Active HTTP requests
    pub static ref HTTP_REQUESTS_ACTIVE: IntGauge = register_int_gauge!(
        "http_requests_active",
        "Number of HTTP requests currently being processed"
    )
    .unwrap();

    // ========== Invitation Metrics ==========

    /// Invitations issued by role
    pub static ref INVITATIONS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admin_invitations_created_total",
        "Total number of admin invitations issued",
        &["role"]
    )
    .unwrap();

    /// Access-code verifications by outcome
    pub static ref VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admin_verifications_total",
        "Total number of access-code verification attempts",
        &["outcome"]
    )
    .unwrap();

    /// Invitations moved to EXPIRED by the sweep
    pub static ref INVITATIONS_SWEPT_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admin_invitations_swept_total",
        "Total number of stale invitations expired by the sweep",
        &["status"]
    )
    .unwrap();

    // ========== Gate Metrics ==========

    /// Access gate decisions
    pub static ref GATE_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admin_gate_decisions_total",
        "Total number of access gate decisions",
        &["decision"]
    )
    .unwrap();

    // ========== Audit Metrics ==========

    /// Audit entries that could not be written
    pub static ref AUDIT_WRITE_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "admin_audit_write_failures_total",
        "Total number of audit entries that failed to persist",
        &["action"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    /// Background job duration in seconds
    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "background_job_duration_seconds",
        "Background job execution time in seconds",
        &["job_type"],
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record an issued invitation
pub fn record_invitation_created(role: &str) {
    INVITATIONS_CREATED_TOTAL.with_label_values(&[role]).inc();
}

/// Record a verification outcome (`success`, `invalid`, `expired`, `error`)
pub fn record_verification(outcome: &str) {
    VERIFICATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record invitations expired by the sweep
pub fn record_invitations_swept(count: u64) {
    INVITATIONS_SWEPT_TOTAL
        .with_label_values(&["expired"])
        .inc_by(count);
}

/// Record a gate decision
pub fn record_gate_decision(allowed: bool) {
    GATE_DECISIONS_TOTAL
        .with_label_values(&[if allowed { "allowed" } else { "denied" }])
        .inc();
}

/// Record an audit entry that failed to persist
pub fn record_audit_failure(action: &str) {
    AUDIT_WRITE_FAILURES_TOTAL.with_label_values(&[action]).inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str, duration: f64) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_type])
        .observe(duration);
}

/// Count and time every request, labelled by its route template
pub async fn track_http_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    HTTP_REQUESTS_ACTIVE.inc();
    let start = Instant::now();

    let response = next.run(req).await;

    HTTP_REQUESTS_ACTIVE.dec();
    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
