//! Prometheus metrics collection for modelgate
//!
//! Tracks:
//! - Chat requests by model and outcome
//! - Access denials by policy rule
//! - Backend call latency by invocation kind
//!
//! Exposed via the `/metrics` endpoint in Prometheus text format. All label
//! values come from closed enums or the fixed model registry, so label
//! cardinality is bounded.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::models::Invocation;
use crate::policy::DenyRule;

/// Model label for requests that never resolved a registered model
pub const UNKNOWN_MODEL: &str = "unknown";

/// Terminal outcome of a chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Denied,
    Invalid,
    ConfigError,
    BackendError,
    InternalError,
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Denied => "denied",
            Outcome::Invalid => "invalid",
            Outcome::ConfigError => "config_error",
            Outcome::BackendError => "backend_error",
            Outcome::InternalError => "internal_error",
        }
    }
}

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    access_denied_total: IntCounterVec,
    backend_duration: HistogramVec,
    recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance with its own registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: registered models (+ "unknown") x 6 outcomes
        let requests_total = IntCounterVec::new(
            Opts::new(
                "modelgate_requests_total",
                "Total number of chat requests by model and outcome",
            ),
            &["model", "outcome"],
        )?;

        let access_denied_total = IntCounterVec::new(
            Opts::new(
                "modelgate_access_denied_total",
                "Total number of requests denied by the access policy, by rule",
            ),
            &["rule"],
        )?;

        let backend_duration = HistogramVec::new(
            HistogramOpts::new(
                "modelgate_backend_duration_ms",
                "Backend model call latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0,
            ]),
            &["kind"],
        )?;

        let recording_failures = IntCounterVec::new(
            Opts::new(
                "modelgate_metrics_recording_failures_total",
                "Total number of metrics recording failures by operation",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(access_denied_total.clone()))?;
        registry.register(Box::new(backend_duration.clone()))?;
        registry.register(Box::new(recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            access_denied_total,
            backend_duration,
            recording_failures,
        })
    }

    /// Count a finished chat request
    ///
    /// `model` must be a registry id or [`UNKNOWN_MODEL`].
    pub fn record_request(&self, model: &str, outcome: Outcome) {
        match self
            .requests_total
            .get_metric_with_label_values(&[model, outcome.as_str()])
        {
            Ok(counter) => counter.inc(),
            Err(e) => self.recording_failed("record_request", &e),
        }
    }

    /// Count a policy denial
    pub fn record_denial(&self, rule: DenyRule) {
        match self
            .access_denied_total
            .get_metric_with_label_values(&[rule.as_str()])
        {
            Ok(counter) => counter.inc(),
            Err(e) => self.recording_failed("record_denial", &e),
        }
    }

    /// Observe a backend call duration
    ///
    /// Non-finite or negative durations are rejected: they would corrupt
    /// every percentile of the histogram.
    pub fn record_backend_duration(&self, invocation: Invocation, duration_ms: f64) {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            self.recording_failed(
                "record_backend_duration",
                &prometheus::Error::Msg(format!("invalid duration {}", duration_ms)),
            );
            return;
        }

        match self
            .backend_duration
            .get_metric_with_label_values(&[invocation.as_str()])
        {
            Ok(histogram) => histogram.observe(duration_ms),
            Err(e) => self.recording_failed("record_backend_duration", &e),
        }
    }

    /// Number of requests recorded for a model and outcome
    pub fn requests_count(&self, model: &str, outcome: Outcome) -> u64 {
        self.requests_total
            .get_metric_with_label_values(&[model, outcome.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Number of denials recorded for a rule
    pub fn denials_count(&self, rule: DenyRule) -> u64 {
        self.access_denied_total
            .get_metric_with_label_values(&[rule.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Number of metrics recording failures across all operations
    pub fn recording_failures_count(&self) -> u64 {
        ["record_request", "record_denial", "record_backend_duration"]
            .iter()
            .filter_map(|op| {
                self.recording_failures
                    .get_metric_with_label_values(&[op])
                    .ok()
            })
            .map(|c| c.get())
            .sum()
    }

    // Metrics failures are logged and counted, never propagated to requests
    fn recording_failed(&self, operation: &str, error: &prometheus::Error) {
        tracing::error!(
            operation = operation,
            error = %error,
            "Metrics recording failed (non-fatal)"
        );
        if let Ok(counter) = self
            .recording_failures
            .get_metric_with_label_values(&[operation])
        {
            counter.inc();
        }
    }

    /// Encode all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_families.len(),
                    "Prometheus text encoder failed"
                );
                e
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request_counts() {
        let metrics = Metrics::new().expect("should create metrics");
        metrics.record_request("gpt-35-turbo", Outcome::Success);
        metrics.record_request("gpt-35-turbo", Outcome::Success);
        metrics.record_request("unknown", Outcome::Invalid);

        assert_eq!(metrics.requests_count("gpt-35-turbo", Outcome::Success), 2);
        assert_eq!(metrics.requests_count("unknown", Outcome::Invalid), 1);
        assert_eq!(metrics.requests_count("gpt-35-turbo", Outcome::Denied), 0);
    }

    #[test]
    fn test_record_denial_counts() {
        let metrics = Metrics::new().expect("should create metrics");
        metrics.record_denial(DenyRule::TenantMismatch);
        assert_eq!(metrics.denials_count(DenyRule::TenantMismatch), 1);
        assert_eq!(metrics.denials_count(DenyRule::Provider), 0);
    }

    #[test]
    fn test_invalid_duration_counted_as_failure() {
        let metrics = Metrics::new().expect("should create metrics");
        metrics.record_backend_duration(Invocation::ResponseMixed, f64::NAN);
        metrics.record_backend_duration(Invocation::ResponseMixed, -1.0);
        assert_eq!(metrics.recording_failures_count(), 2);
    }

    #[test]
    fn test_gather_contains_metric_names() {
        let metrics = Metrics::new().expect("should create metrics");
        metrics.record_request("gpt-5-chat", Outcome::BackendError);
        metrics.record_denial(DenyRule::UserNotAllowed);
        metrics.record_backend_duration(
            Invocation::ChatCompletion { max_tokens: 512 },
            120.0,
        );

        let output = metrics.gather().expect("should gather");
        assert!(output.contains("modelgate_requests_total"));
        assert!(output.contains(r#"outcome="backend_error""#));
        assert!(output.contains("modelgate_access_denied_total"));
        assert!(output.contains("modelgate_backend_duration_ms"));
        assert!(output.contains(r#"kind="chat_completion""#));
    }
}
