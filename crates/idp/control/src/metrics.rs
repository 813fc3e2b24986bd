//! Prometheus metrics for platform operations
//!
//! - `api_latency_seconds{endpoint}`: request latency
//! - `api_failed_operations_total{endpoint}`: requests answered with an error
//! - `job_duration_seconds{job_type}`: background job runtime

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Metrics registered in a private [`Registry`]
#[derive(Clone)]
pub struct PlatformMetrics {
    registry: Registry,

    /// Request latency by endpoint
    pub request_latency: HistogramVec,

    /// Failed requests by endpoint
    pub failed_operations: IntCounterVec,

    /// Job runtime by job type
    pub job_duration: HistogramVec,
}

impl PlatformMetrics {
    /// Create and register the metrics
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let request_latency = HistogramVec::new(
            HistogramOpts::new("api_latency_seconds", "API latency"),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_latency.clone()))?;

        let failed_operations = IntCounterVec::new(
            Opts::new("api_failed_operations_total", "Failed operations"),
            &["endpoint"],
        )?;
        registry.register(Box::new(failed_operations.clone()))?;

        let job_duration = HistogramVec::new(
            HistogramOpts::new("job_duration_seconds", "Async job duration")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
            &["job_type"],
        )?;
        registry.register(Box::new(job_duration.clone()))?;

        Ok(Self {
            registry,
            request_latency,
            failed_operations,
            job_duration,
        })
    }

    /// Record one handled request
    pub fn observe_request(&self, endpoint: &str, elapsed: Duration, failed: bool) {
        self.request_latency
            .with_label_values(&[endpoint])
            .observe(elapsed.as_secs_f64());
        if failed {
            self.failed_operations.with_label_values(&[endpoint]).inc();
        }
    }

    /// Record the runtime of a finished job
    pub fn observe_job(&self, job_type: &str, elapsed: Duration) {
        self.job_duration
            .with_label_values(&[job_type])
            .observe(elapsed.as_secs_f64());
    }

    /// Metrics in the Prometheus text exposition format
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for PlatformMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_observations() {
        let metrics = PlatformMetrics::new().unwrap();
        metrics.observe_request("POST /api/services", Duration::from_millis(5), false);
        metrics.observe_request("POST /api/services", Duration::from_millis(7), true);

        let latency = metrics
            .request_latency
            .with_label_values(&["POST /api/services"]);
        assert_eq!(latency.get_sample_count(), 2);
        assert_eq!(
            metrics
                .failed_operations
                .with_label_values(&["POST /api/services"])
                .get(),
            1
        );
    }

    #[test]
    fn test_export_text_format() {
        let metrics = PlatformMetrics::new().unwrap();
        metrics.observe_job("deployment", Duration::from_millis(120));
        metrics.observe_request("GET /healthz", Duration::from_millis(1), true);

        let output = metrics.export().unwrap();
        assert!(output.contains("# TYPE job_duration_seconds histogram"));
        assert!(output.contains("job_duration_seconds_count{job_type=\"deployment\"} 1"));
        assert!(output.contains("api_failed_operations_total{endpoint=\"GET /healthz\"} 1"));
        assert!(output.contains("api_latency_seconds_bucket"));
    }

    #[test]
    fn test_instances_do_not_share_registries() {
        let a = PlatformMetrics::new().unwrap();
        let b = PlatformMetrics::new().unwrap();
        a.observe_job("deployment", Duration::from_secs(1));
        assert!(!b.export().unwrap().contains("job_duration_seconds_count"));
    }
}
