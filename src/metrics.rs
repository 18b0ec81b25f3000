//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub launch_requests: IntCounter,
    pub launches_succeeded: IntCounter,
    /// Labelled by error kind
    pub launches_failed: IntCounterVec,
    pub nonces_reserved: IntCounter,
    pub broadcasts_total: IntCounter,

    // Gauges
    pub launches_in_flight: IntGauge,
    pub next_nonce: IntGauge,

    // Histograms
    pub pipeline_latency: Histogram,
    pub confirmation_latency: Histogram,
    pub build_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let launch_requests = IntCounter::with_opts(Opts::new(
            "launch_requests_total",
            "Launch requests that passed validation",
        ))?;

        let launches_succeeded = IntCounter::with_opts(Opts::new(
            "launches_succeeded_total",
            "Launches confirmed with a token address",
        ))?;

        let launches_failed = IntCounterVec::new(
            Opts::new("launches_failed_total", "Failed launches by error kind"),
            &["kind"],
        )?;

        let nonces_reserved = IntCounter::with_opts(Opts::new(
            "nonces_reserved_total",
            "Nonces handed out by the sequencer",
        ))?;

        let broadcasts_total = IntCounter::with_opts(Opts::new(
            "broadcasts_total",
            "Signed transactions submitted to the node",
        ))?;

        let launches_in_flight = IntGauge::with_opts(Opts::new(
            "launches_in_flight",
            "Launches currently between validation and report",
        ))?;

        let next_nonce = IntGauge::with_opts(Opts::new(
            "next_nonce",
            "Next nonce the sequencer will hand out",
        ))?;

        let pipeline_latency = Histogram::with_opts(
            HistogramOpts::new("launch_pipeline_seconds", "End-to-end launch latency")
                .buckets(vec![1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 60.0, 120.0, 200.0]),
        )?;

        let confirmation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "confirmation_latency_seconds",
                "Time from broadcast to receipt",
            )
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 60.0, 120.0, 200.0]),
        )?;

        let build_latency = Histogram::with_opts(
            HistogramOpts::new("build_latency_seconds", "Transaction build latency")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
        )?;

        // Register all metrics
        registry.register(Box::new(launch_requests.clone()))?;
        registry.register(Box::new(launches_succeeded.clone()))?;
        registry.register(Box::new(launches_failed.clone()))?;
        registry.register(Box::new(nonces_reserved.clone()))?;
        registry.register(Box::new(broadcasts_total.clone()))?;
        registry.register(Box::new(launches_in_flight.clone()))?;
        registry.register(Box::new(next_nonce.clone()))?;
        registry.register(Box::new(pipeline_latency.clone()))?;
        registry.register(Box::new(confirmation_latency.clone()))?;
        registry.register(Box::new(build_latency.clone()))?;

        Ok(Self {
            registry,
            launch_requests,
            launches_succeeded,
            launches_failed,
            nonces_reserved,
            broadcasts_total,
            launches_in_flight,
            next_nonce,
            pipeline_latency,
            confirmation_latency,
            build_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks one launch from validation to report.
///
/// Holds the in-flight gauge up while alive; dropping without `finish`
/// only lowers the gauge.
pub struct LaunchTimer {
    timer: Timer,
}

impl LaunchTimer {
    pub fn start() -> Self {
        let m = metrics();
        m.launch_requests.inc();
        m.launches_in_flight.inc();
        Self {
            timer: Timer::new(),
        }
    }

    /// Record the outcome; `None` means success
    pub fn finish(self, failure_kind: Option<&str>) {
        let m = metrics();
        self.timer.observe_duration(&m.pipeline_latency);
        match failure_kind {
            None => m.launches_succeeded.inc(),
            Some(kind) => m.launches_failed.with_label_values(&[kind]).inc(),
        }
    }
}

impl Drop for LaunchTimer {
    fn drop(&mut self) {
        metrics().launches_in_flight.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_registry_encodes() {
        let m = Metrics::new().unwrap();
        m.launches_failed
            .with_label_values(&["broadcast_error"])
            .inc();
        m.next_nonce.set(12);

        let text = m.encode_text().unwrap();
        assert!(text.contains("launches_failed_total{kind=\"broadcast_error\"} 1"));
        assert!(text.contains("next_nonce 12"));
    }

    #[test]
    fn test_launch_timer_counts_outcome() {
        let before = metrics()
            .launches_failed
            .with_label_values(&["event_not_found"])
            .get();
        LaunchTimer::start().finish(Some("event_not_found"));
        let after = metrics()
            .launches_failed
            .with_label_values(&["event_not_found"])
            .get();
        assert!(after > before);
    }
}
