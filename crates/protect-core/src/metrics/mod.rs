//! Prometheus metrics for the gateway.
//!
//! All recording goes through the lock-free `metrics` facade. A single
//! Prometheus recorder is installed per process; every [`GatewayMetrics`]
//! instance shares its handle, so tests can build as many collectors as they
//! like.
//!
//! | Metric | Kind | Labels |
//! |--------|------|--------|
//! | `gateway_requests_total` | counter | `route`, `status` |
//! | `gateway_admission_rejections_total` | counter | |
//! | `gateway_dedup_decisions_total` | counter | `outcome` |
//! | `gateway_relay_submissions_total` | counter | `outcome` |
//! | `gateway_dedup_evictions_total` | counter | |
//! | `gateway_dedup_entries` | gauge | |

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn init_prometheus_recorder() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Using fallback Prometheus recorder - metrics may not be globally visible"
                );
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Outcome of a dedup lookup for a transaction submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// First sighting inside the window; forwarded to the relay.
    Forwarded,
    /// Already forwarded inside the window; suppressed.
    Suppressed,
}

impl DedupOutcome {
    #[must_use]
    pub fn as_metric_str(self) -> &'static str {
        match self {
            Self::Forwarded => "forwarded",
            Self::Suppressed => "suppressed",
        }
    }
}

#[derive(Clone)]
pub struct GatewayMetrics {
    prometheus_handle: PrometheusHandle,
}

impl std::fmt::Debug for GatewayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMetrics").finish_non_exhaustive()
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self { prometheus_handle: init_prometheus_recorder() }
    }

    /// Records a dispatched request. `route` is a static route label, never the raw path.
    pub fn record_request(&self, route: &'static str, status: u16) {
        counter!("gateway_requests_total", "route" => route, "status" => status.to_string())
            .increment(1);
    }

    pub fn record_admission_rejection(&self) {
        counter!("gateway_admission_rejections_total").increment(1);
    }

    pub fn record_dedup_decision(&self, outcome: DedupOutcome) {
        counter!("gateway_dedup_decisions_total", "outcome" => outcome.as_metric_str())
            .increment(1);
    }

    pub fn record_relay_submission(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        counter!("gateway_relay_submissions_total", "outcome" => outcome).increment(1);
    }

    pub fn record_sweep(&self, evicted: usize, remaining: usize) {
        counter!("gateway_dedup_evictions_total").increment(evicted as u64);
        #[allow(clippy::cast_precision_loss)]
        gauge!("gateway_dedup_entries").set(remaining as f64);
    }

    /// Renders all recorded metrics in Prometheus text exposition format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus_handle.render()
    }
}
