use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::core::{Component, ComponentContext, Flow};
use crate::request::Request;
use crate::response::Response;

pub const METRICS_COMPONENT: &str = "metrics";

/// Prometheus-compatible request counters.
///
/// `before` counts every request that enters a chain, `after` counts the
/// completed ones and `short_circuited` the ones a later component answered
/// in the pre-phase. Whatever is left was abandoned (cancelled, or a panic
/// before the post-phase). Register it first, as a global component, so it
/// sees every outcome. All counters are relaxed atomics.
#[derive(Default)]
pub struct MetricsComponent {
    requests: AtomicUsize,
    completed: AtomicUsize,
    short_circuits: AtomicUsize,
    total_latency_ns: AtomicU64,
    status_2xx: AtomicUsize,
    status_3xx: AtomicUsize,
    status_4xx: AtomicUsize,
    status_5xx: AtomicUsize,
    top_level_requests: AtomicUsize,
}

impl MetricsComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Requests answered by a later component before reaching the controller.
    pub fn short_circuit_count(&self) -> usize {
        self.short_circuits.load(Ordering::Relaxed)
    }

    /// Requests that neither completed nor short-circuited.
    pub fn abandoned_count(&self) -> usize {
        self.request_count()
            .saturating_sub(self.completed_count())
            .saturating_sub(self.short_circuit_count())
    }

    /// Mean processing time of completed requests; zero before the first one.
    pub fn average_latency(&self) -> Duration {
        let count = self.completed.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Completed responses per status class, `[2xx, 3xx, 4xx, 5xx]`.
    pub fn status_classes(&self) -> [usize; 4] {
        [
            self.status_2xx.load(Ordering::Relaxed),
            self.status_3xx.load(Ordering::Relaxed),
            self.status_4xx.load(Ordering::Relaxed),
            self.status_5xx.load(Ordering::Relaxed),
        ]
    }

    /// For infrastructure endpoints (`/health`, `/metrics`) that bypass the
    /// dispatcher.
    pub fn inc_top_level_request(&self) {
        self.top_level_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn top_level_request_count(&self) -> usize {
        self.top_level_requests.load(Ordering::Relaxed)
    }

    /// Prometheus text exposition of every counter.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::with_capacity(1024);
        let _ = write!(
            out,
            "# HELP actionwire_requests_total Requests that entered a component chain\n\
             # TYPE actionwire_requests_total counter\n\
             actionwire_requests_total {}\n\
             # HELP actionwire_short_circuits_total Requests answered during the component pre-phase\n\
             # TYPE actionwire_short_circuits_total counter\n\
             actionwire_short_circuits_total {}\n\
             # HELP actionwire_request_latency_seconds Average latency of completed requests\n\
             # TYPE actionwire_request_latency_seconds gauge\n\
             actionwire_request_latency_seconds {}\n\
             # HELP actionwire_top_level_requests_total Infrastructure endpoint hits\n\
             # TYPE actionwire_top_level_requests_total counter\n\
             actionwire_top_level_requests_total {}\n\
             # HELP actionwire_abandoned_total Requests cancelled or failed before the post-phase\n\
             # TYPE actionwire_abandoned_total counter\n\
             actionwire_abandoned_total {}\n\
             # HELP actionwire_responses_total Completed responses by status class\n\
             # TYPE actionwire_responses_total counter\n",
            self.request_count(),
            self.short_circuit_count(),
            self.average_latency().as_secs_f64(),
            self.top_level_request_count(),
            self.abandoned_count(),
        );
        for (class, count) in ["2xx", "3xx", "4xx", "5xx"].iter().zip(self.status_classes()) {
            let _ = writeln!(out, "actionwire_responses_total{{class=\"{class}\"}} {count}");
        }
        out
    }
}

impl Component for MetricsComponent {
    fn name(&self) -> &str {
        METRICS_COMPONENT
    }

    fn before(&self, _req: &Request, _cx: &ComponentContext<'_>) -> Flow {
        self.requests.fetch_add(1, Ordering::Relaxed);
        Flow::Continue
    }

    fn after(&self, _req: &Request, res: &mut Response, cx: &ComponentContext<'_>) -> Flow {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(cx.elapsed.as_nanos() as u64, Ordering::Relaxed);
        let bucket = match res.status {
            200..=299 => &self.status_2xx,
            300..=399 => &self.status_3xx,
            400..=499 => &self.status_4xx,
            _ => &self.status_5xx,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
        Flow::Continue
    }

    fn short_circuited(&self, _req: &Request, _res: &Response, _cx: &ComponentContext<'_>) {
        self.short_circuits.fetch_add(1, Ordering::Relaxed);
    }
}
