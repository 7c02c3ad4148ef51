use tracing::{debug, info};

use super::core::{Component, ComponentContext, Flow};
use crate::request::Request;
use crate::response::Response;

pub const TRACING_COMPONENT: &str = "tracing";

/// Logs chain entry and completion for every request it sees.
///
/// Runs inside the dispatcher's request span, so both events carry the
/// request id and mount.
pub struct TracingComponent;

impl Component for TracingComponent {
    fn name(&self) -> &str {
        TRACING_COMPONENT
    }

    fn before(&self, req: &Request, cx: &ComponentContext<'_>) -> Flow {
        debug!(
            method = %req.method(),
            path = %req.path(),
            controller = %cx.controller,
            "Request entered component chain"
        );
        Flow::Continue
    }

    fn after(&self, req: &Request, res: &mut Response, cx: &ComponentContext<'_>) -> Flow {
        info!(
            method = %req.method(),
            path = %req.path(),
            controller = %cx.controller,
            action = %cx.action.map(|a| a.as_str()).unwrap_or("-"),
            status = res.status,
            latency_ms = cx.elapsed.as_millis() as u64,
            "Request completed"
        );
        Flow::Continue
    }
}
