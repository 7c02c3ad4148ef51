use serde_json::json;
use tracing::debug;

use super::core::{Component, ComponentContext, Flow};
use crate::request::Request;
use crate::response::Response;

pub const AUTH_COMPONENT: &str = "auth";
const DEFAULT_HEADER: &str = "authorization";

/// Token check on a request header.
///
/// Settings (static bundle, overlaid per request by the controller):
///
/// - `token`: expected header value; overrides the constructor token
/// - `header`: header to read, `authorization` by default
/// - `public`: `true` skips the check
/// - `public_methods`: methods that skip the check, e.g. `["GET"]`
/// - `deny`: `true` stops the request outright (answered as not found)
pub struct AuthComponent {
    token: Option<String>,
}

impl AuthComponent {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// No default token; every controller must configure one or be public.
    pub fn unconfigured() -> Self {
        Self { token: None }
    }
}

impl Component for AuthComponent {
    fn name(&self) -> &str {
        AUTH_COMPONENT
    }

    fn before(&self, req: &Request, cx: &ComponentContext<'_>) -> Flow {
        let cfg = cx.config;
        if cfg.get_bool("deny").unwrap_or(false) {
            debug!(request_id = %req.request_id(), controller = %cx.controller, "Auth denied by controller");
            return Flow::Stop;
        }
        if cfg.get_bool("public").unwrap_or(false)
            || cfg
                .get_str_list("public_methods")
                .iter()
                .any(|m| m.eq_ignore_ascii_case(req.method().as_str()))
        {
            return Flow::Continue;
        }

        let expected = cfg.get_str("token").or(self.token.as_deref());
        let header = cfg.get_str("header").unwrap_or(DEFAULT_HEADER);
        match (expected, req.header(header)) {
            (Some(expected), Some(got)) if got == expected => Flow::Continue,
            _ => {
                debug!(
                    request_id = %req.request_id(),
                    controller = %cx.controller,
                    header = %header,
                    "Auth rejected request"
                );
                Flow::Halt(Response::json(401, json!({ "error": "Unauthorized" })))
            }
        }
    }
}
