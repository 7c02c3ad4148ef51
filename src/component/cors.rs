use http::Method;

use super::core::{Component, ComponentContext, Flow};
use crate::request::Request;
use crate::response::Response;

pub const CORS_COMPONENT: &str = "cors";

/// CORS (Cross-Origin Resource Sharing) component
///
/// Answers preflight `OPTIONS` requests with `204` before any controller code
/// runs, and adds CORS headers to every other response in the post-phase.
///
/// A controller's bundle may narrow the policy with an `origins` list.
pub struct CorsComponent {
    allowed_origins: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
}

impl CorsComponent {
    /// # Example
    ///
    /// ```rust,ignore
    /// use actionwire::component::CorsComponent;
    /// use http::Method;
    ///
    /// let cors = CorsComponent::new(
    ///     vec!["https://example.com".to_string()],
    ///     vec!["Content-Type".to_string()],
    ///     vec![Method::GET, Method::POST],
    /// );
    /// ```
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
    ) -> Self {
        Self {
            allowed_origins,
            allowed_headers,
            allowed_methods,
        }
    }

    /// `Access-Control-Allow-Origin` carries one origin: `*` when the policy
    /// allows any, otherwise the request's `Origin` if it is allowed. No
    /// origin header is produced for anything else.
    fn allow_origin(&self, req: &Request, cx: &ComponentContext<'_>) -> Option<String> {
        let configured = cx.config.get_str_list("origins");
        let allowed: Vec<&str> = if configured.is_empty() {
            self.allowed_origins.iter().map(String::as_str).collect()
        } else {
            configured
        };
        if allowed.contains(&"*") {
            return Some("*".to_string());
        }
        let origin = req.header("origin")?;
        allowed.contains(&origin).then(|| origin.to_string())
    }

    fn apply(&self, req: &Request, res: &mut Response, cx: &ComponentContext<'_>) {
        let Some(origin) = self.allow_origin(req, cx) else {
            return;
        };
        if origin != "*" {
            res.set_header("Vary", "Origin".to_string());
        }
        res.set_header("Access-Control-Allow-Origin", origin);
        let methods = self
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        res.set_header("Access-Control-Allow-Headers", self.allowed_headers.join(", "));
        res.set_header("Access-Control-Allow-Methods", methods);
    }
}

/// Permissive policy for development: any origin, common methods.
impl Default for CorsComponent {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
        }
    }
}

impl Component for CorsComponent {
    fn name(&self) -> &str {
        CORS_COMPONENT
    }

    fn before(&self, req: &Request, cx: &ComponentContext<'_>) -> Flow {
        if req.method() != Method::OPTIONS {
            return Flow::Continue;
        }
        let mut res = Response::new(204);
        self.apply(req, &mut res, cx);
        Flow::Halt(res)
    }

    fn after(&self, req: &Request, res: &mut Response, cx: &ComponentContext<'_>) -> Flow {
        self.apply(req, res, cx);
        Flow::Continue
    }
}
