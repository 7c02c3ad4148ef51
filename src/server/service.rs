use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request as HttpRequest, Response as HttpResponse};
use serde_json::json;
use tracing::warn;

use super::request::{parse_request, ParseError};
use super::response::{write_json_error, write_response};
use crate::component::MetricsComponent;
use crate::dispatcher::Dispatcher;
use crate::response::Response;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// `may_minihttp` service in front of a [`Dispatcher`].
///
/// Cloned once per connection; clones share the dispatcher and metrics.
#[derive(Clone)]
pub struct AppService {
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: Option<Arc<MetricsComponent>>,
}

impl AppService {
    /// Service answering every request through `dispatcher`
    ///
    /// # Arguments
    ///
    /// * `dispatcher` - Built dispatcher shared by every connection
    ///
    /// # Returns
    ///
    /// A service with `/health` enabled and `/metrics` disabled until
    /// [`with_metrics`](Self::with_metrics) is called.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            metrics: None,
        }
    }

    /// Serve `/metrics` from this component
    ///
    /// # Arguments
    ///
    /// * `metrics` - The component also registered in the dispatcher's chain,
    ///   so the scrape reflects dispatched traffic
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsComponent>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut HttpResponse) -> io::Result<()> {
    write_response(res, Response::json(200, json!({ "status": "ok" })));
    Ok(())
}

/// Metrics endpoint returning Prometheus text format statistics.
pub fn metrics_endpoint(res: &mut HttpResponse, metrics: &MetricsComponent) -> io::Result<()> {
    let body = metrics.render_prometheus();
    write_response(res, Response::text(200, body).with_header("content-type", PROMETHEUS_CONTENT_TYPE));
    Ok(())
}

impl HttpService for AppService {
    /// Handle one HTTP request
    ///
    /// Unsupported methods get 405. `GET /health` and `GET /metrics` are
    /// answered here; everything else goes through the dispatcher, which
    /// always produces exactly one response.
    ///
    /// # Errors
    ///
    /// Never fails; the `io::Result` is required by `HttpService`.
    fn call(&mut self, req: HttpRequest, res: &mut HttpResponse) -> io::Result<()> {
        let request = match parse_request(req) {
            Ok(request) => request,
            Err(ParseError::UnsupportedMethod(method)) => {
                warn!(method = %method, "Unsupported HTTP method");
                write_json_error(res, 405, "Method Not Allowed");
                return Ok(());
            }
        };

        if request.method() == http::Method::GET {
            match request.path() {
                "/health" => {
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_top_level_request();
                    }
                    return health_endpoint(res);
                }
                "/metrics" => {
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_top_level_request();
                        return metrics_endpoint(res, metrics);
                    }
                }
                _ => {}
            }
        }

        let response = self.dispatcher.dispatch(request);
        write_response(res, response);
        Ok(())
    }
}
