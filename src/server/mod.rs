//! # Server Module
//!
//! HTTP transport on top of `may_minihttp`. Each connection runs in a `may`
//! coroutine; [`AppService`] parses the raw request, answers `/health` and
//! `/metrics` itself and hands everything else to the
//! [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! ```rust,ignore
//! let service = AppService::new(Arc::new(dispatcher)).with_metrics(metrics);
//! let handle = HttpServer(service).start("127.0.0.1:8080")?;
//! handle.wait_ready()?;
//! handle.join().ok();
//! ```

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request, ParseError};
pub use response::write_response;
pub use service::{health_endpoint, metrics_endpoint, AppService};
