//! # Dispatcher Module
//!
//! The dispatcher turns one routed [`Request`](crate::request::Request) into
//! exactly one [`Response`](crate::response::Response).
//!
//! ## Overview
//!
//! Controllers are mounted under path prefixes at startup through the
//! [`DispatcherBuilder`]. For each request the dispatcher:
//!
//! 1. picks the controller by longest mount prefix (unknown prefix → `404`)
//! 2. builds a fresh controller instance from its factory
//! 3. runs the component pre-phase, asking the controller for per-request
//!    component settings as it goes
//! 4. calls `pre_process_request`, resolves the action, runs the init hook
//! 5. calls the action and renders its data through the selected view and
//!    layout (responses returned by the action skip rendering)
//! 6. calls `post_process_response`, then the component post-phase
//!
//! ## Error Handling
//!
//! - resolution failures return `404` with a JSON error body
//! - action errors and panics are caught and return `500`
//! - an unregistered view or layout returns `500` (`ConfigurationError`)
//! - after any failure past the pre-phase, the component post-phase still
//!   runs on the error response; `post_process_response` does not
//! - a cancelled request returns `499` and runs nothing further
//!
//! ## Concurrency
//!
//! `Dispatcher` is immutable after `build` and `Send + Sync`. Every server
//! coroutine calls [`Dispatcher::dispatch`] directly; per-request state lives
//! on that coroutine's stack and is dropped when the call returns.

mod builder;
mod core;

pub use self::core::Dispatcher;
pub use builder::DispatcherBuilder;
