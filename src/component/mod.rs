//! # Component Module
//!
//! Components are named units that wrap every dispatch of the controllers
//! that declare them. The chain of a controller is the application's global
//! components followed by the controller's own list.
//!
//! ## Phases
//!
//! - **pre-phase**: `before` runs in chain order. A component may answer the
//!   request (`Flow::Replace` / `Flow::Halt`) or reject it (`Flow::Stop`,
//!   answered as not found). Either way nothing else runs for that request.
//! - **post-phase**: `after` runs in chain order once the controller has
//!   produced a response, including error responses. `Replace` swaps the
//!   response, `Halt` finalizes it, `Stop` turns it into not found.
//!
//! Settings for each component live in a [`ComponentConfig`] bundle. The
//! controller's `prepare_component` hook can overlay per-request values right
//! before the component's `before` runs.

mod auth;
mod chain;
mod core;
mod cors;
mod metrics;
mod tracing;

pub use self::core::{Component, ComponentConfig, ComponentContext, Flow};
pub use auth::{AuthComponent, AUTH_COMPONENT};
pub use chain::{ComponentChain, ComponentRegistry, PreOutcome};
pub use cors::{CorsComponent, CORS_COMPONENT};
pub use metrics::{MetricsComponent, METRICS_COMPONENT};
pub use self::tracing::{TracingComponent, TRACING_COMPONENT};
