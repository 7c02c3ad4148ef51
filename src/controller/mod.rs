//! # Controller Module
//!
//! Controllers own a named set of actions plus the hooks the dispatcher calls
//! around them. A fresh controller value is built by its factory for every
//! request and dropped when the response leaves the pipeline.
//!
//! ## Action lookup
//!
//! Actions are registered on a [`ControllerBuilder`] and sealed into an
//! [`ActionTable`]. Naming conventions are applied once at that point:
//!
//! | registered as            | stored as        | init hook key        | convention view          |
//! |--------------------------|------------------|----------------------|--------------------------|
//! | `.index(..)`             | `index`          | `initIndexAction`    | `Index<Controller>View`  |
//! | `.object(..)`            | `object`         | `initObjectAction`   | `Object<Controller>View` |
//! | `.action("search", ..)`  | `searchAction`   | `initSearchAction`   | `Search<Controller>View` |
//!
//! ## Hooks
//!
//! Every hook on [`Controller`] has a no-op default, so the dispatcher never
//! has to ask whether one exists:
//!
//! 1. `prepare_component`: per-request settings for each chain component
//! 2. `pre_process_request`: after the component pre-phase
//! 3. `action_for_name`: custom resolution of the first path segment
//! 4. init hook (per action, registered with [`ControllerBuilder::init`])
//! 5. the action itself
//! 6. `post_process_response`: after rendering
//!
//! ```rust,ignore
//! use actionwire::controller::{Controller, ControllerBuilder, ActionContext, HandlerResult};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Widgets;
//!
//! impl Controller for Widgets {}
//!
//! impl Widgets {
//!     fn index(&mut self, _ctx: &mut ActionContext<'_>) -> HandlerResult {
//!         Ok(json!({ "items": [] }).into())
//!     }
//! }
//!
//! let widgets = ControllerBuilder::new("Widgets", Widgets::default)
//!     .index(Widgets::index)
//!     .build()?;
//! ```

mod action;
mod builder;
mod context;

pub use action::{
    ActionEntry, ActionFn, ActionName, ActionResult, ActionSet, ActionTable, HandlerResult,
    InitFn, EXPLICIT_SUFFIX,
};
pub use builder::{ControllerBuilder, ControllerDescriptor};
pub use context::{ActionContext, LayoutChoice, ViewSelection};

pub(crate) use action::capitalize;

use crate::component::ComponentConfig;
use crate::request::Request;
use crate::response::Response;

/// Customization hooks of a request-scoped controller.
pub trait Controller: Send + 'static {
    /// Per-request settings for the component called `component`, merged
    /// over its static settings. Called once per component, right before
    /// that component's pre-phase callback.
    fn prepare_component(&mut self, _component: &str, _request: &Request) -> Option<ComponentConfig> {
        None
    }

    /// Runs after the component pre-phase. May pick a view or layout; it
    /// cannot answer the request.
    fn pre_process_request(&mut self, _ctx: &mut ActionContext<'_>) {}

    /// Custom resolution. Receives the first path segment (if any) as the
    /// proposed name; a non-empty return value overrides convention rules.
    fn action_for_name(&self, _name: Option<&str>, _request: &Request) -> Option<ActionName> {
        None
    }

    /// Last look at the response before the component post-phase.
    fn post_process_response(&mut self, response: Response, _ctx: &ActionContext<'_>) -> Response {
        response
    }
}
