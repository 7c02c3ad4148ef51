//! # actionwire
//!
//! **actionwire** is a convention-driven action-controller pipeline for
//! coroutine-powered HTTP services on the [`may`] runtime.
//!
//! ## Overview
//!
//! Controllers are mounted under path prefixes. A request below a mount point
//! is resolved to one *action* of that controller by naming convention
//! (`GET /widgets` → `index`, `GET /widgets/42` → `object`,
//! `GET /widgets/search/blue` → `searchAction`, ...), wrapped in a chain of
//! named components, and rendered through a view selected by convention and
//! an optional layout.
//!
//! ## Architecture
//!
//! - **[`request`]** / **[`response`]** - value objects carried through the pipeline
//! - **[`component`]** - the component chain and the built-in components (auth, CORS, metrics, tracing)
//! - **[`resolver`]** - maps verb, path remainder and declared actions to one action
//! - **[`controller`]** - action tables, hooks and the per-request action context
//! - **[`view`]** - views, layouts and the renderer
//! - **[`template`]** - template storage and processing with `minijinja`
//! - **[`router`]** - longest-prefix mount table
//! - **[`dispatcher`]** - orchestrates one request from mount lookup to final response
//! - **[`server`]** - `may_minihttp` service adapter
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - YAML configuration, `tracing` setup, command line
//!
//! ### Request Lifecycle
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService
//!     participant Disp as Dispatcher
//!     participant Chain as Component Chain
//!     participant Ctl as Controller
//!     participant Res as Resolver
//!     participant View as View Renderer
//!
//!     Client->>Server: GET /widgets/42
//!     Server->>Disp: dispatch(request)
//!     Disp->>Disp: longest mount prefix "/widgets"
//!
//!     alt No mount matches
//!         Disp-->>Client: 404 Not Found
//!     end
//!
//!     Disp->>Chain: before() in chain order
//!     alt Component short-circuits
//!         Chain-->>Client: component response (nothing else runs)
//!     end
//!
//!     Disp->>Ctl: pre_process_request
//!     Disp->>Ctl: action_for_name("42")
//!     Disp->>Res: resolve(GET, ["42"], actions, custom)
//!     Res-->>Disp: object, identifier "42"
//!
//!     alt Init hook registered
//!         Disp->>Ctl: initObjectAction
//!     else
//!         Disp->>View: convention view ObjectWidgetsView
//!     end
//!
//!     Disp->>Ctl: object(ctx)
//!     alt Action returned a response
//!         Ctl-->>Disp: Response (rendering skipped)
//!     else Action returned data
//!         Disp->>View: render(data, view, layout)
//!     end
//!
//!     Disp->>Ctl: post_process_response
//!     Disp->>Chain: after() in chain order
//!     Disp-->>Server: Response
//!     Server-->>Client: 200 OK
//! ```
//!
//! ### Key Architectural Patterns
//!
//! 1. **Convention over configuration**: action names, init hooks and views are derived from one registration
//! 2. **Request-scoped controllers**: a factory builds a fresh controller per request; no shared mutable state
//! 3. **Coroutine-based concurrency**: every connection runs in a `may` coroutine and calls the dispatcher directly
//! 4. **Errors are responses**: every failure past the component pre-phase becomes exactly one error response
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use actionwire::controller::{ActionContext, Controller, ControllerBuilder, HandlerResult};
//! use actionwire::Dispatcher;
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Widgets;
//! impl Controller for Widgets {}
//!
//! let widgets = ControllerBuilder::new("Widgets", Widgets::default)
//!     .index(|_, _| Ok(json!({ "items": [] }).into()))
//!     .object(|_, ctx: &mut ActionContext<'_>| {
//!         Ok(json!({ "id": ctx.identifier() }).into())
//!     })
//!     .build()?;
//!
//! let dispatcher = Dispatcher::builder().mount("/widgets", widgets).build()?;
//! ```
//!
//! ## Demo
//!
//! `src/bin/widgets_demo.rs` is a complete application (templates, layout,
//! auth, config file) served through the [`cli`]:
//!
//! ```bash
//! cargo run --bin widgets-demo -- serve --config demos/widgets/config.yaml
//! ```

pub mod cli;
pub mod component;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod request;
pub mod resolver;
pub mod response;
pub mod router;
pub mod server;
pub mod template;
pub mod view;

pub use controller::{
    ActionContext, ActionName, ActionResult, Controller, ControllerBuilder, ControllerDescriptor,
    HandlerResult,
};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{ConfigError, DispatchError};
pub use request::Request;
pub use response::{Body, Response};
