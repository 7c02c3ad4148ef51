//! Dispatcher core: the per-request pipeline.
//!
//! ```text
//! route ─► components.before ─► pre_process_request ─► resolve ─► init hook
//!       ─► select view ─► action ─► render ─► post_process_response
//!       ─► components.after ─► Response
//! ```
//!
//! Every stage boundary checks the request's cancel token.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};

use crate::component::{ComponentChain, PreOutcome};
use crate::controller::{
    ActionContext, ActionResult, Controller, ControllerDescriptor, ViewSelection,
};
use crate::error::DispatchError;
use crate::request::Request;
use crate::resolver::resolve;
use crate::response::Response;
use crate::router::{normalize_mount, MountTable};
use crate::template::TemplateStore;
use crate::view::{render, View, ViewRegistry};

/// Read-only rendering state shared by every mounted controller.
pub(crate) struct Rendering {
    pub(crate) views: ViewRegistry,
    pub(crate) templates: Arc<dyn TemplateStore>,
    pub(crate) default_layout: Option<String>,
}

/// Type-erased mounted controller.
pub(crate) trait Endpoint: Send + Sync {
    fn controller(&self) -> &str;
    fn chain(&self) -> &ComponentChain;
    fn handle(&self, request: &Request, rendering: &Rendering, started: Instant) -> Response;
}

pub(crate) struct Mounted<C: Controller> {
    pub(crate) descriptor: ControllerDescriptor<C>,
    pub(crate) chain: ComponentChain,
}

impl<C: Controller> Endpoint for Mounted<C> {
    fn controller(&self) -> &str {
        &self.descriptor.name
    }

    fn chain(&self) -> &ComponentChain {
        &self.chain
    }

    fn handle(&self, request: &Request, rendering: &Rendering, started: Instant) -> Response {
        run(&self.descriptor, &self.chain, request, rendering, started)
    }
}

/// Routes requests to mounted controllers and runs the pipeline.
///
/// Immutable once built; share it through an `Arc`.
pub struct Dispatcher {
    pub(crate) mounts: MountTable<Box<dyn Endpoint>>,
    pub(crate) rendering: Rendering,
}

impl Dispatcher {
    pub fn builder() -> super::DispatcherBuilder {
        super::DispatcherBuilder::new()
    }

    /// Dispatch one request. Always returns exactly one response.
    pub fn dispatch(&self, request: Request) -> Response {
        let started = Instant::now();
        let request_id = request.request_id();
        let Some((mount, endpoint, segments)) = self.mounts.route(request.path()) else {
            info!(
                request_id = %request_id,
                method = %request.method(),
                path = %request.path(),
                "No controller mounted for path"
            );
            return DispatchError::not_found(format!("no controller mounted for '{}'", request.path()))
                .into_response();
        };
        let request = request.routed(mount, segments);

        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            method = %request.method(),
            path = %request.path(),
            controller = %endpoint.controller()
        );
        let _entered = span.enter();
        debug!(mount = %mount, segments = ?request.segments(), "Dispatch start");

        let response = endpoint.handle(&request, &self.rendering, started);
        info!(
            status = response.status,
            latency_ms = started.elapsed().as_millis() as u64,
            "Dispatch complete"
        );
        response
    }

    /// Mount points in routing order (longest first).
    #[must_use]
    pub fn mounts(&self) -> Vec<&str> {
        self.mounts.mounts()
    }

    /// Component names of the controller mounted at `mount`, in chain order.
    #[must_use]
    pub fn chain_for(&self, mount: &str) -> Option<Vec<&str>> {
        let mount = normalize_mount(mount);
        self.mounts
            .route(&mount)
            .filter(|(m, _, segments)| *m == mount && segments.is_empty())
            .map(|(_, endpoint, _)| endpoint.chain().names())
    }

    #[must_use]
    pub fn views(&self) -> &ViewRegistry {
        &self.rendering.views
    }

    #[must_use]
    pub fn templates(&self) -> &Arc<dyn TemplateStore> {
        &self.rendering.templates
    }

    #[must_use]
    pub fn default_layout(&self) -> Option<&str> {
        self.rendering.default_layout.as_deref()
    }
}

fn checkpoint(request: &Request) -> Result<(), DispatchError> {
    if request.is_cancelled() {
        Err(DispatchError::Cancelled)
    } else {
        Ok(())
    }
}

fn cancelled(stage: &str) -> Response {
    info!(stage = stage, "Dispatch cancelled");
    DispatchError::Cancelled.into_response()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// A panic caught at `stage` becomes a 500 handler error.
fn panicked(stage: &str, action: &str, payload: &(dyn std::any::Any + Send)) -> Response {
    let message = panic_message(payload);
    error!(stage = stage, action = %action, panic_message = %message, "Panic caught - CRITICAL");
    DispatchError::handler(action, anyhow::anyhow!("panicked in {stage}: {message}")).into_response()
}

/// The pipeline for one request against one controller.
///
/// Panics from controller hooks, components and the action are all caught,
/// so the caller always gets a response.
fn run<C: Controller>(
    descriptor: &ControllerDescriptor<C>,
    chain: &ComponentChain,
    request: &Request,
    rendering: &Rendering,
    started: Instant,
) -> Response {
    let pre = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut controller = descriptor.instantiate();
        let outcome = chain.run_before(request, &descriptor.name, |component| {
            controller.prepare_component(component, request)
        });
        (controller, outcome)
    }));
    let (mut controller, configs) = match pre {
        Ok((controller, PreOutcome::Continue(configs))) => (controller, configs),
        Ok((
            _,
            PreOutcome::ShortCircuit {
                component,
                response,
            },
        )) => {
            debug!(component = %component, status = response.status, "Pre-phase short-circuit");
            return response;
        }
        Err(payload) => return panicked("pre-phase", "-", payload.as_ref()),
    };
    if request.is_cancelled() {
        return cancelled("pre-phase");
    }

    let mut ctx = ActionContext::new(request, &descriptor.name, configs);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<Response, DispatchError> {
        let response = invoke(&mut controller, descriptor, &mut ctx, rendering)?;
        checkpoint(request)?;
        Ok(controller.post_process_response(response, &ctx))
    }));

    let action_label = ctx
        .action()
        .map_or_else(|| "-".to_string(), |a| a.to_string());
    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(DispatchError::Cancelled)) => return cancelled("controller"),
        Ok(Err(err)) => {
            if err.status() >= 500 {
                error!(action = %action_label, error = %err, kind = err.kind(), "Dispatch failed");
            } else {
                info!(action = %action_label, error = %err, kind = err.kind(), "Dispatch rejected");
            }
            err.into_response()
        }
        Err(payload) => panicked("controller", &action_label, payload.as_ref()),
    };
    if request.is_cancelled() {
        return cancelled("post-process");
    }

    panic::catch_unwind(AssertUnwindSafe(|| {
        chain.run_after(
            request,
            response,
            &descriptor.name,
            ctx.action(),
            ctx.component_configs(),
            started.elapsed(),
        )
    }))
    .unwrap_or_else(|payload| panicked("post-phase", &action_label, payload.as_ref()))
}

/// Controller hooks, resolution, the action call and rendering.
fn invoke<C: Controller>(
    controller: &mut C,
    descriptor: &ControllerDescriptor<C>,
    ctx: &mut ActionContext<'_>,
    rendering: &Rendering,
) -> Result<Response, DispatchError> {
    let request = ctx.request();

    controller.pre_process_request(ctx);
    checkpoint(request)?;

    let custom = controller.action_for_name(request.first_segment(), request);
    let resolution = resolve(request.method(), request.segments(), &descriptor.actions, custom)?;
    let entry = descriptor
        .actions
        .get(&resolution.action)
        .ok_or_else(|| DispatchError::not_found(format!("action '{}' is not declared", resolution.action)))?;
    debug!(
        action = %resolution.action,
        resolved_by = ?resolution.source,
        identifier = ?resolution.identifier,
        "Action resolved"
    );
    ctx.resolved(resolution.action.clone(), resolution.identifier, resolution.rest);

    let has_init = entry.init.is_some();
    if let Some(init) = &entry.init {
        init(controller, ctx);
    }
    checkpoint(request)?;

    let selected = select(rendering, ctx.selection(), has_init, &entry.convention_view)?;
    let selection_before = ctx.selection().clone();

    let result = (entry.handler)(controller, ctx)
        .map_err(|e| DispatchError::handler(resolution.action.as_str(), e))?;
    checkpoint(request)?;

    match result {
        ActionResult::Response(response) => {
            debug!(status = response.status, "Action returned a response; rendering skipped");
            Ok(response)
        }
        ActionResult::Data(data) => {
            let (view, layout) = if *ctx.selection() == selection_before {
                selected
            } else {
                select(rendering, ctx.selection(), has_init, &entry.convention_view)?
            };
            debug!(
                view = %view.name(),
                layout = layout.as_ref().map(|l| l.name()).unwrap_or("-"),
                "Rendering"
            );
            render(&data, view.as_ref(), layout.as_deref(), rendering.templates.as_ref())
        }
    }
}

type Selected = (Arc<dyn View>, Option<Arc<dyn View>>);

fn select(
    rendering: &Rendering,
    selection: &ViewSelection,
    has_init: bool,
    convention_view: &str,
) -> Result<Selected, DispatchError> {
    let view = rendering
        .views
        .select_view(selection, has_init, convention_view)
        .inspect_err(|e| warn!(error = %e, "View selection failed"))?;
    let layout = rendering
        .views
        .select_layout(&selection.layout, rendering.default_layout.as_deref())?;
    Ok((view, layout))
}
