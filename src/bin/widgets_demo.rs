//! Widgets demo service.
//!
//! ```bash
//! widgets-demo serve --config demos/widgets/config.yaml
//! curl localhost:8080/widgets
//! curl -X POST -H 'authorization: demo-token' -d 'name=sprocket&color=blue' localhost:8080/widgets
//! curl localhost:8080/widgets/search/blue
//! ```
//!
//! Reads are public (`public_methods: [GET]` in the config file); writes
//! need the `authorization` header to carry the configured token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use actionwire::cli::{run_cli, Cli};
use actionwire::component::{AuthComponent, ComponentConfig, CorsComponent, AUTH_COMPONENT, CORS_COMPONENT};
use actionwire::controller::{ActionContext, ActionName, Controller, ControllerBuilder, HandlerResult};
use actionwire::{DispatchError, Request, Response};
use clap::Parser;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Widget {
    id: u64,
    name: String,
    color: String,
}

#[derive(Default)]
struct WidgetStore {
    widgets: DashMap<u64, Widget>,
    next_id: AtomicU64,
}

impl WidgetStore {
    fn seeded() -> Self {
        let store = Self::default();
        store.insert("sprocket", "blue");
        store.insert("flange", "red");
        store.insert("gizmo", "blue");
        store
    }

    fn insert(&self, name: &str, color: &str) -> Widget {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let widget = Widget {
            id,
            name: name.to_string(),
            color: color.to_string(),
        };
        self.widgets.insert(id, widget.clone());
        widget
    }

    fn sorted(&self, color: Option<&str>) -> Vec<Widget> {
        let mut list: Vec<Widget> = self
            .widgets
            .iter()
            .filter(|w| color.is_none_or(|c| w.color.eq_ignore_ascii_case(c)))
            .map(|w| w.value().clone())
            .collect();
        list.sort_by_key(|w| w.id);
        list
    }
}

struct Widgets {
    store: Arc<WidgetStore>,
}

/// Field from the form parameters or the JSON body.
fn field(request: &Request, name: &str) -> Option<String> {
    request
        .param(name)
        .map(str::to_string)
        .or_else(|| {
            request
                .body()
                .and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
}

fn widget_id(ctx: &ActionContext<'_>) -> anyhow::Result<u64> {
    let raw = ctx.identifier().unwrap_or_default();
    raw.parse()
        .map_err(|_| DispatchError::not_found(format!("no widget '{raw}'")).into())
}

impl Widgets {
    fn index(&mut self, _ctx: &mut ActionContext<'_>) -> HandlerResult {
        let widgets = self.store.sorted(None);
        Ok(json!({ "title": "All widgets", "widgets": widgets }).into())
    }

    fn object(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
        let id = widget_id(ctx)?;
        let widget = self
            .store
            .widgets
            .get(&id)
            .map(|w| w.value().clone())
            .ok_or_else(|| DispatchError::not_found(format!("no widget {id}")))?;
        Ok(json!({ "widget": widget }).into())
    }

    fn create(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
        let request = ctx.request();
        let name = field(request, "name").ok_or_else(|| anyhow::anyhow!("missing field 'name'"))?;
        let color = field(request, "color").unwrap_or_else(|| "grey".to_string());
        let widget = self.store.insert(&name, &color);
        info!(id = widget.id, name = %widget.name, "Widget created");
        Ok(Response::json(201, json!(widget)).into())
    }

    fn update(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
        let id = widget_id(ctx)?;
        let request = ctx.request();
        let mut entry = self
            .store
            .widgets
            .get_mut(&id)
            .ok_or_else(|| DispatchError::not_found(format!("no widget {id}")))?;
        if let Some(name) = field(request, "name") {
            entry.name = name;
        }
        if let Some(color) = field(request, "color") {
            entry.color = color;
        }
        Ok(Response::json(200, json!(entry.value())).into())
    }

    fn delete(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
        match ctx.identifier() {
            Some(_) => {
                let id = widget_id(ctx)?;
                self.store
                    .widgets
                    .remove(&id)
                    .ok_or_else(|| DispatchError::not_found(format!("no widget {id}")))?;
            }
            None => self.store.widgets.clear(),
        }
        Ok(Response::new(204).into())
    }

    /// `GET /widgets/search/<color>` or `GET /widgets/search?color=<color>`
    fn search(&mut self, ctx: &mut ActionContext<'_>) -> HandlerResult {
        let request = ctx.request();
        let color = ctx
            .rest()
            .first()
            .cloned()
            .or_else(|| field(request, "color"));
        let widgets = self.store.sorted(color.as_deref());
        let title = match &color {
            Some(c) => format!("{c} widgets"),
            None => "All widgets".to_string(),
        };
        Ok(json!({ "title": title, "widgets": widgets }).into())
    }

    /// Search results reuse the listing template.
    fn init_search(&mut self, ctx: &mut ActionContext<'_>) {
        ctx.set_view("IndexWidgetsView");
    }

    fn export(&mut self, _ctx: &mut ActionContext<'_>) -> HandlerResult {
        Ok(json!({ "widgets": self.store.sorted(None) }).into())
    }

    /// Export is plain JSON: the default view, no layout.
    fn init_export(&mut self, ctx: &mut ActionContext<'_>) {
        ctx.set_view(actionwire::view::DEFAULT_VIEW);
        ctx.disable_layout();
    }
}

impl Controller for Widgets {
    fn prepare_component(&mut self, component: &str, request: &Request) -> Option<ComponentConfig> {
        // exports are readable by anyone, whatever the method
        (component == AUTH_COMPONENT && request.first_segment() == Some("export"))
            .then(|| ComponentConfig::new().with("public", json!(true)))
    }

    /// `/widgets/id/<n>` is an alias of `/widgets/<n>`.
    fn action_for_name(&self, name: Option<&str>, _request: &Request) -> Option<ActionName> {
        (name == Some("id")).then(ActionName::object)
    }

    fn post_process_response(&mut self, mut response: Response, _ctx: &ActionContext<'_>) -> Response {
        response.set_header("x-widget-count", self.store.widgets.len().to_string());
        response
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let store = Arc::new(WidgetStore::seeded());

    run_cli(cli, move |builder| {
        let widgets = ControllerBuilder::new("Widgets", move || Widgets {
            store: Arc::clone(&store),
        })
        .index(Widgets::index)
        .object(Widgets::object)
        .create(Widgets::create)
        .update(Widgets::update)
        .delete(Widgets::delete)
        .action("search", Widgets::search)
        .init(ActionName::explicit("search"), Widgets::init_search)
        .action("export", Widgets::export)
        .init(ActionName::explicit("export"), Widgets::init_export)
        .component(CORS_COMPONENT)
        .component(AUTH_COMPONENT)
        .build()?;

        Ok(builder
            .component(Arc::new(CorsComponent::default()))
            .component(Arc::new(AuthComponent::unconfigured()))
            .mount("/widgets", widgets))
    })
}
