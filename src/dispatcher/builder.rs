use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::core::{Dispatcher, Endpoint, Mounted, Rendering};
use crate::component::{Component, ComponentConfig, ComponentRegistry};
use crate::config::AppConfig;
use crate::controller::{Controller, ControllerDescriptor};
use crate::error::ConfigError;
use crate::router::MountTable;
use crate::template::{MiniJinjaStore, TemplateStore};
use crate::view::{View, ViewRegistry};

type Overrides = HashMap<String, ComponentConfig>;
type MountFn = Box<dyn FnOnce(&ComponentRegistry, &Overrides) -> Result<Box<dyn Endpoint>, ConfigError>>;

struct PendingMount {
    prefix: String,
    controller: String,
    build: MountFn,
}

/// Startup-time assembly of a [`Dispatcher`].
///
/// Registration order does not matter: component chains are resolved when
/// [`build`](Self::build) runs, after every component and override is known.
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::builder()
///     .templates(MiniJinjaStore::from_dir("templates", "html")?)
///     .global_component(Arc::new(TracingComponent))
///     .component(Arc::new(AuthComponent::new("secret")))
///     .default_layout("SiteLayout")
///     .mount("/widgets", widgets_descriptor)
///     .build()?;
/// ```
#[derive(Default)]
pub struct DispatcherBuilder {
    templates: Option<Arc<dyn TemplateStore>>,
    views: ViewRegistry,
    components: ComponentRegistry,
    default_layout: Option<String>,
    overrides: HashMap<String, Overrides>,
    pending: Vec<PendingMount>,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn templates(mut self, store: impl TemplateStore + 'static) -> Self {
        self.templates = Some(Arc::new(store));
        self
    }

    #[must_use]
    pub fn shared_templates(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.templates = Some(store);
        self
    }

    /// Register a view explicitly. Views registered this way win over the
    /// template views created for every template in the store.
    #[must_use]
    pub fn view(mut self, view: Arc<dyn View>) -> Self {
        self.views.register(view);
        self
    }

    /// Make a component available to controllers that declare it.
    #[must_use]
    pub fn component(mut self, component: Arc<dyn Component>) -> Self {
        self.components.register(component);
        self
    }

    /// Component that runs first on every controller.
    #[must_use]
    pub fn global_component(mut self, component: Arc<dyn Component>) -> Self {
        self.components.register_global(component);
        self
    }

    #[must_use]
    pub fn default_layout(mut self, layout: impl Into<String>) -> Self {
        self.default_layout = Some(layout.into());
        self
    }

    /// Static component settings for `controller`, merged over the ones
    /// given at registration.
    #[must_use]
    pub fn component_settings(mut self, controller: &str, component: &str, config: ComponentConfig) -> Self {
        self.overrides
            .entry(controller.to_string())
            .or_default()
            .entry(component.to_string())
            .or_default()
            .merge(&config);
        self
    }

    /// Apply a loaded config file: template directory, default layout and
    /// per-controller component settings.
    pub fn apply_config(mut self, config: &AppConfig) -> Result<Self, ConfigError> {
        if let Some(dir) = &config.templates.dir {
            self = self.templates(MiniJinjaStore::from_dir(dir, &config.templates.extension)?);
        }
        if let Some(layout) = &config.views.default_layout {
            self.default_layout = Some(layout.clone());
        }
        for (controller, settings) in &config.controllers {
            for (component, bundle) in &settings.components {
                self = self.component_settings(controller, component, bundle.clone());
            }
        }
        Ok(self)
    }

    /// Mount a sealed controller under `prefix`.
    #[must_use]
    pub fn mount<C: Controller>(mut self, prefix: &str, descriptor: ControllerDescriptor<C>) -> Self {
        let controller = descriptor.name.clone();
        let build: MountFn = Box::new(move |registry: &ComponentRegistry, overrides: &Overrides| {
            let chain = registry.chain_for(&descriptor.name, &descriptor.components, overrides)?;
            Ok(Box::new(Mounted { descriptor, chain }) as Box<dyn Endpoint>)
        });
        self.pending.push(PendingMount {
            prefix: prefix.to_string(),
            controller,
            build,
        });
        self
    }

    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        let templates: Arc<dyn TemplateStore> = self
            .templates
            .unwrap_or_else(|| Arc::new(MiniJinjaStore::new()) as Arc<dyn TemplateStore>);
        let mut views = self.views;
        let added = views.register_templates(templates.as_ref());

        if let Some(layout) = &self.default_layout {
            if !views.contains(layout) {
                return Err(ConfigError::UnknownView(layout.clone()));
            }
        }

        let mounted: Vec<&str> = self.pending.iter().map(|p| p.controller.as_str()).collect();
        for name in self.overrides.keys() {
            if !mounted.contains(&name.as_str()) {
                warn!(controller = %name, "Component settings given for a controller that is not mounted");
            }
        }

        let empty = Overrides::new();
        let mut mounts: MountTable<Box<dyn Endpoint>> = MountTable::new();
        for pending in self.pending {
            let overrides = self.overrides.get(&pending.controller).unwrap_or(&empty);
            let endpoint = (pending.build)(&self.components, overrides)?;
            info!(
                mount = %pending.prefix,
                controller = %pending.controller,
                components = ?endpoint.chain().names(),
                "Controller mounted"
            );
            mounts.insert(&pending.prefix, endpoint)?;
        }

        info!(
            controllers = mounts.len(),
            views = views.names().len(),
            template_views = added,
            default_layout = self.default_layout.as_deref().unwrap_or("-"),
            "Dispatcher ready"
        );
        Ok(Dispatcher {
            mounts,
            rendering: Rendering {
                views,
                templates,
                default_layout: self.default_layout,
            },
        })
    }
}
