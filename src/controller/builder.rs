use std::sync::Arc;

use super::action::{ActionFn, ActionName, ActionTable, HandlerResult, InitFn};
use super::context::ActionContext;
use super::Controller;
use crate::component::ComponentConfig;
use crate::error::ConfigError;

type Factory<C> = Arc<dyn Fn() -> C + Send + Sync>;

/// Registration-time description of a controller.
///
/// Collects actions, init hooks and the ordered component list, then seals
/// them into a [`ControllerDescriptor`] that the dispatcher mounts.
pub struct ControllerBuilder<C: Controller> {
    name: String,
    factory: Factory<C>,
    handlers: Vec<(ActionName, ActionFn<C>)>,
    inits: Vec<(String, InitFn<C>)>,
    components: Vec<(String, ComponentConfig)>,
    invalid: Option<ConfigError>,
}

impl<C: Controller> ControllerBuilder<C> {
    /// `name` is the controller's convention name (`Widgets` →
    /// `IndexWidgetsView`); `factory` builds one instance per request.
    pub fn new<F>(name: &str, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        let invalid = (!valid_name(name)).then(|| ConfigError::InvalidName(name.to_string()));
        Self {
            name: name.to_string(),
            factory: Arc::new(factory),
            handlers: Vec::new(),
            inits: Vec::new(),
            components: Vec::new(),
            invalid,
        }
    }

    fn register<H>(mut self, name: ActionName, handler: H) -> Self
    where
        H: Fn(&mut C, &mut ActionContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.push((name, Arc::new(handler)));
        self
    }

    /// `GET` with no segment.
    pub fn index<H>(self, handler: H) -> Self
    where
        H: Fn(&mut C, &mut ActionContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(ActionName::index(), handler)
    }

    /// `GET /<id>`.
    pub fn object<H>(self, handler: H) -> Self
    where
        H: Fn(&mut C, &mut ActionContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(ActionName::object(), handler)
    }

    /// `POST` with no segment.
    pub fn create<H>(self, handler: H) -> Self
    where
        H: Fn(&mut C, &mut ActionContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(ActionName::create(), handler)
    }

    /// `POST /<id>` or `PUT /<id>`.
    pub fn update<H>(self, handler: H) -> Self
    where
        H: Fn(&mut C, &mut ActionContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(ActionName::update(), handler)
    }

    /// `DELETE`, with or without an identifier.
    pub fn delete<H>(self, handler: H) -> Self
    where
        H: Fn(&mut C, &mut ActionContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(ActionName::delete(), handler)
    }

    /// Explicit action reachable as the first path segment; stored as
    /// `<segment>Action`.
    pub fn action<H>(mut self, segment: &str, handler: H) -> Self
    where
        H: Fn(&mut C, &mut ActionContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        if !valid_name(segment) && self.invalid.is_none() {
            self.invalid = Some(ConfigError::InvalidName(segment.to_string()));
        }
        self.register(ActionName::explicit(segment), handler)
    }

    /// Init hook for `action`, run before it instead of the convention view
    /// lookup.
    pub fn init<H>(mut self, action: ActionName, hook: H) -> Self
    where
        H: Fn(&mut C, &mut ActionContext<'_>) + Send + Sync + 'static,
    {
        self.inits.push((action.init_hook_key(), Arc::new(hook)));
        self
    }

    /// Append a component to this controller's chain.
    pub fn component(self, name: &str) -> Self {
        self.configure_component(name, ComponentConfig::default())
    }

    /// Append a component (if not yet listed) and merge static settings
    /// into its bundle.
    pub fn configure_component(mut self, name: &str, config: ComponentConfig) -> Self {
        match self.components.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => existing.merge(&config),
            None => self.components.push((name.to_string(), config)),
        }
        self
    }

    pub fn build(self) -> Result<ControllerDescriptor<C>, ConfigError> {
        if let Some(err) = self.invalid {
            return Err(err);
        }
        let actions = ActionTable::seal(&self.name, self.handlers, self.inits)?;
        Ok(ControllerDescriptor {
            name: self.name,
            factory: self.factory,
            actions,
            components: self.components,
        })
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/')
}

/// A sealed controller, ready to be mounted.
pub struct ControllerDescriptor<C> {
    pub(crate) name: String,
    pub(crate) factory: Factory<C>,
    pub(crate) actions: ActionTable<C>,
    pub(crate) components: Vec<(String, ComponentConfig)>,
}

impl<C> ControllerDescriptor<C> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn actions(&self) -> &ActionTable<C> {
        &self.actions
    }

    /// Declared component names in chain order.
    #[must_use]
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub(crate) fn instantiate(&self) -> C {
        (self.factory)()
    }
}
