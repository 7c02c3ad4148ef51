use crate::component::ComponentConfig;
use crate::request::Request;

use super::action::ActionName;

/// Layout requested for the current action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LayoutChoice {
    /// Use the application default layout, if one is configured
    #[default]
    Inherit,
    /// Render the action view alone
    Disabled,
    Named(String),
}

/// View and layout chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewSelection {
    pub view: Option<String>,
    pub layout: LayoutChoice,
}

/// Request-scoped state handed to every controller hook and action.
///
/// Owned by a single dispatch; dropped with it.
pub struct ActionContext<'r> {
    request: &'r Request,
    controller: &'r str,
    action: Option<ActionName>,
    identifier: Option<String>,
    rest: Vec<String>,
    selection: ViewSelection,
    components: Vec<(String, ComponentConfig)>,
}

impl<'r> ActionContext<'r> {
    pub(crate) fn new(
        request: &'r Request,
        controller: &'r str,
        components: Vec<(String, ComponentConfig)>,
    ) -> Self {
        Self {
            request,
            controller,
            action: None,
            identifier: None,
            rest: Vec::new(),
            selection: ViewSelection::default(),
            components,
        }
    }

    #[must_use]
    pub fn request(&self) -> &'r Request {
        self.request
    }

    #[must_use]
    pub fn controller(&self) -> &str {
        self.controller
    }

    /// Resolved action; `None` during `pre_process_request`.
    #[must_use]
    pub fn action(&self) -> Option<&ActionName> {
        self.action.as_ref()
    }

    /// Identifier segment (`42` in `GET /widgets/42`).
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Segments following an explicit action name.
    #[must_use]
    pub fn rest(&self) -> &[String] {
        &self.rest
    }

    pub fn set_view(&mut self, view: impl Into<String>) {
        self.selection.view = Some(view.into());
    }

    pub fn set_layout(&mut self, layout: impl Into<String>) {
        self.selection.layout = LayoutChoice::Named(layout.into());
    }

    pub fn disable_layout(&mut self) {
        self.selection.layout = LayoutChoice::Disabled;
    }

    #[must_use]
    pub fn selection(&self) -> &ViewSelection {
        &self.selection
    }

    /// Effective (static + per-request) settings of a component in this
    /// controller's chain.
    #[must_use]
    pub fn component_config(&self, name: &str) -> Option<&ComponentConfig> {
        self.components
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub(crate) fn resolved(&mut self, action: ActionName, identifier: Option<String>, rest: Vec<String>) {
        self.action = Some(action);
        self.identifier = identifier;
        self.rest = rest;
    }

    pub(crate) fn component_configs(&self) -> &[(String, ComponentConfig)] {
        &self.components
    }
}
