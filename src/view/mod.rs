//! # View Module
//!
//! Views turn action data into a response body. A [`TemplateView`] renders
//! the template of the same name from the [`TemplateStore`]; the
//! [`DefaultView`] is used when nothing else was selected. Layouts are plain
//! views whose template receives the inner output as `content`.
//!
//! Selection order for one request:
//!
//! 1. a view set on the [`ActionContext`](crate::controller::ActionContext)
//!    by `pre_process_request` or the action's init hook
//! 2. without an init hook: `<Action><Controller>View` when registered
//! 3. the default view

mod registry;
mod render;

pub use registry::ViewRegistry;
pub use render::render;

use serde_json::Value;

use crate::error::DispatchError;
use crate::response::{Response, CONTENT_TYPE_HTML};
use crate::template::TemplateStore;

pub const DEFAULT_VIEW: &str = "DefaultView";

/// Renders action data into a response.
pub trait View: Send + Sync {
    fn name(&self) -> &str;

    fn content_type(&self) -> &str {
        CONTENT_TYPE_HTML
    }

    /// Produce a `200` response from `data`. Must not mutate `data`.
    fn display(&self, data: &Value, templates: &dyn TemplateStore) -> Result<Response, DispatchError>;
}

/// View backed by a template in the store.
#[derive(Debug, Clone)]
pub struct TemplateView {
    name: String,
    template: String,
    content_type: String,
}

impl TemplateView {
    /// View rendering the template called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            template: name.clone(),
            name,
            content_type: CONTENT_TYPE_HTML.to_string(),
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template
    }
}

impl View for TemplateView {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn display(&self, data: &Value, templates: &dyn TemplateStore) -> Result<Response, DispatchError> {
        let resource = templates.load_template(&self.template)?;
        let body = templates.process(&resource, data)?;
        Ok(Response::bytes(200, &self.content_type, body))
    }
}

/// Fallback view: the `DefaultView` template when the store has one,
/// otherwise the data as JSON. Never fails with `TemplateNotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultView;

impl View for DefaultView {
    fn name(&self) -> &str {
        DEFAULT_VIEW
    }

    fn display(&self, data: &Value, templates: &dyn TemplateStore) -> Result<Response, DispatchError> {
        match templates.load_template(DEFAULT_VIEW) {
            Ok(resource) => {
                let body = templates.process(&resource, data)?;
                Ok(Response::bytes(200, CONTENT_TYPE_HTML, body))
            }
            Err(DispatchError::TemplateNotFound { .. }) => Ok(Response::json(200, data.clone())),
            Err(e) => Err(e),
        }
    }
}
