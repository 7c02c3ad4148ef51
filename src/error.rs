//! Error taxonomy for the dispatch pipeline.
//!
//! Every failure the pipeline can observe after the pre-phase is a
//! [`DispatchError`]; the dispatcher converts it into a terminal
//! [`Response`] with [`DispatchError::into_response`] so the transport always
//! receives exactly one response per request.

use serde_json::json;

use crate::response::Response;

/// Status used for dispatches abandoned because the client went away.
pub const STATUS_CLIENT_CLOSED: u16 = 499;

/// Failures raised while resolving, invoking or rendering an action.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler answers the request: unknown explicit name, unmapped verb,
    /// a resolved action the controller does not implement, or a component
    /// that stopped the chain.
    #[error("not found: {reason}")]
    NotFound { reason: String },

    /// A view was selected but the template store has nothing for it.
    #[error("template not found for view '{view}'")]
    TemplateNotFound { view: String },

    /// The action itself failed (returned an error or panicked).
    #[error("action '{action}' failed: {source}")]
    Handler {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    /// The controller asked for something that cannot exist, e.g. an init
    /// hook selecting a view that was never registered.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Cancellation was observed at a stage boundary.
    #[error("dispatch cancelled")]
    Cancelled,
}

impl DispatchError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        DispatchError::NotFound {
            reason: reason.into(),
        }
    }

    pub fn template_not_found(view: impl Into<String>) -> Self {
        DispatchError::TemplateNotFound { view: view.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        DispatchError::Configuration(message.into())
    }

    /// Wrap an action failure. Errors that already carry a `DispatchError`
    /// (for example an action returning `Err(DispatchError::not_found(..))`)
    /// keep their own classification.
    pub fn handler(action: impl Into<String>, source: anyhow::Error) -> Self {
        match source.downcast::<DispatchError>() {
            Ok(inner) => inner,
            Err(source) => DispatchError::Handler {
                action: action.into(),
                source,
            },
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::TemplateNotFound { .. } => 500,
            DispatchError::Handler { .. } => 500,
            DispatchError::Configuration(_) => 500,
            DispatchError::Cancelled => STATUS_CLIENT_CLOSED,
        }
    }

    /// Short machine-readable class name used in error bodies and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::NotFound { .. } => "NotFound",
            DispatchError::TemplateNotFound { .. } => "TemplateNotFound",
            DispatchError::Handler { .. } => "HandlerError",
            DispatchError::Configuration(_) => "ConfigurationError",
            DispatchError::Cancelled => "Cancelled",
        }
    }

    /// Terminal response for this failure.
    #[must_use]
    pub fn into_response(self) -> Response {
        let status = self.status();
        Response::json(
            status,
            json!({
                "error": self.kind(),
                "message": self.to_string(),
            }),
        )
    }
}

/// Startup-time failures: building controllers, mounting them, or loading
/// configuration. These never occur while serving.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("controller '{controller}' declares component '{component}' which is not registered")]
    UnknownComponent {
        controller: String,
        component: String,
    },

    #[error("settings given for component '{component}' which controller '{controller}' does not use")]
    UnusedComponentSettings {
        controller: String,
        component: String,
    },

    #[error("mount point '{0}' is already taken")]
    DuplicateMount(String),

    #[error("action '{action}' registered twice on controller '{controller}'")]
    DuplicateAction { controller: String, action: String },

    #[error("controller '{controller}' registers init hook '{hook}' for an action it does not declare")]
    UnknownInitHook { controller: String, hook: String },

    #[error("view '{0}' is referenced by configuration but not registered")]
    UnknownView(String),

    #[error("invalid name '{0}': names must be non-empty and contain no '/'")]
    InvalidName(String),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
