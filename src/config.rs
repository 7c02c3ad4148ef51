//! # Configuration Module
//!
//! Two sources feed an application:
//!
//! - a YAML file ([`AppConfig`]) describing the server address, template
//!   directory, default layout and per-controller component settings
//! - environment variables ([`RuntimeConfig`]) tuning the coroutine runtime
//!
//! ```yaml
//! server:
//!   addr: 127.0.0.1:8080
//! templates:
//!   dir: templates
//!   extension: html
//! views:
//!   default_layout: SiteLayout
//! controllers:
//!   Widgets:
//!     components:
//!       auth:
//!         public_methods: [GET]
//! ```
//!
//! ## Environment Variables
//!
//! ### `ACTIONWIRE_STACK_SIZE`
//!
//! Coroutine stack size in bytes, decimal (`32768`) or hexadecimal
//! (`0x8000`). Default: `0x8000` (32 KB). Rendering templates needs more
//! stack than a bare JSON handler, hence the larger default.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::component::ComponentConfig;
use crate::error::ConfigError;
use crate::template::DEFAULT_TEMPLATE_EXTENSION;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_STACK_SIZE: usize = 0x8000;
pub const STACK_SIZE_ENV: &str = "ACTIONWIRE_STACK_SIZE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Overrides `ACTIONWIRE_STACK_SIZE` when set
    pub stack_size: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            stack_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Relative paths are resolved against the config file's directory
    pub dir: Option<PathBuf>,
    pub extension: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: None,
            extension: DEFAULT_TEMPLATE_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub default_layout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Static settings per component, merged over those given in code
    pub components: HashMap<String, ComponentConfig>,
}

/// Application configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub templates: TemplatesConfig,
    pub views: ViewsConfig,
    pub controllers: HashMap<String, ControllerConfig>,
}

impl AppConfig {
    /// Read and parse a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text, &path.display().to_string())?;
        if let (Some(dir), Some(base)) = (config.templates.dir.as_mut(), path.parent()) {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }

    /// Parse YAML text; `origin` names the source in error messages.
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Component settings for one controller, if any are configured.
    #[must_use]
    pub fn component_overrides(&self, controller: &str) -> Option<&HashMap<String, ComponentConfig>> {
        self.controllers.get(controller).map(|c| &c.components)
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 32 KB / 0x8000)
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let stack_size = env::var(STACK_SIZE_ENV)
            .ok()
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { stack_size }
    }

    /// Apply to the global `may` runtime. Call once before starting servers.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
