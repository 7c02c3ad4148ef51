//! Template store backed by minijinja.
//!
//! Templates are looked up by view name (`IndexWidgetsView`,
//! `SiteLayout`, ...). A directory store reads every `<name>.<ext>` file
//! at startup; sources never change afterwards. Each `process` call builds
//! a throwaway `minijinja::Environment`, so the store itself holds no
//! render state and is shared freely across coroutines.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::Environment;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ConfigError, DispatchError};

pub const DEFAULT_TEMPLATE_EXTENSION: &str = "html";

/// A loaded template handle. Cheap to clone; dropped after the render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResource {
    pub name: String,
    pub source: Arc<str>,
}

/// Where views get their templates from.
pub trait TemplateStore: Send + Sync {
    fn load_template(&self, view_name: &str) -> Result<TemplateResource, DispatchError>;

    /// Render `resource` against `data`. Must not mutate `data`.
    fn process(&self, resource: &TemplateResource, data: &Value) -> Result<Vec<u8>, DispatchError>;

    /// Names this store can serve, used to register views at startup.
    fn template_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn has_template(&self, view_name: &str) -> bool {
        self.load_template(view_name).is_ok()
    }
}

/// In-memory map of template sources rendered with minijinja.
#[derive(Debug, Default, Clone)]
pub struct MiniJinjaStore {
    sources: HashMap<String, Arc<str>>,
    escape_html: bool,
}

impl MiniJinjaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.<extension>` file in `dir`; the file stem becomes the
    /// template name. `html` stores escape interpolated values.
    pub fn from_dir(dir: impl AsRef<Path>, extension: &str) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let io_err = |source| ConfigError::Io {
            path: dir.display().to_string(),
            source,
        };
        let mut store = Self {
            sources: HashMap::new(),
            escape_html: extension.eq_ignore_ascii_case("html"),
        };
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path: PathBuf = entry.map_err(io_err)?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            debug!(template = %stem, path = %path.display(), "Loaded template");
            store.sources.insert(stem.to_string(), Arc::from(source));
        }
        info!(dir = %dir.display(), count = store.sources.len(), "Template store ready");
        Ok(store)
    }

    pub fn from_sources<I, K, V>(sources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        Self {
            sources: sources
                .into_iter()
                .map(|(k, v)| (k.into(), Arc::from(v.as_ref())))
                .collect(),
            escape_html: false,
        }
    }

    #[must_use]
    pub fn with_html_escaping(mut self) -> Self {
        self.escape_html = true;
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl AsRef<str>) {
        self.sources.insert(name.into(), Arc::from(source.as_ref()));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl TemplateStore for MiniJinjaStore {
    fn load_template(&self, view_name: &str) -> Result<TemplateResource, DispatchError> {
        self.sources
            .get(view_name)
            .map(|source| TemplateResource {
                name: view_name.to_string(),
                source: Arc::clone(source),
            })
            .ok_or_else(|| DispatchError::template_not_found(view_name))
    }

    fn process(&self, resource: &TemplateResource, data: &Value) -> Result<Vec<u8>, DispatchError> {
        // minijinja picks auto-escaping from the template name's extension
        let name = if self.escape_html { "view.html" } else { "view" };
        let mut env = Environment::new();
        env.add_template(name, &resource.source).map_err(|e| {
            DispatchError::configuration(format!("template '{}' failed to compile: {e}", resource.name))
        })?;
        let tmpl = env.get_template(name).map_err(|e| {
            DispatchError::configuration(format!("template '{}' missing after compile: {e}", resource.name))
        })?;
        let rendered = tmpl.render(data).map_err(|e| {
            DispatchError::configuration(format!("template '{}' failed to render: {e}", resource.name))
        })?;
        Ok(rendered.into_bytes())
    }

    fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }

    fn has_template(&self, view_name: &str) -> bool {
        self.sources.contains_key(view_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_against_data() {
        let store = MiniJinjaStore::from_sources([("Hello", "<h1>Hello {{ name }}!</h1>")]);
        let res = store.load_template("Hello").unwrap();
        let out = store.process(&res, &json!({ "name": "World" })).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<h1>Hello World!</h1>");
    }

    #[test]
    fn missing_template_is_template_not_found() {
        let store = MiniJinjaStore::new();
        let err = store.load_template("Nope").unwrap_err();
        assert!(matches!(err, DispatchError::TemplateNotFound { .. }));
    }

    #[test]
    fn escaping_follows_store_setting() {
        let data = json!({ "v": "<b>" });
        let plain = MiniJinjaStore::from_sources([("T", "{{ v }}")]);
        let res = plain.load_template("T").unwrap();
        assert_eq!(plain.process(&res, &data).unwrap(), b"<b>");

        let escaped = plain.clone().with_html_escaping();
        assert_eq!(escaped.process(&res, &data).unwrap(), b"&lt;b&gt;");
    }

    #[test]
    fn broken_template_is_a_configuration_error() {
        let store = MiniJinjaStore::from_sources([("Bad", "{% if %}")]);
        let res = store.load_template("Bad").unwrap();
        let err = store.process(&res, &json!({})).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn directory_store_uses_file_stems() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("IndexWidgetsView.html"), "{{ count }} widgets").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let store = MiniJinjaStore::from_dir(dir.path(), "html").unwrap();
        assert_eq!(store.template_names(), vec!["IndexWidgetsView".to_string()]);
        let res = store.load_template("IndexWidgetsView").unwrap();
        assert_eq!(store.process(&res, &json!({ "count": 3 })).unwrap(), b"3 widgets");
    }
}
