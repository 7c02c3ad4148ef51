use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::controller::ActionName;
use crate::request::Request;
use crate::response::Response;

/// Result of a component callback, consumed uniformly by the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Keep going
    Continue,
    /// Pre-phase: answer with this response. Post-phase: swap the response
    /// and keep going.
    Replace(Response),
    /// Answer with this response and run no further component in this phase
    Halt(Response),
    /// Stop signal without a response; the chain substitutes a not-found
    /// response
    Stop,
}

/// Settings bundle for one component on one controller.
///
/// Static bundles come from registration code or the YAML config; the
/// controller's `prepare_component` hook may overlay per-request values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentConfig(Map<String, Value>);

impl ComponentConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// String list under `key`; a single string counts as a one-element list.
    #[must_use]
    pub fn get_str_list(&self, key: &str) -> Vec<&str> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    /// Overwrite keys with those of `other`.
    pub fn merge(&mut self, other: &ComponentConfig) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    #[must_use]
    pub fn merged(&self, overlay: Option<&ComponentConfig>) -> ComponentConfig {
        let mut out = self.clone();
        if let Some(overlay) = overlay {
            out.merge(overlay);
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a component sees besides the request and response.
#[derive(Debug, Clone, Copy)]
pub struct ComponentContext<'a> {
    pub controller: &'a str,
    /// Resolved action; always `None` in the pre-phase
    pub action: Option<&'a ActionName>,
    pub config: &'a ComponentConfig,
    /// Time since dispatch started; zero in the pre-phase
    pub elapsed: Duration,
}

/// A named, chain-ordered unit with pre- and post-dispatch callbacks.
///
/// One instance is shared by every controller and every concurrent dispatch,
/// so per-request state must not be kept on `self`.
pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    fn before(&self, _req: &Request, _cx: &ComponentContext<'_>) -> Flow {
        Flow::Continue
    }

    fn after(&self, _req: &Request, _res: &mut Response, _cx: &ComponentContext<'_>) -> Flow {
        Flow::Continue
    }

    /// A later component answered the request in the pre-phase, so `after`
    /// will not run for this request. Only components whose `before` already
    /// continued are told.
    fn short_circuited(&self, _req: &Request, _res: &Response, _cx: &ComponentContext<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_wins_over_static_values() {
        let base = ComponentConfig::from_pairs([("token", json!("a")), ("header", json!("x"))]);
        let overlay = ComponentConfig::new().with("token", json!("b"));
        let merged = base.merged(Some(&overlay));
        assert_eq!(merged.get_str("token"), Some("b"));
        assert_eq!(merged.get_str("header"), Some("x"));
        assert_eq!(base.get_str("token"), Some("a"));
    }

    #[test]
    fn string_lists_accept_scalars() {
        let cfg = ComponentConfig::from_pairs([("a", json!(["GET", "HEAD"])), ("b", json!("GET"))]);
        assert_eq!(cfg.get_str_list("a"), vec!["GET", "HEAD"]);
        assert_eq!(cfg.get_str_list("b"), vec!["GET"]);
        assert!(cfg.get_str_list("c").is_empty());
    }
}
