use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::context::ActionContext;
use crate::error::ConfigError;
use crate::response::Response;

/// Suffix appended to explicit action names at registration time.
pub const EXPLICIT_SUFFIX: &str = "Action";

/// Resolved handler identifier.
///
/// Built-in actions use their bare names (`index`, `object`, `create`,
/// `update`, `delete`); explicit actions are stored as `<segment>Action`.
/// The formatting happens once, when the action table is built, so request
/// time lookups are plain hash lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionName(Arc<str>);

impl ActionName {
    pub const INDEX: &'static str = "index";
    pub const OBJECT: &'static str = "object";
    pub const CREATE: &'static str = "create";
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";

    /// Wrap an already formatted identifier.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[must_use]
    pub fn index() -> Self {
        Self::new(Self::INDEX)
    }

    #[must_use]
    pub fn object() -> Self {
        Self::new(Self::OBJECT)
    }

    #[must_use]
    pub fn create() -> Self {
        Self::new(Self::CREATE)
    }

    #[must_use]
    pub fn update() -> Self {
        Self::new(Self::UPDATE)
    }

    #[must_use]
    pub fn delete() -> Self {
        Self::new(Self::DELETE)
    }

    /// `search` becomes `searchAction`.
    #[must_use]
    pub fn explicit(segment: &str) -> Self {
        Self(Arc::from(format!("{segment}{EXPLICIT_SUFFIX}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.0.len() > EXPLICIT_SUFFIX.len() && self.0.ends_with(EXPLICIT_SUFFIX)
    }

    /// Name without the explicit suffix: `searchAction` → `search`.
    #[must_use]
    pub fn stem(&self) -> &str {
        if self.is_explicit() {
            &self.0[..self.0.len() - EXPLICIT_SUFFIX.len()]
        } else {
            &self.0
        }
    }

    /// Key of the per-action init hook: `index` → `initIndexAction`.
    #[must_use]
    pub fn init_hook_key(&self) -> String {
        format!("init{}{EXPLICIT_SUFFIX}", capitalize(self.stem()))
    }

    /// Convention view name: `index` on `Widgets` → `IndexWidgetsView`.
    #[must_use]
    pub fn convention_view(&self, controller: &str) -> String {
        format!("{}{}View", capitalize(self.stem()), controller)
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// What an action hands back to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// A finished response; rendering is skipped.
    Response(Response),
    /// Structured data for the selected view.
    Data(Value),
}

impl From<Response> for ActionResult {
    fn from(r: Response) -> Self {
        ActionResult::Response(r)
    }
}

impl From<Value> for ActionResult {
    fn from(v: Value) -> Self {
        ActionResult::Data(v)
    }
}

pub type HandlerResult = anyhow::Result<ActionResult>;

/// Action handler stored in the table.
pub type ActionFn<C> = Arc<dyn Fn(&mut C, &mut ActionContext<'_>) -> HandlerResult + Send + Sync>;

/// Per-action init hook; may select a view and layout before the action runs.
pub type InitFn<C> = Arc<dyn Fn(&mut C, &mut ActionContext<'_>) + Send + Sync>;

/// Anything that can answer "is this action implemented?".
pub trait ActionSet {
    fn declares(&self, action: &ActionName) -> bool;
}

impl ActionSet for std::collections::HashSet<ActionName> {
    fn declares(&self, action: &ActionName) -> bool {
        self.contains(action)
    }
}

pub struct ActionEntry<C> {
    pub(crate) handler: ActionFn<C>,
    pub(crate) init: Option<InitFn<C>>,
    /// `<Action><Controller>View`, formatted at build time
    pub(crate) convention_view: String,
}

impl<C> Clone for ActionEntry<C> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            init: self.init.clone(),
            convention_view: self.convention_view.clone(),
        }
    }
}

/// Read-only lookup table from action names to handlers.
///
/// Populated once by [`ControllerBuilder`](super::ControllerBuilder); init
/// hooks are keyed by their formatted `init<Action>Action` name and attached
/// to their action when the table is sealed.
pub struct ActionTable<C> {
    entries: HashMap<ActionName, ActionEntry<C>>,
}

impl<C> ActionTable<C> {
    pub(crate) fn seal(
        controller: &str,
        handlers: Vec<(ActionName, ActionFn<C>)>,
        inits: Vec<(String, InitFn<C>)>,
    ) -> Result<Self, ConfigError> {
        let mut entries: HashMap<ActionName, ActionEntry<C>> = HashMap::new();
        for (name, handler) in handlers {
            if entries.contains_key(&name) {
                return Err(ConfigError::DuplicateAction {
                    controller: controller.to_string(),
                    action: name.to_string(),
                });
            }
            let convention_view = name.convention_view(controller);
            entries.insert(
                name,
                ActionEntry {
                    handler,
                    init: None,
                    convention_view,
                },
            );
        }

        let mut by_init_key: HashMap<String, ActionName> = entries
            .keys()
            .map(|name| (name.init_hook_key(), name.clone()))
            .collect();
        for (key, hook) in inits {
            let Some(name) = by_init_key.remove(&key) else {
                return Err(ConfigError::UnknownInitHook {
                    controller: controller.to_string(),
                    hook: key,
                });
            };
            if let Some(entry) = entries.get_mut(&name) {
                entry.init = Some(hook);
            }
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn get(&self, action: &ActionName) -> Option<&ActionEntry<C>> {
        self.entries.get(action)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared action names, sorted for stable output.
    #[must_use]
    pub fn names(&self) -> Vec<&ActionName> {
        let mut names: Vec<&ActionName> = self.entries.keys().collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        names
    }
}

impl<C> ActionSet for ActionTable<C> {
    fn declares(&self, action: &ActionName) -> bool {
        self.entries.contains_key(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_names_are_formatted_once() {
        let name = ActionName::explicit("search");
        assert_eq!(name.as_str(), "searchAction");
        assert!(name.is_explicit());
        assert_eq!(name.stem(), "search");
        assert_eq!(name.init_hook_key(), "initSearchAction");
        assert_eq!(name.convention_view("Widgets"), "SearchWidgetsView");
    }

    #[test]
    fn builtin_names_have_no_suffix() {
        let name = ActionName::index();
        assert!(!name.is_explicit());
        assert_eq!(name.init_hook_key(), "initIndexAction");
        assert_eq!(name.convention_view("Widgets"), "IndexWidgetsView");
    }

    #[test]
    fn bare_suffix_is_not_explicit() {
        assert!(!ActionName::new("Action").is_explicit());
    }
}
