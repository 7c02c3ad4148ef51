use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{DefaultView, TemplateView, View, DEFAULT_VIEW};
use crate::controller::{LayoutChoice, ViewSelection};
use crate::error::DispatchError;
use crate::template::TemplateStore;

/// Views and layouts known to the application, by name.
///
/// Built at startup and read-only while serving.
#[derive(Clone)]
pub struct ViewRegistry {
    views: HashMap<String, Arc<dyn View>>,
    default_view: Arc<dyn View>,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self {
            views: HashMap::new(),
            default_view: Arc::new(DefaultView),
        }
    }
}

impl ViewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, view: Arc<dyn View>) {
        self.views.insert(view.name().to_string(), view);
    }

    /// Register a [`TemplateView`] for every template in `store` that has no
    /// view yet. Returns the number added.
    pub fn register_templates(&mut self, store: &dyn TemplateStore) -> usize {
        let mut added = 0;
        for name in store.template_names() {
            if name == DEFAULT_VIEW || self.views.contains_key(&name) {
                continue;
            }
            debug!(view = %name, "Registered template view");
            self.views
                .insert(name.clone(), Arc::new(TemplateView::new(name)));
            added += 1;
        }
        added
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn View>> {
        self.views.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    #[must_use]
    pub fn default_view(&self) -> &Arc<dyn View> {
        &self.default_view
    }

    /// Sorted names of registered views.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.views.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Pick the view for one request. An explicitly selected view must be
    /// registered; the convention view is only consulted when the action
    /// has no init hook.
    pub fn select_view(
        &self,
        selection: &ViewSelection,
        has_init_hook: bool,
        convention_view: &str,
    ) -> Result<Arc<dyn View>, DispatchError> {
        if let Some(name) = &selection.view {
            if name == DEFAULT_VIEW && !self.views.contains_key(name) {
                return Ok(Arc::clone(&self.default_view));
            }
            return self
                .views
                .get(name)
                .cloned()
                .ok_or_else(|| DispatchError::configuration(format!("view '{name}' is not registered")));
        }
        if !has_init_hook {
            if let Some(view) = self.views.get(convention_view) {
                return Ok(Arc::clone(view));
            }
        }
        Ok(Arc::clone(&self.default_view))
    }

    /// Pick the layout for one request; `None` means render without one.
    pub fn select_layout(
        &self,
        choice: &LayoutChoice,
        default_layout: Option<&str>,
    ) -> Result<Option<Arc<dyn View>>, DispatchError> {
        let name = match choice {
            LayoutChoice::Disabled => return Ok(None),
            LayoutChoice::Inherit => match default_layout {
                Some(name) => name,
                None => return Ok(None),
            },
            LayoutChoice::Named(name) => name.as_str(),
        };
        self.views
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| DispatchError::configuration(format!("layout '{name}' is not registered")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MiniJinjaStore;

    fn registry() -> ViewRegistry {
        let store = MiniJinjaStore::from_sources([
            ("IndexWidgetsView", ""),
            ("SearchWidgetsView", ""),
            ("SiteLayout", ""),
            (DEFAULT_VIEW, ""),
        ]);
        let mut reg = ViewRegistry::new();
        assert_eq!(reg.register_templates(&store), 3);
        reg
    }

    #[test]
    fn convention_view_used_without_init_hook() {
        let reg = registry();
        let view = reg
            .select_view(&ViewSelection::default(), false, "IndexWidgetsView")
            .unwrap();
        assert_eq!(view.name(), "IndexWidgetsView");
    }

    #[test]
    fn init_hook_disables_convention_lookup() {
        let reg = registry();
        let view = reg
            .select_view(&ViewSelection::default(), true, "SearchWidgetsView")
            .unwrap();
        assert_eq!(view.name(), DEFAULT_VIEW);
    }

    #[test]
    fn unregistered_selection_is_a_configuration_error() {
        let reg = registry();
        let selection = ViewSelection {
            view: Some("Missing".into()),
            layout: LayoutChoice::Inherit,
        };
        let err = reg.select_view(&selection, true, "x").err().unwrap();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn default_view_can_be_selected_by_name() {
        let reg = ViewRegistry::new();
        let selection = ViewSelection {
            view: Some(DEFAULT_VIEW.into()),
            layout: LayoutChoice::Inherit,
        };
        let view = reg.select_view(&selection, true, "x").unwrap();
        assert_eq!(view.name(), DEFAULT_VIEW);
    }

    #[test]
    fn layout_choices() {
        let reg = registry();
        assert!(reg.select_layout(&LayoutChoice::Inherit, None).unwrap().is_none());
        assert!(reg
            .select_layout(&LayoutChoice::Disabled, Some("SiteLayout"))
            .unwrap()
            .is_none());
        let layout = reg
            .select_layout(&LayoutChoice::Inherit, Some("SiteLayout"))
            .unwrap()
            .unwrap();
        assert_eq!(layout.name(), "SiteLayout");
        assert!(reg
            .select_layout(&LayoutChoice::Named("Nope".into()), None)
            .is_err());
    }
}
