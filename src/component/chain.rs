use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::core::{Component, ComponentConfig, ComponentContext, Flow};
use crate::controller::ActionName;
use crate::error::{ConfigError, DispatchError};
use crate::request::Request;
use crate::response::Response;

/// Named components known to the application.
///
/// Filled at startup; controllers refer to entries by name. Components
/// registered as global run first on every controller, in registration
/// order.
#[derive(Default, Clone)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
    globals: Vec<String>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a component under its own name.
    pub fn register(&mut self, component: Arc<dyn Component>) {
        let name = component.name().to_string();
        if self.components.insert(name.clone(), component).is_some() {
            warn!(component = %name, "Replaced existing component");
        }
    }

    pub fn register_global(&mut self, component: Arc<dyn Component>) {
        let name = component.name().to_string();
        self.register(component);
        if !self.globals.contains(&name) {
            self.globals.push(name);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Component>> {
        self.components.get(name)
    }

    /// Resolve a controller's declared components into its chain: globals
    /// first, then the controller's own list in declared order. Static
    /// bundles come from `declared`, overridden by `overrides`, which may
    /// only name components in the chain.
    pub fn chain_for(
        &self,
        controller: &str,
        declared: &[(String, ComponentConfig)],
        overrides: &HashMap<String, ComponentConfig>,
    ) -> Result<ComponentChain, ConfigError> {
        let mut order: Vec<(&str, ComponentConfig)> = self
            .globals
            .iter()
            .map(|g| (g.as_str(), ComponentConfig::default()))
            .collect();
        for (name, config) in declared {
            match order.iter_mut().find(|(n, _)| *n == name.as_str()) {
                Some((_, existing)) => existing.merge(config),
                None => order.push((name.as_str(), config.clone())),
            }
        }

        if let Some(unused) = overrides
            .keys()
            .find(|name| !order.iter().any(|(n, _)| n == name))
        {
            return Err(ConfigError::UnusedComponentSettings {
                controller: controller.to_string(),
                component: unused.clone(),
            });
        }

        let mut links = Vec::with_capacity(order.len());
        for (name, mut config) in order {
            let component = self
                .components
                .get(name)
                .ok_or_else(|| ConfigError::UnknownComponent {
                    controller: controller.to_string(),
                    component: name.to_string(),
                })?;
            if let Some(extra) = overrides.get(name) {
                config.merge(extra);
            }
            links.push(Link {
                name: name.to_string(),
                component: Arc::clone(component),
                config,
            });
        }
        Ok(ComponentChain { links })
    }
}

struct Link {
    name: String,
    component: Arc<dyn Component>,
    config: ComponentConfig,
}

/// Outcome of the pre-phase.
#[derive(Debug)]
pub enum PreOutcome {
    /// Every component continued; effective settings per component, in
    /// chain order
    Continue(Vec<(String, ComponentConfig)>),
    /// A component answered the request
    ShortCircuit {
        component: String,
        response: Response,
    },
}

/// Ordered components of one controller. Immutable once built.
pub struct ComponentChain {
    links: Vec<Link>,
}

impl ComponentChain {
    #[must_use]
    pub fn empty() -> Self {
        Self { links: Vec::new() }
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Run every `before` in order. `overlay` is asked once per component,
    /// right before that component runs, for per-request settings.
    pub fn run_before<F>(&self, request: &Request, controller: &str, mut overlay: F) -> PreOutcome
    where
        F: FnMut(&str) -> Option<ComponentConfig>,
    {
        let mut effective = Vec::with_capacity(self.links.len());
        for (idx, link) in self.links.iter().enumerate() {
            let config = link.config.merged(overlay(&link.name).as_ref());
            let cx = ComponentContext {
                controller,
                action: None,
                config: &config,
                elapsed: Duration::ZERO,
            };
            let flow = link.component.before(request, &cx);
            let response = match flow {
                Flow::Continue => {
                    effective.push((link.name.clone(), config));
                    continue;
                }
                Flow::Replace(r) | Flow::Halt(r) => r,
                Flow::Stop => DispatchError::not_found(format!(
                    "component '{}' stopped the request",
                    link.name
                ))
                .into_response(),
            };
            debug!(
                request_id = %request.request_id(),
                controller = %controller,
                component = %link.name,
                component_idx = idx,
                status = response.status,
                "Component short-circuited pre-phase"
            );
            for (earlier, (_, config)) in self.links[..idx].iter().zip(&effective) {
                let cx = ComponentContext {
                    controller,
                    action: None,
                    config,
                    elapsed: Duration::ZERO,
                };
                earlier.component.short_circuited(request, &response, &cx);
            }
            return PreOutcome::ShortCircuit {
                component: link.name.clone(),
                response,
            };
        }
        PreOutcome::Continue(effective)
    }

    /// Run every `after` in order. `configs` are the effective settings
    /// returned by [`run_before`](Self::run_before).
    pub fn run_after(
        &self,
        request: &Request,
        mut response: Response,
        controller: &str,
        action: Option<&ActionName>,
        configs: &[(String, ComponentConfig)],
        elapsed: Duration,
    ) -> Response {
        for (link, (_, config)) in self.links.iter().zip(configs) {
            let cx = ComponentContext {
                controller,
                action,
                config,
                elapsed,
            };
            match link.component.after(request, &mut response, &cx) {
                Flow::Continue => {}
                Flow::Replace(r) => response = r,
                Flow::Halt(r) => {
                    debug!(
                        request_id = %request.request_id(),
                        component = %link.name,
                        status = r.status,
                        "Component halted post-phase"
                    );
                    return r;
                }
                Flow::Stop => {
                    info!(
                        request_id = %request.request_id(),
                        controller = %controller,
                        component = %link.name,
                        "Component rejected response - substituting not found"
                    );
                    return DispatchError::not_found(format!(
                        "component '{}' rejected the response",
                        link.name
                    ))
                    .into_response();
                }
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        before: Flow,
        after: Flow,
    }

    impl Component for Recorder {
        fn name(&self) -> &str {
            self.name
        }
        fn before(&self, _req: &Request, cx: &ComponentContext<'_>) -> Flow {
            let tag = cx.config.get_str("tag").unwrap_or("-");
            self.log.lock().unwrap().push(format!("before:{}:{tag}", self.name));
            self.before.clone()
        }
        fn after(&self, _req: &Request, _res: &mut Response, _cx: &ComponentContext<'_>) -> Flow {
            self.log.lock().unwrap().push(format!("after:{}", self.name));
            self.after.clone()
        }
        fn short_circuited(&self, _req: &Request, res: &Response, _cx: &ComponentContext<'_>) {
            self.log
                .lock()
                .unwrap()
                .push(format!("short:{}:{}", self.name, res.status));
        }
    }

    fn registry(log: &Arc<Mutex<Vec<String>>>, specs: &[(&'static str, Flow, Flow)]) -> ComponentRegistry {
        let mut reg = ComponentRegistry::new();
        for (name, before, after) in specs {
            reg.register(Arc::new(Recorder {
                name,
                log: Arc::clone(log),
                before: before.clone(),
                after: after.clone(),
            }));
        }
        reg
    }

    fn declared(names: &[&str]) -> Vec<(String, ComponentConfig)> {
        names
            .iter()
            .map(|n| (n.to_string(), ComponentConfig::default()))
            .collect()
    }

    #[test]
    fn unknown_component_is_a_config_error() {
        let reg = ComponentRegistry::new();
        let err = reg
            .chain_for("Widgets", &declared(&["auth"]), &HashMap::new())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::UnknownComponent { .. }));
    }

    #[test]
    fn settings_for_an_unused_component_are_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let reg = registry(
            &log,
            &[
                ("auth", Flow::Continue, Flow::Continue),
                ("cors", Flow::Continue, Flow::Continue),
            ],
        );
        let overrides = HashMap::from([(
            "cors".to_string(),
            ComponentConfig::new().with("origins", json!(["*"])),
        )]);
        let err = reg
            .chain_for("Widgets", &declared(&["auth"]), &overrides)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ConfigError::UnusedComponentSettings { ref controller, ref component }
                if controller == "Widgets" && component == "cors"
        ));
    }

    #[test]
    fn globals_run_first_and_are_not_duplicated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = registry(&log, &[("a", Flow::Continue, Flow::Continue)]);
        reg.register_global(Arc::new(Recorder {
            name: "g",
            log: Arc::clone(&log),
            before: Flow::Continue,
            after: Flow::Continue,
        }));
        let chain = reg
            .chain_for("W", &declared(&["a", "g"]), &HashMap::new())
            .unwrap();
        assert_eq!(chain.names(), vec!["g", "a"]);
    }

    #[test]
    fn overlay_is_requested_once_per_component_before_it_runs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let reg = registry(
            &log,
            &[
                ("a", Flow::Continue, Flow::Continue),
                ("b", Flow::Halt(Response::new(403)), Flow::Continue),
                ("c", Flow::Continue, Flow::Continue),
            ],
        );
        let chain = reg
            .chain_for("W", &declared(&["a", "b", "c"]), &HashMap::new())
            .unwrap();
        let req = Request::builder(Method::GET, "/w").build();
        let mut asked = Vec::new();
        let outcome = chain.run_before(&req, "W", |name| {
            asked.push(name.to_string());
            Some(ComponentConfig::new().with("tag", json!(name.to_uppercase())))
        });
        assert_eq!(asked, vec!["a", "b"]);
        // only `a` continued before `b` answered, so only `a` is told
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before:a:A", "before:b:B", "short:a:403"]
        );
        match outcome {
            PreOutcome::ShortCircuit { component, response } => {
                assert_eq!(component, "b");
                assert_eq!(response.status, 403);
            }
            PreOutcome::Continue(_) => panic!("expected short circuit"),
        }
    }

    #[test]
    fn post_phase_stop_substitutes_not_found_and_ends_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let reg = registry(
            &log,
            &[
                ("a", Flow::Continue, Flow::Stop),
                ("b", Flow::Continue, Flow::Continue),
            ],
        );
        let chain = reg
            .chain_for("W", &declared(&["a", "b"]), &HashMap::new())
            .unwrap();
        let req = Request::builder(Method::GET, "/w").build();
        let PreOutcome::Continue(configs) = chain.run_before(&req, "W", |_| None) else {
            panic!("expected continue");
        };
        let out = chain.run_after(&req, Response::new(200), "W", None, &configs, Duration::ZERO);
        assert_eq!(out.status, 404);
        assert_eq!(*log.lock().unwrap(), vec!["before:a:-", "before:b:-", "after:a"]);
    }
}
