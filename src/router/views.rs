//! View resolution against a registry of known view modules.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::rc::Rc;

use crate::router::route::RouteComponent;

/// A view module wrapped with an explicit display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedView {
    pub name: String,
    pub module: String,
}

/// The set of view modules available to routes, keyed by path relative to
/// the view root (`system/user/index.vue`).
#[derive(Debug, Clone)]
pub struct ViewRegistry {
    extension: String,
    modules: BTreeSet<String>,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new("vue")
    }
}

impl ViewRegistry {
    pub fn new(extension: impl Into<String>) -> Self {
        ViewRegistry {
            extension: extension.into().trim_start_matches('.').to_string(),
            modules: BTreeSet::new(),
        }
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for module in modules {
            self.register(module);
        }
        self
    }

    pub fn register(&mut self, module: impl Into<String>) {
        let module = module.into();
        self.modules.insert(module.trim_start_matches('/').to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.modules.contains(key)
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }

    /// Register every file under `root` with the registry's extension.
    /// Returns the number of modules found.
    pub fn scan(&mut self, root: &Path) -> std::io::Result<usize> {
        let mut found = 0;
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(root) {
                    let key = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    self.modules.insert(key);
                    found += 1;
                }
            }
        }

        tracing::debug!("registered {} view module(s) from {}", found, root.display());
        Ok(found)
    }
}

/// Resolves component paths to views, memoizing named views so that the
/// same route name always yields the same view identity.
#[derive(Debug, Default)]
pub struct ViewResolver {
    registry: ViewRegistry,
    named: HashMap<String, Rc<NamedView>>,
}

impl ViewResolver {
    pub fn new(registry: ViewRegistry) -> Self {
        ViewResolver {
            registry,
            named: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Module key for `component_path`: `{path}.{ext}` first, then
    /// `{path}/index.{ext}`.
    pub fn find_module(&self, component_path: &str) -> Option<String> {
        let path = component_path.trim_start_matches('/');
        let ext = self.registry.extension();
        [format!("{}.{}", path, ext), format!("{}/index.{}", path, ext)]
            .into_iter()
            .find(|key| self.registry.contains(key))
    }

    /// Resolve to a view named after `route_name`, falling back to the
    /// not-found view.
    pub fn resolve(&mut self, component_path: &str, route_name: Option<&str>) -> RouteComponent {
        let Some(module) = self.find_module(component_path) else {
            tracing::warn!(
                "no view module for component path '{}', using the not-found page",
                component_path
            );
            return RouteComponent::NotFound;
        };

        match route_name.filter(|n| !n.is_empty()) {
            Some(name) => RouteComponent::View(self.named_view(name, module)),
            None => RouteComponent::Module(module),
        }
    }

    fn named_view(&mut self, name: &str, module: String) -> Rc<NamedView> {
        if let Some(existing) = self.named.get(name) {
            if existing.module == module {
                return Rc::clone(existing);
            }
            tracing::warn!(
                "view name '{}' now resolves to {} (was {})",
                name,
                module,
                existing.module
            );
        }
        let view = Rc::new(NamedView {
            name: name.to_string(),
            module,
        });
        self.named.insert(name.to_string(), Rc::clone(&view));
        view
    }

    pub fn cached_names(&self) -> usize {
        self.named.len()
    }
}
