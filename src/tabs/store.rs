use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::router::route::RouteMeta;
use crate::router::table::ResolvedRoute;
use crate::storage::{KeyValueStore, TABS_STORE_KEY, load_json, save_json};

/// Where `close_all_tabs` sends the user when no tab survives.
pub const DEFAULT_HOME_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabItem {
    pub name: String,
    pub path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub affix: bool,
}

/// What the store needs to know about a completed navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct TabRoute {
    pub name: Option<String>,
    pub path: String,
    pub meta: RouteMeta,
}

impl TabRoute {
    pub fn new(name: &str, path: &str, meta: RouteMeta) -> Self {
        TabRoute {
            name: Some(name.to_string()),
            path: path.to_string(),
            meta,
        }
    }
}

impl From<&ResolvedRoute> for TabRoute {
    fn from(route: &ResolvedRoute) -> Self {
        TabRoute {
            name: route.name.clone(),
            path: route.path.clone(),
            meta: route.meta.clone(),
        }
    }
}

/// Open tabs and the view-cache set.
///
/// The cache set stays a subset of the open tab names. Affixed tabs survive
/// every close operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsStore {
    #[serde(default)]
    tabs: Vec<TabItem>,
    #[serde(default)]
    active_tab: String,
    #[serde(default)]
    cached_views: Vec<String>,
    #[serde(skip)]
    refresh_key: u64,
    #[serde(skip)]
    view_refreshes: BTreeMap<String, u64>,
    #[serde(skip, default = "default_home_path")]
    home_path: String,
}

fn default_home_path() -> String {
    DEFAULT_HOME_PATH.to_string()
}

impl Default for TabsStore {
    fn default() -> Self {
        TabsStore {
            tabs: Vec::new(),
            active_tab: String::new(),
            cached_views: Vec::new(),
            refresh_key: 0,
            view_refreshes: BTreeMap::new(),
            home_path: default_home_path(),
        }
    }
}

impl TabsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_home_path(mut self, home_path: impl Into<String>) -> Self {
        self.home_path = home_path.into();
        self
    }

    pub fn tabs(&self) -> &[TabItem] {
        &self.tabs
    }

    pub fn active_tab(&self) -> &str {
        &self.active_tab
    }

    pub fn cached_views(&self) -> &[String] {
        &self.cached_views
    }

    pub fn refresh_key(&self) -> u64 {
        self.refresh_key
    }

    /// Key a host should mount `name`'s view under. Changes only when that
    /// view is refreshed.
    pub fn view_key(&self, name: &str) -> String {
        let count = self.view_refreshes.get(name).copied().unwrap_or_default();
        format!("{}:{}", name, count)
    }

    pub fn get(&self, name: &str) -> Option<&TabItem> {
        self.tabs.iter().find(|t| t.name == name)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Record a visit. Unnamed routes and routes hidden from tabs are ignored.
    pub fn add_tab(&mut self, route: &TabRoute) {
        let Some(name) = route.name.as_deref().filter(|n| !n.is_empty()) else {
            return;
        };
        if route.meta.hide_in_tabs {
            return;
        }

        if self.get(name).is_none() {
            let title = if route.meta.title.is_empty() {
                name.to_string()
            } else {
                route.meta.title.clone()
            };
            self.tabs.push(TabItem {
                name: name.to_string(),
                path: route.path.clone(),
                title,
                icon: route.meta.icon.clone(),
                affix: route.meta.affix,
            });
        }

        self.active_tab = name.to_string();

        if !self.cached_views.iter().any(|v| v == name) {
            self.cached_views.push(name.to_string());
        }
    }

    pub fn set_active_tab(&mut self, name: &str) {
        self.active_tab = name.to_string();
    }

    // ------------------------------------------------------------------
    // Close operations
    // ------------------------------------------------------------------

    /// Close one tab. Returns the path to navigate to when the active tab
    /// was closed and another tab remains.
    pub fn close_tab(&mut self, name: &str) -> Option<String> {
        let index = self.tabs.iter().position(|t| t.name == name)?;
        if self.tabs[index].affix {
            return None;
        }

        self.tabs.remove(index);
        self.uncache(name);

        if self.active_tab == name && !self.tabs.is_empty() {
            let next = &self.tabs[index.min(self.tabs.len() - 1)];
            return Some(next.path.clone());
        }
        None
    }

    pub fn close_other_tabs(&mut self, name: &str) {
        self.tabs.retain(|t| t.name == name || t.affix);
        self.sync_cache();
        self.active_tab = name.to_string();
    }

    pub fn close_left_tabs(&mut self, name: &str) {
        let Some(index) = self.tabs.iter().position(|t| t.name == name) else {
            return;
        };
        self.close_where(|i, _| i < index);
    }

    pub fn close_right_tabs(&mut self, name: &str) {
        let Some(index) = self.tabs.iter().position(|t| t.name == name) else {
            return;
        };
        self.close_where(|i, _| i > index);
    }

    /// Close everything but affixed tabs. Returns the first survivor's path
    /// or the home path.
    pub fn close_all_tabs(&mut self) -> String {
        self.tabs.retain(|t| t.affix);
        self.sync_cache();
        if self.get(&self.active_tab.clone()).is_none() {
            self.active_tab = self.tabs.first().map(|t| t.name.clone()).unwrap_or_default();
        }
        self.tabs
            .first()
            .map(|t| t.path.clone())
            .unwrap_or_else(|| self.home_path.clone())
    }

    fn close_where(&mut self, closes: impl Fn(usize, &TabItem) -> bool) {
        let closed: Vec<String> = self
            .tabs
            .iter()
            .enumerate()
            .filter(|(i, t)| !t.affix && closes(*i, t))
            .map(|(_, t)| t.name.clone())
            .collect();
        if closed.is_empty() {
            return;
        }
        self.tabs.retain(|t| !closed.contains(&t.name));
        for name in &closed {
            self.uncache(name);
        }
    }

    fn uncache(&mut self, name: &str) {
        self.cached_views.retain(|v| v != name);
    }

    fn sync_cache(&mut self) {
        self.cached_views = self.tabs.iter().map(|t| t.name.clone()).collect();
    }

    // ------------------------------------------------------------------
    // Refresh & reset
    // ------------------------------------------------------------------

    /// Force the named view to re-initialize on its next render. The cache
    /// set is left alone; hosts key views on `view_key`.
    pub fn refresh_current_tab(&mut self, name: &str) -> u64 {
        if self.get(name).is_some() || self.cached_views.iter().any(|v| v == name) {
            self.refresh_key += 1;
            *self.view_refreshes.entry(name.to_string()).or_default() += 1;
            tracing::debug!("refreshing view '{}' (key {})", name, self.refresh_key);
        }
        self.refresh_key
    }

    pub fn reset_tabs(&mut self) {
        self.tabs.clear();
        self.cached_views.clear();
        self.active_tab.clear();
        self.view_refreshes.clear();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Restore tabs, active tab and cache set.
    pub fn load(&mut self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        if let Some(saved) = load_json::<TabsStore>(store, TABS_STORE_KEY)? {
            self.tabs = saved.tabs;
            self.active_tab = saved.active_tab;
            self.cached_views = saved.cached_views;
        }
        Ok(())
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        save_json(store, TABS_STORE_KEY, self)
    }
}
