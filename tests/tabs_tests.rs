use admin_console::router::RouteMeta;
use admin_console::storage::{KeyValueStore, MemoryStore, TABS_STORE_KEY};
use admin_console::tabs::{TabRoute, TabsStore};

fn page(name: &str) -> TabRoute {
    TabRoute::new(name, &format!("/{}", name.to_lowercase()), RouteMeta::titled(name))
}

fn pinned(name: &str) -> TabRoute {
    let mut route = page(name);
    route.meta.affix = true;
    route
}

fn store_with(names: &[&str]) -> TabsStore {
    let mut tabs = TabsStore::new();
    for name in names {
        tabs.add_tab(&page(name));
    }
    tabs
}

fn names(tabs: &TabsStore) -> Vec<&str> {
    tabs.tabs().iter().map(|t| t.name.as_str()).collect()
}

// ============================================================================
// Adding
// ============================================================================

#[test]
fn visits_open_tabs_once_and_cache_views() {
    let mut tabs = store_with(&["Dashboard", "Users", "Dashboard"]);
    assert_eq!(names(&tabs), vec!["Dashboard", "Users"]);
    assert_eq!(tabs.active_tab(), "Dashboard");
    assert_eq!(tabs.cached_views(), &["Dashboard".to_string(), "Users".to_string()]);

    let mut hidden = page("Secret");
    hidden.meta.hide_in_tabs = true;
    tabs.add_tab(&hidden);
    tabs.add_tab(&TabRoute {
        name: None,
        path: "/anon".into(),
        meta: RouteMeta::default(),
    });
    assert_eq!(tabs.tabs().len(), 2);
}

#[test]
fn tab_title_falls_back_to_name() {
    let mut tabs = TabsStore::new();
    tabs.add_tab(&TabRoute::new("Roles", "/system/role", RouteMeta::default()));
    assert_eq!(tabs.get("Roles").map(|t| t.title.as_str()), Some("Roles"));
}

// ============================================================================
// Closing
// ============================================================================

#[test]
fn closing_active_tab_moves_to_neighbour() {
    let mut tabs = store_with(&["A", "B", "C"]);
    tabs.set_active_tab("B");
    assert_eq!(tabs.close_tab("B").as_deref(), Some("/c"));
    assert_eq!(names(&tabs), vec!["A", "C"]);
    assert!(!tabs.cached_views().contains(&"B".to_string()));

    tabs.set_active_tab("C");
    assert_eq!(tabs.close_tab("C").as_deref(), Some("/a"), "last tab falls back to its left neighbour");
}

#[test]
fn closing_inactive_or_unknown_tab_stays_put() {
    let mut tabs = store_with(&["A", "B"]);
    assert_eq!(tabs.close_tab("A"), None);
    assert_eq!(names(&tabs), vec!["B"]);
    assert_eq!(tabs.close_tab("Nope"), None);
}

#[test]
fn affixed_tabs_survive_every_close() {
    let mut tabs = TabsStore::new();
    tabs.add_tab(&pinned("Home"));
    tabs.add_tab(&page("A"));
    tabs.add_tab(&page("B"));

    assert_eq!(tabs.close_tab("Home"), None);
    assert!(tabs.get("Home").is_some());

    tabs.close_left_tabs("B");
    assert_eq!(names(&tabs), vec!["Home", "B"]);

    tabs.add_tab(&page("C"));
    tabs.close_other_tabs("C");
    assert_eq!(names(&tabs), vec!["Home", "C"]);
    assert_eq!(tabs.active_tab(), "C");

    assert_eq!(tabs.close_all_tabs(), "/home");
    assert_eq!(names(&tabs), vec!["Home"]);
    assert_eq!(tabs.active_tab(), "Home");
    assert_eq!(tabs.cached_views(), &["Home".to_string()]);
}

#[test]
fn close_right_keeps_left_side() {
    let mut tabs = store_with(&["A", "B", "C", "D"]);
    tabs.close_right_tabs("B");
    assert_eq!(names(&tabs), vec!["A", "B"]);
    assert_eq!(tabs.cached_views().len(), 2);
}

#[test]
fn close_all_without_affix_goes_home() {
    let mut tabs = store_with(&["A", "B"]);
    assert_eq!(tabs.close_all_tabs(), "/dashboard");
    assert!(tabs.tabs().is_empty());
    assert!(tabs.cached_views().is_empty());

    let mut custom = store_with(&["A"]).with_home_path("/welcome");
    assert_eq!(custom.close_all_tabs(), "/welcome");
}

// ============================================================================
// Refresh
// ============================================================================

#[test]
fn refresh_changes_view_key_but_keeps_cache() {
    let mut tabs = store_with(&["A", "B"]);
    let before = tabs.view_key("A");

    let key = tabs.refresh_current_tab("A");
    assert_eq!(key, 1);
    assert_ne!(tabs.view_key("A"), before);
    assert_eq!(tabs.cached_views().len(), 2);

    assert_eq!(tabs.refresh_current_tab("Unknown"), 1, "unknown views do not bump the key");
}

#[test]
fn refresh_only_rekeys_the_refreshed_view() {
    let mut tabs = store_with(&["A", "B", "C"]);
    let b_before = tabs.view_key("B");
    let c_before = tabs.view_key("C");

    tabs.refresh_current_tab("A");
    tabs.refresh_current_tab("A");

    assert_eq!(tabs.view_key("A"), "A:2");
    assert_eq!(tabs.view_key("B"), b_before);
    assert_eq!(tabs.view_key("C"), c_before);

    tabs.refresh_current_tab("B");
    assert_eq!(tabs.view_key("A"), "A:2");
    assert_eq!(tabs.view_key("B"), "B:1");
    assert_eq!(tabs.refresh_key(), 3);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn tabs_persist_without_refresh_state() {
    let mut tabs = store_with(&["A", "B"]);
    tabs.refresh_current_tab("A");

    let mut store = MemoryStore::new();
    tabs.save(&mut store).unwrap();

    let raw = store.get(TABS_STORE_KEY).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["activeTab"], "B");
    assert_eq!(json["cachedViews"], serde_json::json!(["A", "B"]));
    assert!(json.get("refreshKey").is_none());

    let mut restored = TabsStore::new();
    restored.load(&store).unwrap();
    assert_eq!(restored.tabs(), tabs.tabs());
    assert_eq!(restored.active_tab(), "B");
    assert_eq!(restored.refresh_key(), 0);
}

#[test]
fn reset_clears_everything() {
    let mut tabs = store_with(&["A"]);
    tabs.reset_tabs();
    assert!(tabs.tabs().is_empty());
    assert!(tabs.cached_views().is_empty());
    assert_eq!(tabs.active_tab(), "");
}
