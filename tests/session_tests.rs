mod common;

use admin_console::api::error::ApiError;
use admin_console::api::model::LoginParams;
use admin_console::router::RouteComponent;
use admin_console::session::{RouteMode, SessionController, SessionState};
use admin_console::storage::{FileStore, KeyValueStore, MemoryStore, TABS_STORE_KEY, USER_STORE_KEY};
use admin_console::tabs::TabsStore;
use admin_console::{App, ConsoleError, SessionError};

use crate::common::sessions::{MenuOutcome, ScriptedApi, admin, session_with, static_app, static_session};

fn logged_in() -> (SessionController, TabsStore, MemoryStore) {
    let mut session = static_session();
    let mut tabs = TabsStore::new();
    let mut store = MemoryStore::new();
    session.login(&admin(), &mut tabs, &mut store).unwrap();
    (session, tabs, store)
}

fn stored_token() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.set(USER_STORE_KEY, r#"{"token":"123admin"}"#.into()).unwrap();
    store
}

// ============================================================================
// Session controller
// ============================================================================

#[test]
fn login_loads_routes_under_root() {
    let (session, _, store) = logged_in();

    assert_eq!(session.state(), SessionState::AuthenticatedRoutesLoaded);
    assert_eq!(session.token(), "123admin");
    assert!(session.is_dynamic_added_menu());
    assert_eq!(session.user_info().map(|u| u.username.as_str()), Some("admin"));

    let root = session.routes().get("Root").unwrap();
    let children: Vec<_> = root.children.iter().filter_map(|r| r.name()).collect();
    assert_eq!(children, vec!["Dashboard", "SystemUser", "SystemRole"]);
    assert_eq!(session.routes().names().last().map(String::as_str), Some("PageNotFound"));
    assert_eq!(session.loaded_routes().len(), 3);

    assert!(store.get(USER_STORE_KEY).unwrap().contains("123admin"));
}

#[test]
fn failed_login_stays_anonymous() {
    let mut session = static_session();
    let mut tabs = TabsStore::new();
    let mut store = MemoryStore::new();

    let err = session
        .login(&LoginParams::new("  ", "x"), &mut tabs, &mut store)
        .unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::Business { code: 1001, .. })));
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(!session.is_authenticated());
    assert!(store.is_empty());
}

#[test]
fn failed_relogin_keeps_loaded_session() {
    let (mut session, mut tabs, mut store) = logged_in();
    assert_eq!(session.state(), SessionState::AuthenticatedRoutesLoaded);

    let err = session
        .login(&LoginParams::new("", "x"), &mut tabs, &mut store)
        .unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::Business { .. })));
    assert_eq!(session.state(), SessionState::AuthenticatedRoutesLoaded);
    assert_eq!(session.token(), "123admin");
    assert!(session.routes().get("SystemUser").is_some());
}

#[test]
fn logout_clears_token_routes_tabs_and_storage() {
    let (mut session, mut tabs, mut store) = logged_in();
    tabs.add_tab(&admin_console::tabs::TabRoute::new(
        "Dashboard",
        "/dashboard",
        admin_console::router::RouteMeta::titled("Dashboard"),
    ));

    let to = session.logout(&mut tabs, &mut store).unwrap();
    assert_eq!(to.full_path(), "/login");
    assert_eq!(session.token(), "");
    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(session.routes().names(), vec!["Login", "Root", "Redirect"]);
    assert!(tabs.tabs().is_empty());
    assert!(store.is_empty());

    session.logout(&mut tabs, &mut store).unwrap();
    assert_eq!(session.state(), SessionState::Anonymous, "logging out twice is harmless");
}

#[test]
fn route_loading_failure_logs_out() {
    let api = ScriptedApi::new(MenuOutcome::Fail);
    let calls = api.menu_calls.clone();
    let mut session = session_with(api);
    let mut tabs = TabsStore::new();
    let mut store = MemoryStore::new();

    let err = session.login(&admin(), &mut tabs, &mut store).unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::Status { status: 500, .. })));
    assert_eq!(calls.get(), 1);
    assert!(!session.is_authenticated());
    assert!(store.is_empty(), "persisted token is wiped");
    assert!(!session.routes().has_route("PageNotFound"));
}

#[test]
fn canceled_route_loading_keeps_session() {
    let mut session = session_with(ScriptedApi::new(MenuOutcome::Cancel));
    let mut tabs = TabsStore::new();
    let mut store = MemoryStore::new();

    let err = session.login(&admin(), &mut tabs, &mut store).unwrap_err();
    assert!(err.is_canceled());
    assert!(session.is_authenticated());
    assert_eq!(session.state(), SessionState::AuthenticatedNoRoutes);
    assert!(session.reauth_prompt().is_none());
}

#[test]
fn expired_session_raises_reauth_prompt() {
    let mut session = session_with(ScriptedApi::new(MenuOutcome::Expire));
    let mut tabs = TabsStore::new();
    let mut store = MemoryStore::new();

    let err = session.login(&admin(), &mut tabs, &mut store).unwrap_err();
    assert!(err.is_session_expired());
    assert_eq!(session.reauth_prompt(), Some("please log in again"));

    let to = session.confirm_reauth(&mut tabs, &mut store).unwrap();
    assert_eq!(to.path, "/login");
    assert!(session.reauth_prompt().is_none());
}

#[test]
fn canceled_requests_never_prompt() {
    let mut session = static_session();
    session.note_api_error(&ApiError::Canceled);
    assert!(session.reauth_prompt().is_none());
    session.note_api_error(&ApiError::SessionExpired {
        message: "again".into(),
    });
    session.dismiss_reauth();
    assert!(session.reauth_prompt().is_none());
}

#[test]
fn after_login_requires_a_token() {
    let mut session = static_session();
    let err = session
        .after_login(&mut TabsStore::new(), &mut MemoryStore::new())
        .unwrap_err();
    assert!(matches!(err, SessionError::NotAuthenticated));
}

#[test]
fn restore_picks_up_persisted_token() {
    let store = stored_token();
    let mut session = static_session();
    session.restore(&store).unwrap();
    assert_eq!(session.token(), "123admin");
    assert_eq!(session.state(), SessionState::AuthenticatedNoRoutes);
}

#[test]
fn nested_mode_registers_top_level_routes() {
    let mut session = static_session().with_mode(RouteMode::Nested);
    session
        .login(&admin(), &mut TabsStore::new(), &mut MemoryStore::new())
        .unwrap();

    let system = session.routes().get("System").unwrap();
    assert_eq!(system.component, RouteComponent::ParentView);
    assert!(session.routes().get("Root").unwrap().children.is_empty());
    assert_eq!(session.landing_route_name().as_deref(), Some("Dashboard"));
    assert_eq!(session.landing_path(), "/dashboard");
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn anonymous_navigation_lands_on_login_with_redirect() {
    let mut app = static_app();
    let route = app.navigate("/system/user").unwrap();
    assert_eq!(route.name.as_deref(), Some("Login"));
    assert_eq!(app.current().map(|r| r.path.as_str()), Some("/login"));
    assert!(app.tabs().tabs().is_empty(), "login page never gets a tab");
}

#[test]
fn login_goes_to_landing_page_and_opens_tab() {
    let mut app = static_app();
    let route = app.login(&admin(), None).unwrap();

    assert_eq!(route.name.as_deref(), Some("Dashboard"));
    assert_eq!(route.matched, vec!["Root", "Dashboard"]);
    assert_eq!(app.tabs().active_tab(), "Dashboard");
    assert!(app.storage().get(TABS_STORE_KEY).is_some());
}

#[test]
fn nested_mode_pages_open_tabs() {
    let session = static_session().with_mode(RouteMode::Nested);
    let mut app = App::new(session, TabsStore::new(), Box::new(MemoryStore::new()));

    let landing = app.login(&admin(), None).unwrap();
    assert_eq!(landing.name.as_deref(), Some("Dashboard"));
    assert_eq!(landing.matched, vec!["Dashboard"]);

    let route = app.navigate("/system/user").unwrap();
    assert_eq!(route.matched, vec!["System", "SystemUser"]);

    let names: Vec<&str> = app.tabs().tabs().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Dashboard", "SystemUser"]);
    assert_eq!(app.tabs().active_tab(), "SystemUser");
    assert_eq!(app.tabs().cached_views(), &["Dashboard".to_string(), "SystemUser".to_string()]);

    let directory = app.navigate("/system").unwrap();
    assert_eq!(directory.component, RouteComponent::ParentView);
    assert_eq!(app.tabs().tabs().len(), 2, "containers never get a tab");
}

#[test]
fn login_honors_redirect() {
    let mut app = static_app();
    let route = app.login(&admin(), Some("/system/user")).unwrap();
    assert_eq!(route.name.as_deref(), Some("SystemUser"));
}

#[test]
fn authenticated_root_and_login_redirect_home() {
    let mut app = static_app();
    app.login(&admin(), None).unwrap();

    assert_eq!(app.navigate("/").unwrap().path, "/dashboard");
    assert_eq!(app.navigate("/login").unwrap().path, "/dashboard");

    let lost = app.navigate("/no/such/page").unwrap();
    assert_eq!(lost.name.as_deref(), Some("PageNotFound"));
    assert!(app.tabs().get("PageNotFound").is_none());
}

#[test]
fn restart_restores_session_and_tabs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("console.json");

    {
        let store = FileStore::open(&path).unwrap();
        let mut app = App::new(static_session(), TabsStore::new(), Box::new(store));
        app.login(&admin(), None).unwrap();
        app.navigate("/system/role").unwrap();
    }

    let store = FileStore::open(&path).unwrap();
    let mut app = App::new(static_session(), TabsStore::new(), Box::new(store));
    app.start().unwrap();
    assert_eq!(app.session().state(), SessionState::AuthenticatedNoRoutes);
    assert_eq!(app.tabs().tabs().len(), 2);

    let route = app.navigate("/system/user").unwrap();
    assert_eq!(route.name.as_deref(), Some("SystemUser"));
    assert!(app.session().is_dynamic_added_menu());
    let names: Vec<_> = app.tabs().tabs().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Dashboard", "SystemRole", "SystemUser"]);
}

#[test]
fn failed_route_loading_during_navigation_goes_to_login() {
    let api = ScriptedApi::new(MenuOutcome::Fail);
    let mut app = App::new(session_with(api), TabsStore::new(), Box::new(stored_token()));
    app.start().unwrap();

    let route = app.navigate("/system/user").unwrap();
    assert_eq!(route.name.as_deref(), Some("Login"));
    assert!(!app.session().is_authenticated());
    assert!(app.storage().get(USER_STORE_KEY).is_none());
}

#[test]
fn canceled_route_loading_aborts_navigation() {
    let api = ScriptedApi::new(MenuOutcome::Cancel);
    let mut app = App::new(session_with(api), TabsStore::new(), Box::new(stored_token()));
    app.start().unwrap();

    match app.navigate("/system/user") {
        Err(ConsoleError::Session(e)) => assert!(e.is_canceled()),
        other => panic!("expected a canceled navigation, got {:?}", other.map(|r| r.name)),
    }
    assert!(app.session().is_authenticated());
    assert!(app.current().is_none());
}

#[test]
fn recovered_backend_loads_routes_on_next_navigation() {
    let api = ScriptedApi::new(MenuOutcome::Cancel);
    let outcome = api.outcome.clone();
    let mut app = App::new(session_with(api), TabsStore::new(), Box::new(stored_token()));
    app.start().unwrap();

    assert!(app.navigate("/dashboard").is_err());
    outcome.set(MenuOutcome::Ok);
    assert_eq!(app.navigate("/dashboard").unwrap().name.as_deref(), Some("Dashboard"));
}

// ============================================================================
// Tabs through the app
// ============================================================================

#[test]
fn closing_active_tab_navigates_to_neighbour() {
    let mut app = static_app();
    app.login(&admin(), None).unwrap();
    app.navigate("/system/user").unwrap();

    let next = app.close_tab("SystemUser").unwrap().unwrap();
    assert_eq!(next.name.as_deref(), Some("Dashboard"));
    assert_eq!(app.tabs().active_tab(), "Dashboard");

    assert!(app.close_tab("Dashboard").unwrap().is_none(), "last tab closes without navigating");
}

#[test]
fn close_all_returns_home() {
    let mut app = static_app();
    app.login(&admin(), Some("/system/role")).unwrap();
    let route = app.close_all_tabs().unwrap();
    assert_eq!(route.path, "/dashboard");
    let names: Vec<_> = app.tabs().tabs().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Dashboard"]);
}

#[test]
fn refresh_bumps_view_key() {
    let mut app = static_app();
    app.login(&admin(), None).unwrap();
    let before = app.tabs().view_key("Dashboard");
    assert_eq!(app.refresh_current_tab(), 1);
    assert_ne!(app.tabs().view_key("Dashboard"), before);
}

#[test]
fn app_logout_lands_on_login() {
    let mut app = static_app();
    app.login(&admin(), None).unwrap();

    let route = app.logout().unwrap();
    assert_eq!(route.name.as_deref(), Some("Login"));
    assert!(app.tabs().tabs().is_empty());
    assert!(app.storage().get(USER_STORE_KEY).is_none());
    assert!(app.storage().get(TABS_STORE_KEY).is_none());
}
