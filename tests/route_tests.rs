mod common;

use std::rc::Rc;

use admin_console::api::auth::demo_menus;
use admin_console::api::model::RouteInfo;
use admin_console::router::guard::{GuardContext, GuardDecision, before_each, retry_target};
use admin_console::router::table::{ROOT_NAME, page_not_found_route};
use admin_console::router::transform::{LAYOUT, PARENT_VIEW, route_name_from_path};
use admin_console::router::{
    Location, RouteComponent, RouteMeta, RouteNode, RouteRecord, RouteTable, ViewRegistry, ViewResolver,
    build_menu_tree, find_first_valid_route_name, flatten_routes, transform_route_tree,
};
use admin_console::RouteError;

use crate::common::sessions::demo_registry;

fn resolver() -> ViewResolver {
    ViewResolver::new(demo_registry())
}

fn two_level_tree() -> Vec<RouteNode> {
    vec![
        RouteNode::new("/system", "System")
            .with_component(LAYOUT)
            .with_children(vec![
                RouteNode::new("/system/user", "SystemUser").with_view("system/user/index"),
                RouteNode::new("/system/role", "SystemRole").with_view("system/role/index"),
            ]),
    ]
}

fn row(id: i64, parent: i64, route_type: u8, path: &str, component: Option<&str>, order: i64) -> RouteInfo {
    RouteInfo {
        route_id: id,
        title: path.rsplit('/').next().unwrap_or_default().to_string(),
        icon: None,
        route_type,
        parent,
        redirect: None,
        path: path.to_string(),
        component: component.map(str::to_string),
        order: Some(order),
        keep_alive: None,
        hide_side_menu: None,
    }
}

// ============================================================================
// Naming
// ============================================================================

#[test]
fn route_names_derive_from_paths() {
    assert_eq!(route_name_from_path("/system/user"), "SystemUser");
    assert_eq!(route_name_from_path("/dashboard"), "Dashboard");
    assert_eq!(route_name_from_path("/user-center/profile"), "UserCenterProfile");
    assert_eq!(route_name_from_path("/order/:id"), "OrderId");

    let unnamed = RouteNode {
        path: "/system/dept".into(),
        ..Default::default()
    };
    assert_eq!(unnamed.route_name(), "SystemDept");
}

// ============================================================================
// Flatten
// ============================================================================

#[test]
fn flatten_lifts_leaves_only() {
    let mut views = resolver();
    let routes = flatten_routes(&two_level_tree(), &mut views).unwrap();

    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].name(), Some("SystemUser"));
    assert_eq!(routes[1].name(), Some("SystemRole"));
    assert!(routes.iter().all(|r| r.children.is_empty()));
    assert_eq!(routes[0].component.display_name(), Some("SystemUser"));
}

#[test]
fn flatten_demo_menus_in_depth_first_order() {
    let mut views = resolver();
    let names: Vec<_> = flatten_routes(&demo_menus(), &mut views)
        .unwrap()
        .into_iter()
        .filter_map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Dashboard", "SystemUser", "SystemRole"]);
}

#[test]
fn leaves_without_component_path_get_not_found() {
    let mut views = resolver();
    let tree = vec![
        RouteNode::new("/ghost", "Ghost"),
        RouteNode::new("/missing", "Missing").with_view("does/not/exist"),
    ];
    let routes = flatten_routes(&tree, &mut views).unwrap();
    assert_eq!(routes[0].component, RouteComponent::NotFound);
    assert_eq!(routes[1].component, RouteComponent::NotFound);
}

#[test]
fn duplicate_route_names_are_rejected() {
    let mut views = resolver();
    let tree = vec![
        RouteNode::new("/system/user", "Users").with_view("system/user/index"),
        RouteNode::new("/admin/user", "Users").with_view("system/user/index"),
    ];
    match flatten_routes(&tree, &mut views) {
        Err(RouteError::DuplicateName { name, first, second }) => {
            assert_eq!(name, "Users");
            assert_eq!(first, "/system/user");
            assert_eq!(second, "/admin/user");
        }
        other => panic!("expected duplicate name error, got {:?}", other),
    }
}

// ============================================================================
// Nested transform
// ============================================================================

#[test]
fn nested_transform_maps_sentinels() {
    let mut views = resolver();
    let tree = vec![
        RouteNode::new("/system", "System")
            .with_component(LAYOUT)
            .with_children(vec![
                RouteNode::new("/system/perm", "SystemPerm")
                    .with_component(PARENT_VIEW)
                    .with_children(vec![RouteNode::new("/system/perm/role", "SystemRole").with_view("system/role/index")]),
            ]),
    ];

    let routes = transform_route_tree(&tree, &mut views).unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].component, RouteComponent::Layout);
    assert_eq!(routes[0].children[0].component, RouteComponent::ParentView);
    let leaf = &routes[0].children[0].children[0];
    assert_eq!(leaf.component.display_name(), Some("SystemRole"));
}

#[test]
fn nested_directories_without_component_are_pass_through() {
    let mut views = resolver();
    let routes = transform_route_tree(&demo_menus(), &mut views).unwrap();
    let system = routes.iter().find(|r| r.name() == Some("System")).unwrap();
    assert_eq!(system.component, RouteComponent::ParentView);
    assert_eq!(system.children.len(), 2);
}

// ============================================================================
// View resolution
// ============================================================================

#[test]
fn view_lookup_tries_file_then_index() {
    let registry = ViewRegistry::new(".vue").with_modules(["about.vue", "system/user/index.vue"]);
    let views = ViewResolver::new(registry);
    assert_eq!(views.find_module("about").as_deref(), Some("about.vue"));
    assert_eq!(views.find_module("/system/user").as_deref(), Some("system/user/index.vue"));
    assert_eq!(views.find_module("nope"), None);
}

#[test]
fn named_views_are_memoized() {
    let mut views = resolver();
    let first = views.resolve("system/user/index", Some("SystemUser"));
    let second = views.resolve("system/user/index", Some("SystemUser"));
    match (first, second) {
        (RouteComponent::View(a), RouteComponent::View(b)) => assert!(Rc::ptr_eq(&a, &b)),
        other => panic!("expected named views, got {:?}", other),
    }
    assert_eq!(views.cached_names(), 1);

    let anonymous = views.resolve("dashboard/index", None);
    assert_eq!(anonymous, RouteComponent::Module("dashboard/index.vue".into()));
}

#[test]
fn registry_scans_view_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("system/user")).unwrap();
    std::fs::write(dir.path().join("system/user/index.vue"), "<template/>").unwrap();
    std::fs::write(dir.path().join("about.vue"), "<template/>").unwrap();
    std::fs::write(dir.path().join("notes.md"), "skip").unwrap();

    let mut registry = ViewRegistry::default();
    assert_eq!(registry.scan(dir.path()).unwrap(), 2);
    assert!(registry.contains("system/user/index.vue"));
    assert!(!registry.contains("notes.md"));
}

// ============================================================================
// Backend rows
// ============================================================================

#[test]
fn menu_rows_assemble_into_ordered_tree() {
    let rows = vec![
        row(1, 0, 0, "/system", None, 2),
        row(2, 1, 1, "/system/user", Some("system/user/index"), 2),
        row(3, 1, 1, "/system/role", Some("system/role/index"), 1),
        row(4, 0, 1, "/dashboard", Some("dashboard/index"), 1),
        row(5, 1, 0, "/system/nested", None, 3),
        row(6, 99, 1, "/orphan", Some("orphan/index"), 5),
    ];
    let tree = build_menu_tree(&rows);

    let top: Vec<_> = tree.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(top, vec!["/dashboard", "/system", "/orphan"]);

    let system = &tree[1];
    assert_eq!(system.component.as_deref(), Some(LAYOUT));
    assert_eq!(system.meta.component_path, None);

    let children: Vec<_> = system.children.iter().map(|n| n.route_name()).collect();
    assert_eq!(children, vec!["SystemRole", "SystemUser", "SystemNested"]);
    assert_eq!(system.children[2].component.as_deref(), Some(PARENT_VIEW));
    assert_eq!(system.children[0].meta.component_path.as_deref(), Some("system/role/index"));
}

#[test]
fn landing_is_first_visible_leaf() {
    let mut menus = demo_menus();
    assert_eq!(find_first_valid_route_name(&menus).as_deref(), Some("Dashboard"));

    menus[0].meta.hide_in_menu = true;
    assert_eq!(find_first_valid_route_name(&menus).as_deref(), Some("SystemUser"));
}

// ============================================================================
// Route table
// ============================================================================

#[test]
fn children_of_root_resolve_with_trail() {
    let mut table = RouteTable::new();
    table
        .add_child_route(ROOT_NAME, RouteRecord::new("/dashboard", Some("Dashboard"), RouteComponent::NotFound, RouteMeta::titled("Dashboard")))
        .unwrap();
    table.add_route(page_not_found_route());

    let hit = table.resolve("/dashboard").unwrap();
    assert_eq!(hit.name.as_deref(), Some("Dashboard"));
    assert_eq!(hit.matched, vec!["Root", "Dashboard"]);

    let miss = table.resolve("/nowhere/at/all").unwrap();
    assert_eq!(miss.name.as_deref(), Some("PageNotFound"));
    assert_eq!(miss.params.get("pathMatch").map(String::as_str), Some("nowhere/at/all"));
}

#[test]
fn reset_keeps_only_whitelisted_routes() {
    let mut table = RouteTable::new();
    table
        .add_child_route(ROOT_NAME, RouteRecord::new("/dashboard", Some("Dashboard"), RouteComponent::NotFound, RouteMeta::default()))
        .unwrap();
    table.add_route(page_not_found_route());
    table.reset();
    assert_eq!(table.names(), vec!["Login", "Root", "Redirect"]);
}

#[test]
fn adding_under_unknown_parent_fails() {
    let mut table = RouteTable::new();
    let err = table
        .add_child_route("Nope", RouteRecord::new("/x", Some("X"), RouteComponent::NotFound, RouteMeta::default()))
        .unwrap_err();
    assert_eq!(err, RouteError::MissingParent("Nope".into()));
}

#[test]
fn re_adding_a_name_replaces_it() {
    let mut table = RouteTable::new();
    table.add_route(RouteRecord::new("/a", Some("A"), RouteComponent::NotFound, RouteMeta::default()));
    table.add_route(RouteRecord::new("/b", Some("A"), RouteComponent::NotFound, RouteMeta::default()));
    assert_eq!(table.get("A").map(|r| r.path.as_str()), Some("/b"));
    assert!(table.remove_route("A"));
    assert!(!table.has_route("A"));
}

// ============================================================================
// Guard
// ============================================================================

fn ctx(authenticated: bool, routes_loaded: bool) -> GuardContext<'static> {
    GuardContext {
        authenticated,
        routes_loaded,
        home_path: "/dashboard",
    }
}

#[test]
fn anonymous_users_go_to_login_with_redirect() {
    let to = Location::parse("/system/user?tab=2");
    let decision = before_each(Some("SystemUser"), &to, &ctx(false, false));
    assert_eq!(
        decision,
        GuardDecision::Redirect {
            to: Location::new("/login").with_query("redirect", "/system/user?tab=2"),
            replace: false,
        }
    );
    assert_eq!(before_each(Some("Login"), &Location::new("/login"), &ctx(false, false)), GuardDecision::Next);
}

#[test]
fn authenticated_users_skip_login_and_load_routes_first() {
    let login = Location::new("/login");
    assert!(matches!(
        before_each(Some("Login"), &login, &ctx(true, true)),
        GuardDecision::Redirect { replace: false, .. }
    ));

    let page = Location::new("/system/user");
    assert_eq!(before_each(None, &page, &ctx(true, false)), GuardDecision::LoadRoutes);
    assert_eq!(before_each(Some("SystemUser"), &page, &ctx(true, true)), GuardDecision::Next);

    let root = Location::new("/");
    assert_eq!(
        before_each(Some("Root"), &root, &ctx(true, true)),
        GuardDecision::Redirect {
            to: Location::new("/dashboard"),
            replace: true,
        }
    );
    assert_eq!(retry_target(&root, "/dashboard"), Location::new("/dashboard"));
    assert_eq!(retry_target(&page, "/dashboard"), page);
}
