//! Turning menu trees into registrable routes.
//!
//! Two shapes are supported. `flatten_routes` lifts every leaf to a direct
//! child of the shared layout so that one view cache covers all pages.
//! `transform_route_tree` keeps the tree, mapping the container sentinels to
//! layout components.

use std::collections::{HashMap, HashSet};

use convert_case::{Case, Casing};

use crate::api::model::{RouteInfo, RouteKind};
use crate::error::RouteError;
use crate::router::route::{RouteComponent, RouteMeta, RouteNode, RouteRecord};
use crate::router::views::ViewResolver;

/// Component sentinel for the top-level layout container.
pub const LAYOUT: &str = "LAYOUT";
/// Component sentinel for a nested pass-through container.
pub const PARENT_VIEW: &str = "ParentView";

// ============================================================================
// Naming
// ============================================================================

/// `/system/user` → `SystemUser`. Parameter markers are dropped.
pub fn route_name_from_path(path: &str) -> String {
    path.split('/')
        .map(|seg| seg.trim_start_matches(':'))
        .filter(|seg| !seg.is_empty())
        .map(|seg| seg.split('(').next().unwrap_or(seg))
        .collect::<Vec<_>>()
        .join(" ")
        .to_case(Case::Pascal)
}

/// Tracks names seen during one transform so collisions surface as errors.
#[derive(Default)]
struct NameLedger {
    seen: HashMap<String, String>,
}

impl NameLedger {
    fn claim(&mut self, name: &str, path: &str) -> Result<(), RouteError> {
        if let Some(first) = self.seen.get(name) {
            return Err(RouteError::DuplicateName {
                name: name.to_string(),
                first: first.clone(),
                second: path.to_string(),
            });
        }
        self.seen.insert(name.to_string(), path.to_string());
        Ok(())
    }
}

// ============================================================================
// Flatten
// ============================================================================

/// Every leaf becomes a route with no children, in depth-first order.
/// Leaves without a `componentPath` resolve to the not-found view.
pub fn flatten_routes(menus: &[RouteNode], resolver: &mut ViewResolver) -> Result<Vec<RouteRecord>, RouteError> {
    let mut result = Vec::new();
    let mut ledger = NameLedger::default();
    walk_leaves(menus, resolver, &mut ledger, &mut result)?;
    Ok(result)
}

fn walk_leaves(
    routes: &[RouteNode],
    resolver: &mut ViewResolver,
    ledger: &mut NameLedger,
    out: &mut Vec<RouteRecord>,
) -> Result<(), RouteError> {
    for route in routes {
        if !route.is_leaf() {
            walk_leaves(&route.children, resolver, ledger, out)?;
            continue;
        }

        let name = route.route_name();
        ledger.claim(&name, &route.path)?;

        let component = match route.meta.component_path.as_deref() {
            Some(path) => resolver.resolve(path, Some(&name)),
            None => RouteComponent::NotFound,
        };

        out.push(RouteRecord {
            path: route.path.clone(),
            name: Some(name),
            component,
            redirect: None,
            meta: route.meta.clone(),
            children: Vec::new(),
        });
    }
    Ok(())
}

// ============================================================================
// Nested transform
// ============================================================================

/// Convert a backend-described tree preserving its shape.
pub fn transform_route_tree(nodes: &[RouteNode], resolver: &mut ViewResolver) -> Result<Vec<RouteRecord>, RouteError> {
    let mut ledger = NameLedger::default();
    transform_level(nodes, resolver, &mut ledger)
}

fn transform_level(
    nodes: &[RouteNode],
    resolver: &mut ViewResolver,
    ledger: &mut NameLedger,
) -> Result<Vec<RouteRecord>, RouteError> {
    nodes
        .iter()
        .map(|node| {
            let name = node.route_name();
            ledger.claim(&name, &node.path)?;

            let reference = node
                .component
                .as_deref()
                .or(node.meta.component_path.as_deref());
            let component = match reference {
                Some(LAYOUT) => RouteComponent::Layout,
                Some(PARENT_VIEW) => RouteComponent::ParentView,
                Some(path) => resolver.resolve(path, Some(&name)),
                None if !node.is_leaf() => RouteComponent::ParentView,
                None => RouteComponent::NotFound,
            };

            Ok(RouteRecord {
                path: node.path.clone(),
                name: Some(name),
                component,
                redirect: node.redirect.clone(),
                meta: node.meta.clone(),
                children: transform_level(&node.children, resolver, ledger)?,
            })
        })
        .collect()
}

// ============================================================================
// Landing page
// ============================================================================

/// Depth-first: the first leaf not hidden from the menu.
pub fn find_first_valid_route_name(routes: &[RouteNode]) -> Option<String> {
    for route in routes {
        if route.meta.hide_in_menu {
            continue;
        }
        if !route.is_leaf() {
            if let Some(name) = find_first_valid_route_name(&route.children) {
                return Some(name);
            }
        } else {
            return Some(route.route_name());
        }
    }
    None
}

/// Path of the first leaf not hidden from the menu.
pub fn find_first_valid_route_path(routes: &[RouteNode]) -> Option<String> {
    for route in routes {
        if route.meta.hide_in_menu {
            continue;
        }
        if route.is_leaf() {
            return Some(route.path.clone());
        }
        if let Some(path) = find_first_valid_route_path(&route.children) {
            return Some(path);
        }
    }
    None
}

// ============================================================================
// Backend rows → tree
// ============================================================================

/// Assemble flat backend rows into a tree ordered by `order`.
///
/// Rows whose parent is `0` or unknown become roots. Directories without a
/// component get `LAYOUT` at the top level and `ParentView` below it.
pub fn build_menu_tree(rows: &[RouteInfo]) -> Vec<RouteNode> {
    let ids: HashSet<i64> = rows.iter().map(|r| r.route_id).collect();
    let mut visited = HashSet::new();

    let mut roots: Vec<&RouteInfo> = rows
        .iter()
        .filter(|r| r.parent == 0 || !ids.contains(&r.parent))
        .collect();
    roots.sort_by_key(|r| r.order.unwrap_or(0));

    roots
        .into_iter()
        .filter_map(|row| build_node(row, rows, true, &mut visited))
        .collect()
}

fn build_node(row: &RouteInfo, rows: &[RouteInfo], top_level: bool, visited: &mut HashSet<i64>) -> Option<RouteNode> {
    if !visited.insert(row.route_id) {
        tracing::warn!("route row {} appears more than once in the menu tree", row.route_id);
        return None;
    }

    let mut children: Vec<&RouteInfo> = rows
        .iter()
        .filter(|r| r.parent == row.route_id && r.route_id != row.route_id)
        .collect();
    children.sort_by_key(|r| r.order.unwrap_or(0));

    let component = match (row.kind(), row.component.as_deref()) {
        (_, Some(c)) if !c.is_empty() => Some(c.to_string()),
        (RouteKind::Directory, _) if top_level => Some(LAYOUT.to_string()),
        (RouteKind::Directory, _) => Some(PARENT_VIEW.to_string()),
        (RouteKind::Route, _) => None,
    };
    let component_path = component
        .as_deref()
        .filter(|c| *c != LAYOUT && *c != PARENT_VIEW)
        .map(str::to_string);

    Some(RouteNode {
        path: row.path.clone(),
        name: Some(route_name_from_path(&row.path)),
        component,
        redirect: row.redirect.clone(),
        meta: RouteMeta {
            title: row.title.clone(),
            icon: row.icon.clone(),
            order: row.order,
            component_path,
            hide_in_menu: row.hide_side_menu.unwrap_or(false),
            keep_alive: row.keep_alive,
            ..Default::default()
        },
        children: children
            .into_iter()
            .filter_map(|child| build_node(child, rows, false, visited))
            .collect(),
    })
}
