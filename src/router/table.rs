//! The live route table: basic routes plus whatever a session registers.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::RouteError;
use crate::router::route::{RouteComponent, RouteMeta, RouteRecord};

pub const LOGIN_NAME: &str = "Login";
pub const ROOT_NAME: &str = "Root";
pub const REDIRECT_NAME: &str = "Redirect";
pub const PAGE_NOT_FOUND_NAME: &str = "PageNotFound";

/// Routes that survive a router reset and are reachable without a session.
pub const WHITE_NAME_LIST: [&str; 3] = [LOGIN_NAME, ROOT_NAME, REDIRECT_NAME];

pub fn is_whitelisted(name: &str) -> bool {
    WHITE_NAME_LIST.contains(&name)
}

/// Routes the console registers itself, as opposed to menu pages.
pub fn is_basic_route(name: &str) -> bool {
    is_whitelisted(name) || name == PAGE_NOT_FOUND_NAME
}

// ============================================================================
// Basic Routes
// ============================================================================

pub fn login_route() -> RouteRecord {
    RouteRecord::new(
        "/login",
        Some(LOGIN_NAME),
        RouteComponent::Builtin("login/index"),
        RouteMeta::titled("Login"),
    )
}

pub fn root_route() -> RouteRecord {
    RouteRecord::new("/", Some(ROOT_NAME), RouteComponent::Layout, RouteMeta::titled("Root"))
}

pub fn redirect_route() -> RouteRecord {
    let mut meta = RouteMeta::titled(REDIRECT_NAME);
    meta.hide_in_menu = true;
    RouteRecord::new(
        "/redirect/:path(.*)",
        Some(REDIRECT_NAME),
        RouteComponent::Builtin("redirect/index"),
        meta,
    )
}

/// Catch-all. Must be registered after every real route.
pub fn page_not_found_route() -> RouteRecord {
    let mut meta = RouteMeta::titled("ErrorPage");
    meta.hide_in_menu = true;
    RouteRecord::new(
        "/:pathMatch(.*)*",
        Some(PAGE_NOT_FOUND_NAME),
        RouteComponent::NotFound,
        meta,
    )
}

pub fn basic_routes() -> Vec<RouteRecord> {
    vec![login_route(), root_route(), redirect_route()]
}

// ============================================================================
// Location
// ============================================================================

/// A navigation target: path plus query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Location {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// Split `path?k=v&k2=v2`.
    pub fn parse(full: &str) -> Self {
        let (path, query) = match full.split_once('?') {
            Some((p, q)) => (p, q),
            None => (full, ""),
        };
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();
        Location {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

// ============================================================================
// Path Matching
// ============================================================================

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    /// `:name(.*)` or `:name(.*)*`: swallows the rest of the path.
    Rest(&'a str),
}

fn parse_pattern(pattern: &str) -> Vec<Segment<'_>> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|seg| match seg.strip_prefix(':') {
            Some(param) => match param.split_once('(') {
                Some((name, regex)) if regex.starts_with(".*") => Segment::Rest(name),
                Some((name, _)) => Segment::Param(name),
                None => Segment::Param(param),
            },
            None => Segment::Static(seg),
        })
        .collect()
}

fn match_path(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let segments = parse_pattern(pattern);
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut params = BTreeMap::new();

    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Rest(name) => {
                params.insert(name.to_string(), parts.get(i..).unwrap_or_default().join("/"));
                return Some(params);
            }
            Segment::Static(s) => {
                if parts.get(i) != Some(s) {
                    return None;
                }
            }
            Segment::Param(name) => {
                let value = parts.get(i)?;
                params.insert(name.to_string(), value.to_string());
            }
        }
    }

    (parts.len() == segments.len()).then_some(params)
}

fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return child.to_string();
    }
    if child.is_empty() {
        return parent.to_string();
    }
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

/// Result of matching a path against the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    pub name: Option<String>,
    pub path: String,
    pub meta: RouteMeta,
    pub component: RouteComponent,
    pub params: BTreeMap<String, String>,
    /// Names from the outermost matched record inward.
    pub matched: Vec<String>,
}

// ============================================================================
// Route Table
// ============================================================================

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    pub fn new() -> Self {
        RouteTable { routes: basic_routes() }
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Register a top-level route, replacing one with the same name.
    pub fn add_route(&mut self, record: RouteRecord) {
        if let Some(name) = record.name.clone() {
            self.remove_route(&name);
        }
        self.routes.push(record);
    }

    /// Register `record` as a child of the route named `parent`.
    pub fn add_child_route(&mut self, parent: &str, record: RouteRecord) -> Result<(), RouteError> {
        if !self.has_route(parent) {
            return Err(RouteError::MissingParent(parent.to_string()));
        }
        if let Some(name) = record.name.clone() {
            self.remove_route(&name);
        }
        let target = find_mut(&mut self.routes, parent)
            .ok_or_else(|| RouteError::MissingParent(parent.to_string()))?;
        target.children.push(record);
        Ok(())
    }

    pub fn has_route(&self, name: &str) -> bool {
        find(&self.routes, name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&RouteRecord> {
        find(&self.routes, name)
    }

    /// Remove the named route (and its children). Returns whether it existed.
    pub fn remove_route(&mut self, name: &str) -> bool {
        remove_named(&mut self.routes, name)
    }

    /// Every registered route name, depth-first.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_names(&self.routes, &mut names);
        names
    }

    /// Drop every route not on the whitelist.
    pub fn reset(&mut self) {
        for name in self.names() {
            if !is_whitelisted(&name) {
                self.remove_route(&name);
            }
        }
    }

    /// Match `path` against the table. Children are tried before their
    /// parent; top-level records in registration order.
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        resolve_in(&self.routes, "", path, &mut Vec::new())
    }
}

fn find<'a>(routes: &'a [RouteRecord], name: &str) -> Option<&'a RouteRecord> {
    routes.iter().find_map(|r| {
        if r.name() == Some(name) {
            Some(r)
        } else {
            find(&r.children, name)
        }
    })
}

fn find_mut<'a>(routes: &'a mut [RouteRecord], name: &str) -> Option<&'a mut RouteRecord> {
    for route in routes.iter_mut() {
        if route.name() == Some(name) {
            return Some(route);
        }
        if let Some(found) = find_mut(&mut route.children, name) {
            return Some(found);
        }
    }
    None
}

fn remove_named(routes: &mut Vec<RouteRecord>, name: &str) -> bool {
    if let Some(index) = routes.iter().position(|r| r.name() == Some(name)) {
        routes.remove(index);
        return true;
    }
    routes.iter_mut().any(|r| remove_named(&mut r.children, name))
}

fn collect_names(routes: &[RouteRecord], out: &mut Vec<String>) {
    for route in routes {
        if let Some(name) = route.name() {
            out.push(name.to_string());
        }
        collect_names(&route.children, out);
    }
}

fn resolve_in(routes: &[RouteRecord], base: &str, path: &str, trail: &mut Vec<String>) -> Option<ResolvedRoute> {
    for route in routes {
        let full = join_paths(base, &route.path);
        if let Some(name) = route.name() {
            trail.push(name.to_string());
        }

        if let Some(found) = resolve_in(&route.children, &full, path, trail) {
            return Some(found);
        }
        if let Some(params) = match_path(&full, path) {
            return Some(ResolvedRoute {
                name: route.name.clone(),
                path: path.to_string(),
                meta: route.meta.clone(),
                component: route.component.clone(),
                params,
                matched: trail.clone(),
            });
        }

        if route.name.is_some() {
            trail.pop();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_param_segments() {
        assert!(match_path("/system/user", "/system/user").is_some());
        assert!(match_path("/system/user", "/system").is_none());
        let params = match_path("/user/:id", "/user/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn rest_segment_swallows_tail() {
        let params = match_path("/:pathMatch(.*)*", "/a/b/c").unwrap();
        assert_eq!(params.get("pathMatch").map(String::as_str), Some("a/b/c"));
        let params = match_path("/redirect/:path(.*)", "/redirect/system/user").unwrap();
        assert_eq!(params.get("path").map(String::as_str), Some("system/user"));
    }

    #[test]
    fn location_round_trips_query() {
        let loc = Location::parse("/login?redirect=/system/user");
        assert_eq!(loc.path, "/login");
        assert_eq!(loc.query.get("redirect").map(String::as_str), Some("/system/user"));
        assert_eq!(loc.full_path(), "/login?redirect=/system/user");
    }
}
