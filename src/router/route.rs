use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::router::views::NamedView;

// ============================================================================
// Declarative Route Tree
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    /// View module path relative to the view root, without extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_path: Option<String>,

    #[serde(default)]
    pub hide_in_menu: bool,

    #[serde(default)]
    pub hide_in_tabs: bool,

    /// Pinned tab.
    #[serde(default)]
    pub affix: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
}

impl RouteMeta {
    pub fn titled(title: impl Into<String>) -> Self {
        RouteMeta {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// One node of a menu/route description, as configured or served.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Component reference: a view path or one of the container sentinels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,

    #[serde(default)]
    pub meta: RouteMeta,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        RouteNode {
            path: path.into(),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_view(mut self, component_path: impl Into<String>) -> Self {
        self.meta.component_path = Some(component_path.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The declared name, or one derived from the path.
    pub fn route_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => crate::router::transform::route_name_from_path(&self.path),
        }
    }
}

// ============================================================================
// Registered Routes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RouteComponent {
    /// The shared layout container.
    Layout,
    /// Pass-through container with no view of its own.
    ParentView,
    /// A registered view carrying the route name as its display name.
    View(Rc<NamedView>),
    /// A registered view module used without a route name.
    Module(String),
    /// A view that ships with the console itself.
    Builtin(&'static str),
    NotFound,
}

impl RouteComponent {
    /// Layout and pass-through containers render no page of their own.
    pub fn is_container(&self) -> bool {
        matches!(self, RouteComponent::Layout | RouteComponent::ParentView)
    }

    /// Display name used for view-cache matching, when there is one.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            RouteComponent::View(view) => Some(&view.name),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RouteComponent::Layout => "<layout>".to_string(),
            RouteComponent::ParentView => "<parent-view>".to_string(),
            RouteComponent::View(view) => format!("{} ({})", view.module, view.name),
            RouteComponent::Module(module) => module.clone(),
            RouteComponent::Builtin(view) => format!("<builtin:{}>", view),
            RouteComponent::NotFound => "<not-found>".to_string(),
        }
    }
}

/// A route as registered with the route table.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub component: RouteComponent,
    pub redirect: Option<String>,
    pub meta: RouteMeta,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>, name: Option<&str>, component: RouteComponent, meta: RouteMeta) -> Self {
        RouteRecord {
            path: path.into(),
            name: name.map(str::to_string),
            component,
            redirect: None,
            meta,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
