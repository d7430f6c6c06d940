//! Route model, view resolution, menu transformation and the route table.

pub mod guard;
pub mod route;
pub mod table;
pub mod transform;
pub mod views;

pub use guard::{GuardContext, GuardDecision, before_each};
pub use route::{RouteComponent, RouteMeta, RouteNode, RouteRecord};
pub use table::{Location, ResolvedRoute, RouteTable};
pub use transform::{build_menu_tree, find_first_valid_route_name, flatten_routes, transform_route_tree};
pub use views::{NamedView, ViewRegistry, ViewResolver};
