//! Workspace tabs and the view-cache set.

pub mod store;

pub use store::{DEFAULT_HOME_PATH, TabItem, TabRoute, TabsStore};
