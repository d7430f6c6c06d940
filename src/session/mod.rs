//! The user session and its route registration.

pub mod controller;

pub use controller::{RouteMode, SessionController, SessionState};
