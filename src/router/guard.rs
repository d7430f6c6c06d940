//! Navigation guard: decides what happens before a navigation completes.

use crate::router::table::{LOGIN_NAME, ROOT_NAME, is_whitelisted, Location};

/// Session facts the guard needs.
#[derive(Debug, Clone)]
pub struct GuardContext<'a> {
    pub authenticated: bool,
    pub routes_loaded: bool,
    pub home_path: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the navigation through.
    Next,
    Redirect { to: Location, replace: bool },
    /// Routes must be loaded first; retry with `retry_target` afterwards.
    LoadRoutes,
}

/// Decide on a navigation to `to` (matched as `to_name`, if anything matched).
pub fn before_each(to_name: Option<&str>, to: &Location, ctx: &GuardContext<'_>) -> GuardDecision {
    if ctx.authenticated {
        if to_name == Some(LOGIN_NAME) {
            return GuardDecision::Redirect {
                to: Location::new(ctx.home_path),
                replace: false,
            };
        }
        if !ctx.routes_loaded {
            return GuardDecision::LoadRoutes;
        }
        if to.path == "/" && to_name == Some(ROOT_NAME) {
            return GuardDecision::Redirect {
                to: Location::new(ctx.home_path),
                replace: true,
            };
        }
        return GuardDecision::Next;
    }

    if to_name.is_some_and(is_whitelisted) {
        return GuardDecision::Next;
    }

    GuardDecision::Redirect {
        to: Location::new("/login").with_query("redirect", to.full_path()),
        replace: false,
    }
}

/// Where to go once routes were loaded for a navigation to `to`.
pub fn retry_target(to: &Location, home_path: &str) -> Location {
    if to.path == "/" {
        Location::new(home_path)
    } else {
        to.clone()
    }
}

/// Where to go when loading routes failed.
pub fn login_location() -> Location {
    Location::new("/login")
}
