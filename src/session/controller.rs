//! Session lifecycle: login, route loading, logout.
//!
//! ```text
//! Anonymous ──login──▶ Authenticating ──token──▶ AuthenticatedNoRoutes
//!     ▲                                              │ after_login
//!     └────────────── logout / failure ◀─────────────┤
//!                                                    ▼
//!                                    AuthenticatedRoutesLoaded
//! ```

use serde::{Deserialize, Serialize};

use crate::api::auth::AuthApi;
use crate::api::error::ApiError;
use crate::api::model::{LoginParams, LoginResponse, UserInfo};
use crate::error::{SessionError, StorageError};
use crate::router::guard::GuardContext;
use crate::router::route::{RouteNode, RouteRecord};
use crate::router::table::{Location, ROOT_NAME, RouteTable, page_not_found_route};
use crate::router::transform::{find_first_valid_route_name, find_first_valid_route_path, flatten_routes, transform_route_tree};
use crate::router::views::ViewResolver;
use crate::storage::{KeyValueStore, USER_STORE_KEY, load_json, save_json};
use crate::tabs::store::{DEFAULT_HOME_PATH, TabsStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Anonymous,
    Authenticating,
    AuthenticatedNoRoutes,
    AuthenticatedRoutesLoaded,
}

/// How menu trees become routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Every leaf a direct child of the shared layout.
    #[default]
    Flatten,
    /// Keep the tree; containers become layout components.
    Nested,
}

/// The persisted subset of the session.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSession {
    #[serde(default)]
    token: String,
}

pub struct SessionController {
    api: Box<dyn AuthApi>,
    resolver: ViewResolver,
    routes: RouteTable,
    mode: RouteMode,
    home_path: String,
    state: SessionState,
    token: String,
    user_info: Option<UserInfo>,
    menus: Vec<RouteNode>,
    loaded_routes: Vec<RouteRecord>,
    reauth_prompt: Option<String>,
}

impl SessionController {
    pub fn new(api: Box<dyn AuthApi>, resolver: ViewResolver) -> Self {
        SessionController {
            api,
            resolver,
            routes: RouteTable::new(),
            mode: RouteMode::default(),
            home_path: DEFAULT_HOME_PATH.to_string(),
            state: SessionState::Anonymous,
            token: String::new(),
            user_info: None,
            menus: Vec::new(),
            loaded_routes: Vec::new(),
            reauth_prompt: None,
        }
    }

    pub fn with_mode(mut self, mode: RouteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_home_path(mut self, home_path: impl Into<String>) -> Self {
        self.home_path = home_path.into();
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn is_dynamic_added_menu(&self) -> bool {
        self.state == SessionState::AuthenticatedRoutesLoaded
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    pub fn menus(&self) -> &[RouteNode] {
        &self.menus
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Routes registered by the last successful `after_login`.
    pub fn loaded_routes(&self) -> &[RouteRecord] {
        &self.loaded_routes
    }

    pub fn home_path(&self) -> &str {
        &self.home_path
    }

    pub fn guard_context(&self) -> GuardContext<'_> {
        GuardContext {
            authenticated: self.is_authenticated(),
            routes_loaded: self.is_dynamic_added_menu(),
            home_path: &self.home_path,
        }
    }

    fn set_token(&mut self, token: String) {
        self.api.set_token(Some(token.clone()).filter(|t| !t.is_empty()));
        self.token = token;
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Pick up a persisted token. Routes still have to be loaded.
    pub fn restore(&mut self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let saved: PersistedSession = load_json(store, USER_STORE_KEY)?.unwrap_or_default();
        if !saved.token.is_empty() {
            tracing::debug!("restored session token");
            self.set_token(saved.token);
            self.state = SessionState::AuthenticatedNoRoutes;
        }
        Ok(())
    }

    pub fn persist(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        save_json(
            store,
            USER_STORE_KEY,
            &PersistedSession {
                token: self.token.clone(),
            },
        )
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Exchange credentials for a token, then load routes. Any failure
    /// leaves the session anonymous.
    pub fn login(
        &mut self,
        params: &LoginParams,
        tabs: &mut TabsStore,
        store: &mut dyn KeyValueStore,
    ) -> Result<LoginResponse, SessionError> {
        tracing::info!("logging in as '{}'", params.username);
        let previous = self.state;
        self.state = SessionState::Authenticating;

        let response = match self.api.login(params) {
            Ok(response) => response,
            Err(e) => {
                self.state = previous;
                self.note_api_error(&e);
                return Err(e.into());
            }
        };

        self.set_token(response.token.clone());
        self.state = SessionState::AuthenticatedNoRoutes;
        self.persist(store)?;

        self.after_login(tabs, store)?;
        Ok(response)
    }

    /// Fetch profile and menus, register routes under the shared root and
    /// append the catch-all last.
    ///
    /// On failure the session is torn down, except for canceled requests.
    pub fn after_login(
        &mut self,
        tabs: &mut TabsStore,
        store: &mut dyn KeyValueStore,
    ) -> Result<Vec<RouteRecord>, SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }

        match self.load_routes() {
            Ok(routes) => {
                self.state = SessionState::AuthenticatedRoutesLoaded;
                tracing::info!("registered {} route(s)", routes.len());
                Ok(routes)
            }
            Err(e) if e.is_canceled() => {
                tracing::debug!("route loading canceled");
                Err(e)
            }
            Err(e) => {
                tracing::error!("failed to load user info or routes: {}", e);
                self.logout(tabs, store)?;
                if let SessionError::Api(api) = &e {
                    self.note_api_error(api);
                }
                Err(e)
            }
        }
    }

    fn load_routes(&mut self) -> Result<Vec<RouteRecord>, SessionError> {
        let info = self.api.user_info()?;
        let menus = self.api.menus()?;

        let records = match self.mode {
            RouteMode::Flatten => flatten_routes(&menus, &mut self.resolver)?,
            RouteMode::Nested => transform_route_tree(&menus, &mut self.resolver)?,
        };

        for record in &records {
            match self.mode {
                RouteMode::Flatten => self.routes.add_child_route(ROOT_NAME, record.clone())?,
                RouteMode::Nested => self.routes.add_route(record.clone()),
            }
        }
        self.routes.add_route(page_not_found_route());

        self.user_info = Some(info);
        self.menus = menus;
        self.loaded_routes = records.clone();
        Ok(records)
    }

    /// Clear the session, the dynamic routes, the tabs and everything
    /// persisted. Safe to call repeatedly.
    pub fn logout(&mut self, tabs: &mut TabsStore, store: &mut dyn KeyValueStore) -> Result<Location, SessionError> {
        if self.is_authenticated() || self.state != SessionState::Anonymous {
            tracing::info!("logging out");
        }
        self.set_token(String::new());
        self.user_info = None;
        self.menus.clear();
        self.loaded_routes.clear();
        self.state = SessionState::Anonymous;
        self.routes.reset();
        tabs.reset_tabs();
        store.clear()?;
        Ok(Location::new("/login"))
    }

    // ------------------------------------------------------------------
    // Landing
    // ------------------------------------------------------------------

    /// First menu leaf not hidden from the menu.
    pub fn landing_route_name(&self) -> Option<String> {
        find_first_valid_route_name(&self.menus)
    }

    /// Path of the landing route, or the home path.
    pub fn landing_path(&self) -> String {
        find_first_valid_route_path(&self.menus).unwrap_or_else(|| self.home_path.clone())
    }

    // ------------------------------------------------------------------
    // Re-authentication
    // ------------------------------------------------------------------

    /// Record a failed exchange. An expired session raises the re-login
    /// prompt; canceled requests are ignored.
    pub fn note_api_error(&mut self, error: &ApiError) {
        match error {
            ApiError::Canceled => {}
            ApiError::SessionExpired { message } => {
                tracing::warn!("session expired: {}", message);
                self.reauth_prompt = Some(message.clone());
            }
            other => {
                if let Some(message) = other.user_message() {
                    tracing::error!("{}", message);
                }
            }
        }
    }

    pub fn reauth_prompt(&self) -> Option<&str> {
        self.reauth_prompt.as_deref()
    }

    /// Accept the re-login prompt: everything is cleared and the user is
    /// sent to the login page.
    pub fn confirm_reauth(&mut self, tabs: &mut TabsStore, store: &mut dyn KeyValueStore) -> Result<Location, SessionError> {
        self.reauth_prompt = None;
        self.logout(tabs, store)
    }

    pub fn dismiss_reauth(&mut self) {
        self.reauth_prompt = None;
    }
}
