//! Application context: one session, one tab store and one persistence
//! backend, constructed at start-up and passed around explicitly.

use crate::api::model::LoginParams;
use crate::error::ConsoleError;
use crate::router::guard::{GuardDecision, before_each, login_location, retry_target};
use crate::router::table::{Location, ResolvedRoute, is_basic_route};
use crate::session::controller::SessionController;
use crate::storage::KeyValueStore;
use crate::tabs::store::{TabRoute, TabsStore};

/// Guard redirects allowed for one navigation.
pub const MAX_REDIRECTS: usize = 8;

pub struct App {
    session: SessionController,
    tabs: TabsStore,
    storage: Box<dyn KeyValueStore>,
    current: Option<ResolvedRoute>,
}

impl App {
    pub fn new(session: SessionController, tabs: TabsStore, storage: Box<dyn KeyValueStore>) -> Self {
        App {
            session,
            tabs,
            storage,
            current: None,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionController {
        &mut self.session
    }

    pub fn tabs(&self) -> &TabsStore {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TabsStore {
        &mut self.tabs
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        &*self.storage
    }

    /// The route of the last completed navigation.
    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.current.as_ref()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Load persisted session and tab state.
    pub fn start(&mut self) -> Result<(), ConsoleError> {
        self.session.restore(&*self.storage)?;
        self.tabs.load(&*self.storage)?;
        tracing::debug!(
            "started with {} persisted tab(s), session {:?}",
            self.tabs.tabs().len(),
            self.session.state()
        );
        Ok(())
    }

    /// Persist the session token and the tab store.
    pub fn save(&mut self) -> Result<(), ConsoleError> {
        self.session.persist(&mut *self.storage)?;
        self.tabs.save(&mut *self.storage)?;
        Ok(())
    }

    /// Log in, then navigate to `redirect` or the landing page.
    pub fn login(&mut self, params: &LoginParams, redirect: Option<&str>) -> Result<ResolvedRoute, ConsoleError> {
        self.session
            .login(params, &mut self.tabs, &mut *self.storage)?;
        let target = redirect
            .map(str::to_string)
            .unwrap_or_else(|| self.session.landing_path());
        self.navigate(&target)
    }

    /// Log out and land on the login page.
    pub fn logout(&mut self) -> Result<ResolvedRoute, ConsoleError> {
        let location = self.session.logout(&mut self.tabs, &mut *self.storage)?;
        self.current = None;
        self.navigate(&location.full_path())
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Navigate to `target`, following guard redirects. Menu pages get a
    /// tab; basic routes and containers do not.
    pub fn navigate(&mut self, target: &str) -> Result<ResolvedRoute, ConsoleError> {
        let mut location = Location::parse(target);

        for _ in 0..MAX_REDIRECTS {
            let resolved = self.session.routes().resolve(&location.path);
            let name = resolved.as_ref().and_then(|r| r.name.clone());
            let decision = before_each(name.as_deref(), &location, &self.session.guard_context());
            tracing::debug!("navigate {} -> {:?}", location, decision);

            match decision {
                GuardDecision::Next => {
                    let route = resolved.ok_or_else(|| ConsoleError::NoRoute(location.full_path()))?;
                    return self.complete(route);
                }
                GuardDecision::Redirect { to, .. } => location = to,
                GuardDecision::LoadRoutes => {
                    match self.session.after_login(&mut self.tabs, &mut *self.storage) {
                        Ok(_) => location = retry_target(&location, self.session.home_path()),
                        Err(e) if e.is_canceled() => return Err(e.into()),
                        Err(e) => {
                            tracing::warn!("route loading failed during navigation: {}", e);
                            location = login_location();
                        }
                    }
                }
            }
        }

        Err(ConsoleError::RedirectLoop(target.to_string()))
    }

    fn complete(&mut self, route: ResolvedRoute) -> Result<ResolvedRoute, ConsoleError> {
        let is_page = route.name.as_deref().is_some_and(|name| !is_basic_route(name))
            && !route.component.is_container();
        if is_page {
            self.tabs.add_tab(&TabRoute::from(&route));
        }
        self.current = Some(route.clone());
        if self.session.is_authenticated() {
            self.save()?;
        }
        Ok(route)
    }

    // ------------------------------------------------------------------
    // Tabs
    // ------------------------------------------------------------------

    /// Close a tab; when it was active, move to its neighbour.
    pub fn close_tab(&mut self, name: &str) -> Result<Option<ResolvedRoute>, ConsoleError> {
        match self.tabs.close_tab(name) {
            Some(path) => self.navigate(&path).map(Some),
            None => {
                self.save()?;
                Ok(None)
            }
        }
    }

    pub fn close_all_tabs(&mut self) -> Result<ResolvedRoute, ConsoleError> {
        let path = self.tabs.close_all_tabs();
        self.navigate(&path)
    }

    /// Force the current view to re-initialize.
    pub fn refresh_current_tab(&mut self) -> u64 {
        let name = self.tabs.active_tab().to_string();
        self.tabs.refresh_current_tab(&name)
    }
}
