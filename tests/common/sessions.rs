use std::cell::Cell;
use std::rc::Rc;

use admin_console::api::auth::{AuthApi, StaticAuthApi};
use admin_console::api::error::ApiError;
use admin_console::api::model::{LoginParams, LoginResponse, UserInfo};
use admin_console::router::route::RouteNode;
use admin_console::router::views::{ViewRegistry, ViewResolver};
use admin_console::session::SessionController;
use admin_console::storage::MemoryStore;
use admin_console::tabs::TabsStore;
use admin_console::App;

pub fn demo_registry() -> ViewRegistry {
    ViewRegistry::new("vue").with_modules([
        "dashboard/index.vue",
        "system/user/index.vue",
        "system/role/index.vue",
    ])
}

pub fn static_session() -> SessionController {
    SessionController::new(Box::new(StaticAuthApi::new()), ViewResolver::new(demo_registry()))
}

pub fn session_with(api: impl AuthApi + 'static) -> SessionController {
    SessionController::new(Box::new(api), ViewResolver::new(demo_registry()))
}

pub fn static_app() -> App {
    App::new(static_session(), TabsStore::new(), Box::new(MemoryStore::new()))
}

pub fn admin() -> LoginParams {
    LoginParams::new("admin", "secret")
}

/// What the scripted backend's `menus` call does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MenuOutcome {
    Ok,
    Fail,
    Cancel,
    Expire,
}

/// Static backend whose menu call can be scripted to fail. Counts menu calls.
pub struct ScriptedApi {
    inner: StaticAuthApi,
    pub outcome: Rc<Cell<MenuOutcome>>,
    pub menu_calls: Rc<Cell<usize>>,
}

impl ScriptedApi {
    pub fn new(outcome: MenuOutcome) -> Self {
        ScriptedApi {
            inner: StaticAuthApi::new(),
            outcome: Rc::new(Cell::new(outcome)),
            menu_calls: Rc::new(Cell::new(0)),
        }
    }
}

impl AuthApi for ScriptedApi {
    fn login(&self, params: &LoginParams) -> Result<LoginResponse, ApiError> {
        self.inner.login(params)
    }

    fn user_info(&self) -> Result<UserInfo, ApiError> {
        self.inner.user_info()
    }

    fn menus(&self) -> Result<Vec<RouteNode>, ApiError> {
        self.menu_calls.set(self.menu_calls.get() + 1);
        match self.outcome.get() {
            MenuOutcome::Ok => self.inner.menus(),
            MenuOutcome::Fail => Err(ApiError::from_status(500, "")),
            MenuOutcome::Cancel => Err(ApiError::Canceled),
            MenuOutcome::Expire => Err(ApiError::SessionExpired {
                message: "please log in again".to_string(),
            }),
        }
    }
}
