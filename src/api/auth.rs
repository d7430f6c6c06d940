use serde_json::json;

use crate::api::client::{CancelToken, HttpClient};
use crate::api::error::ApiError;
use crate::api::model::{LoginParams, LoginResponse, RouteInfo, UserInfo};
use crate::router::route::{RouteMeta, RouteNode};
use crate::router::transform::build_menu_tree;

// ============================================================================
// Auth API
// ============================================================================

/// The three exchanges the session needs from a backend.
pub trait AuthApi {
    fn login(&self, params: &LoginParams) -> Result<LoginResponse, ApiError>;

    fn user_info(&self) -> Result<UserInfo, ApiError>;

    /// The menu tree for the current user.
    fn menus(&self) -> Result<Vec<RouteNode>, ApiError>;

    /// Token to present on subsequent requests.
    fn set_token(&mut self, _token: Option<String>) {}
}

// ============================================================================
// HTTP Backend
// ============================================================================

pub struct HttpAuthApi {
    client: HttpClient,
}

impl HttpAuthApi {
    pub fn new(client: HttpClient) -> Self {
        HttpAuthApi { client }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.client.cancel_token()
    }
}

impl AuthApi for HttpAuthApi {
    fn login(&self, params: &LoginParams) -> Result<LoginResponse, ApiError> {
        let body = serde_json::to_value(params).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.client.post("/auth/login", Some(body))
    }

    fn user_info(&self) -> Result<UserInfo, ApiError> {
        self.client.get("/account/info", None)
    }

    fn menus(&self) -> Result<Vec<RouteNode>, ApiError> {
        let rows: Vec<RouteInfo> = self.client.get("/account/menus", Some(json!({})))?;
        Ok(build_menu_tree(&rows))
    }

    fn set_token(&mut self, token: Option<String>) {
        self.client.set_token(token);
    }
}

// ============================================================================
// Static Backend (offline / demo)
// ============================================================================

/// Backend that answers from fixed data: token `123{username}`, an admin
/// profile and a small demo menu.
pub struct StaticAuthApi {
    menus: Vec<RouteNode>,
    user: UserInfo,
}

impl Default for StaticAuthApi {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticAuthApi {
    pub fn new() -> Self {
        StaticAuthApi {
            menus: demo_menus(),
            user: UserInfo {
                user_id: 1,
                username: "admin".to_string(),
                nickname: "Administrator".to_string(),
                avatar: None,
                email: None,
                phone: None,
                role_id: 1,
                org_id: 1,
                app_user_id: None,
                status: 0,
            },
        }
    }

    pub fn with_menus(mut self, menus: Vec<RouteNode>) -> Self {
        self.menus = menus;
        self
    }
}

impl AuthApi for StaticAuthApi {
    fn login(&self, params: &LoginParams) -> Result<LoginResponse, ApiError> {
        if params.username.trim().is_empty() {
            return Err(ApiError::Business {
                code: 1001,
                message: "username is required".to_string(),
            });
        }
        Ok(LoginResponse {
            token: format!("123{}", params.username),
            expire_seconds: 0,
        })
    }

    fn user_info(&self) -> Result<UserInfo, ApiError> {
        Ok(self.user.clone())
    }

    fn menus(&self) -> Result<Vec<RouteNode>, ApiError> {
        Ok(self.menus.clone())
    }
}

fn menu_meta(title: &str, icon: &str, order: i64) -> RouteMeta {
    RouteMeta {
        title: title.to_string(),
        icon: Some(icon.to_string()),
        order: Some(order),
        ..Default::default()
    }
}

/// Dashboard plus a System directory holding Users and Roles.
pub fn demo_menus() -> Vec<RouteNode> {
    vec![
        RouteNode::new("/dashboard", "Dashboard")
            .with_meta(menu_meta("Dashboard", "ant-design:dashboard-outlined", 1))
            .with_view("dashboard/index"),
        RouteNode::new("/system", "System")
            .with_meta(menu_meta("System", "ant-design:setting-outlined", 2))
            .with_children(vec![
                RouteNode::new("/system/user", "SystemUser")
                    .with_meta(menu_meta("Users", "ant-design:user-outlined", 1))
                    .with_view("system/user/index"),
                RouteNode::new("/system/role", "SystemRole")
                    .with_meta(menu_meta("Roles", "ant-design:team-outlined", 2))
                    .with_view("system/role/index"),
            ]),
    ]
}
