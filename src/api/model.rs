use serde::{Deserialize, Serialize};

// ============================================================================
// Envelope
// ============================================================================

/// Standard backend response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResOp<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

/// Success code.
pub const CODE_OK: i64 = 0;
/// The backend no longer accepts the session token.
pub const CODE_SESSION_EXPIRED: i64 = 2001;

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
}

impl LoginParams {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        LoginParams {
            username: username.into(),
            password: password.into(),
            captcha: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub expire_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: i64,
    pub username: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role_id: i64,
    pub org_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_user_id: Option<i64>,
    pub status: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub role_id: i64,
    pub role_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_role: Option<i64>,
    /// Comma-separated route ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_ids: Option<String>,
    pub status: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

impl RoleInfo {
    pub fn route_id_list(&self) -> Vec<i64> {
        self.route_ids
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect()
    }
}

// ============================================================================
// Menu rows
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Directory,
    Route,
}

/// One backend menu row. Rows reference their parent by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub route_id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// 0 = directory, 1 = route.
    #[serde(rename = "type")]
    pub route_type: u8,
    #[serde(default)]
    pub parent: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_side_menu: Option<bool>,
}

impl RouteInfo {
    pub fn kind(&self) -> RouteKind {
        if self.route_type == 0 {
            RouteKind::Directory
        } else {
            RouteKind::Route
        }
    }
}
