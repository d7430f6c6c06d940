/// Failures of a backend exchange.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was canceled through its token.
    #[error("request canceled")]
    Canceled,

    #[error("http {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    /// Application code 2001: the user has to log in again.
    #[error("session expired: {message}")]
    SessionExpired { message: String },

    /// Any other non-zero application code.
    #[error("request rejected ({code}): {message}")]
    Business { code: i64, message: String },
}

impl ApiError {
    /// Map an HTTP status to the message shown to users.
    pub fn from_status(status: u16, fallback: &str) -> Self {
        let message = match status {
            400 => "Bad request parameters".to_string(),
            401 => "Unauthorized, please log in".to_string(),
            403 => "Access denied".to_string(),
            404 => "Request address not found".to_string(),
            500 => "Internal server error".to_string(),
            _ if !fallback.is_empty() => fallback.to_string(),
            _ => "Network connection failure".to_string(),
        };
        ApiError::Status { status, message }
    }

    /// What to show the user, if anything. Canceled requests stay silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ApiError::Canceled => None,
            ApiError::Status { message, .. } => Some(message.clone()),
            ApiError::Transport(message) if message.is_empty() => Some("Request failed".to_string()),
            ApiError::Transport(message) => Some(message.clone()),
            ApiError::Decode(_) => Some("Request failed".to_string()),
            ApiError::SessionExpired { message } => Some(message.clone()),
            ApiError::Business { message, .. } => Some(message.clone()),
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, ApiError::Canceled)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ApiError::from_status(status.as_u16(), &err.to_string());
        }
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        ApiError::Transport(err.to_string())
    }
}
