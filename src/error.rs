use crate::api::error::ApiError;
use crate::form::validation::ValidationErrors;

/// Errors raised by the schema form engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    /// A schema update entry carried no `field` and is not a divider.
    #[error("all schema entries to update must carry a `field` (offending entry #{index})")]
    MissingField { index: usize },

    /// The underlying form instance has not been bound yet.
    #[error("form instance is not mounted")]
    NotMounted,

    /// Field-level validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A user supplied hook (submit/reset) reported failure.
    #[error("{hook} hook failed: {message}")]
    Hook { hook: &'static str, message: String },
}

/// Errors raised while turning menu trees into routes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("duplicate route name '{name}' (paths '{first}' and '{second}')")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },

    #[error("parent route '{0}' is not registered")]
    MissingParent(String),
}

/// Errors raised by the session controller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Canceled requests are not failures the user should hear about.
    pub fn is_canceled(&self) -> bool {
        matches!(self, SessionError::Api(ApiError::Canceled))
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, SessionError::Api(ApiError::SessionExpired { .. }))
    }
}

/// Errors raised by the key/value persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage entry '{key}' is not valid json: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error for the binary and the application context.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("navigation to '{0}' did not settle")]
    RedirectLoop(String),

    #[error("no route matches '{0}'")]
    NoRoute(String),
}
