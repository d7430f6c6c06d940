//! Backend exchanges: models, the HTTP client and the auth API.

pub mod auth;
pub mod client;
pub mod error;
pub mod model;

pub use auth::{AuthApi, HttpAuthApi, StaticAuthApi};
pub use client::{CancelToken, HttpClient, RequestOptions};
pub use error::ApiError;
