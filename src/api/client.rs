//! Blocking HTTP client speaking the `ResOp` envelope.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::model::{CODE_OK, CODE_SESSION_EXPIRED, ResOp};

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired, please log in again";

/// Per-request behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Return only the envelope's `data` (true) or the whole envelope.
    pub return_result: bool,
    /// Report failures to the user.
    pub show_error: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            return_result: true,
            show_error: false,
        }
    }
}

/// Shared flag that cancels requests issued through a client.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.is_canceled() {
            return Err(ApiError::Canceled);
        }
        Ok(())
    }
}

/// Classify an envelope by its application code.
pub fn check_envelope(envelope: ResOp<Value>) -> Result<ResOp<Value>, ApiError> {
    match envelope.code {
        CODE_OK => Ok(envelope),
        CODE_SESSION_EXPIRED => Err(ApiError::SessionExpired {
            message: if envelope.msg.is_empty() {
                SESSION_EXPIRED_MESSAGE.to_string()
            } else {
                envelope.msg
            },
        }),
        code => Err(ApiError::Business {
            code,
            message: if envelope.msg.is_empty() {
                "Unknown Error".to_string()
            } else {
                envelope.msg
            },
        }),
    }
}

/// Flatten a JSON object into query pairs.
fn query_pairs(data: &Value) -> Vec<(String, String)> {
    let Some(map) = data.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

pub struct HttpClient {
    base_url: String,
    client: reqwest::blocking::Client,
    token: Option<String>,
    cancel: CancelToken,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(HttpClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
            cancel: CancelToken::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.is_empty());
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn get<T: DeserializeOwned>(&self, url: &str, params: Option<Value>) -> Result<T, ApiError> {
        self.request(Method::GET, url, params, RequestOptions::default())
    }

    pub fn post<T: DeserializeOwned>(&self, url: &str, data: Option<Value>) -> Result<T, ApiError> {
        self.request(Method::POST, url, data, RequestOptions::default())
    }

    /// GET sends `data` as query parameters, other methods as a JSON body.
    pub fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let result = self.exchange(method, url, data, options);
        if let Err(e) = &result {
            if options.show_error {
                if let Some(message) = e.user_message() {
                    tracing::error!("{}", message);
                }
            }
        }
        result
    }

    fn exchange<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.cancel.check()?;

        let full_url = format!("{}/{}", self.base_url, url.trim_start_matches('/'));
        tracing::debug!("{} {}", method, full_url);

        let mut builder = self.client.request(method.clone(), &full_url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(data) = &data {
            builder = if method == Method::GET {
                builder.query(&query_pairs(data))
            } else {
                builder.json(data)
            };
        }

        let response = builder.send()?;
        self.cancel.check()?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), reason));
        }

        let envelope: ResOp<Value> = response.json()?;
        let envelope = check_envelope(envelope)?;

        let payload = if options.return_result {
            envelope.data.unwrap_or(Value::Null)
        } else {
            serde_json::to_value(&envelope).map_err(|e| ApiError::Decode(e.to_string()))?
        };
        serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_expired_code_is_distinct() {
        let envelope = ResOp { code: 2001, msg: String::new(), data: None };
        match check_envelope(envelope) {
            Err(ApiError::SessionExpired { message }) => assert_eq!(message, SESSION_EXPIRED_MESSAGE),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn business_codes_carry_message() {
        let envelope = ResOp { code: 1003, msg: "bad captcha".to_string(), data: Some(json!(null)) };
        match check_envelope(envelope) {
            Err(ApiError::Business { code, message }) => {
                assert_eq!(code, 1003);
                assert_eq!(message, "bad captcha");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn query_pairs_skip_nulls() {
        let pairs = query_pairs(&json!({"page": 1, "name": "x", "skip": null}));
        assert_eq!(pairs, vec![("name".to_string(), "x".to_string()), ("page".to_string(), "1".to_string())]);
    }

    #[test]
    fn canceled_token_short_circuits() {
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(token.check(), Err(ApiError::Canceled)));
        token.reset();
        assert!(token.check().is_ok());
    }
}
