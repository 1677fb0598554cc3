use crate::error::AppError;
use crate::models::{LoginRequest, RegisterRequest, TokenPair};
use async_trait::async_trait;
use axum::http::Method;
use serde::Serialize;
use serde_json::Value;

/// A call relayed to the backend on behalf of a session
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Backend path, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub token: Option<String>,
    pub body: Option<Value>,
}

impl ForwardRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            token: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    /// Attach a JSON body; a payload that cannot be serialized is an internal error
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, AppError> {
        let value =
            serde_json::to_value(body).map_err(|e| AppError::Internal(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Operations the gateway needs from the external backend service
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Exchange credentials for a token pair
    async fn login(&self, credentials: &LoginRequest) -> Result<TokenPair, AppError>;

    async fn register(&self, account: &RegisterRequest) -> Result<Value, AppError>;

    /// Exchange a refresh token for a fresh token pair
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError>;

    async fn logout(&self, access_token: &str) -> Result<(), AppError>;

    /// Relay an authenticated data call and return the backend's JSON
    async fn forward(&self, request: ForwardRequest) -> Result<Value, AppError>;
}
