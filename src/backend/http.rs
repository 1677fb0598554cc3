use crate::backend::traits::{BackendApi, ForwardRequest};
use crate::config::Config;
use crate::error::AppError;
use crate::models::{LoginRequest, RegisterRequest, TokenPair};
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::Method;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Backend client speaking JSON over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.backend_timeout)
            .user_agent(concat!("portman/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> Result<Value, AppError> {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        read_json(request.send().await?).await
    }
}

/// Parse a backend response, translating non-2xx statuses
async fn read_json(response: Response) -> Result<Value, AppError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) if status.is_success() => {
                return Err(AppError::Backend(format!("invalid JSON from backend: {e}")));
            }
            Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    };

    if status.is_success() {
        Ok(body)
    } else {
        warn!("Backend returned status: {}", status);
        Err(AppError::from_backend_status(status.as_u16(), &body))
    }
}

fn token_pair(value: Value) -> Result<TokenPair, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Backend(format!("malformed token pair: {e}")))
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn login(&self, credentials: &LoginRequest) -> Result<TokenPair, AppError> {
        debug!("Logging in {}", credentials.email);
        let body = serde_json::to_value(credentials).map_err(|e| AppError::Internal(e.to_string()))?;
        token_pair(self.post_json("/auth/login", body, None).await?)
    }

    async fn register(&self, account: &RegisterRequest) -> Result<Value, AppError> {
        let body = serde_json::to_value(account).map_err(|e| AppError::Internal(e.to_string()))?;
        self.post_json("/auth/register", body, None).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        debug!("Refreshing session");
        token_pair(
            self.post_json("/auth/refresh", json!({ "refreshToken": refresh_token }), None)
                .await?,
        )
    }

    async fn logout(&self, access_token: &str) -> Result<(), AppError> {
        self.post_json("/auth/logout", Value::Null, Some(access_token))
            .await
            .map(|_| ())
    }

    async fn forward(&self, request: ForwardRequest) -> Result<Value, AppError> {
        debug!("Forwarding {} {}", request.method, request.path);

        let mut builder = self.client.request(request.method.clone(), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        match &request.body {
            Some(body) => builder = builder.json(body),
            None if request.method == Method::POST || request.method == Method::PUT => {
                builder = builder.json(&Value::Null)
            }
            None => {}
        }

        read_json(builder.send().await?).await
    }
}
