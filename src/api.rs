// src/api.rs
use crate::error::{AppError, Result};
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub const USER_HEADER: &str = "X-User-Id";
pub const DEFAULT_USER_ID: &str = "1";

/// Client-supplied user partition, sent with every backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserScope(String);

impl UserScope {
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            UserScope(DEFAULT_USER_ID.to_string())
        } else {
            UserScope(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserScope {
    fn default() -> Self {
        UserScope(DEFAULT_USER_ID.to_string())
    }
}

impl fmt::Display for UserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    user: UserScope,
}

impl ApiClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        ApiClient {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            user: UserScope::default(),
        }
    }

    /// Same connection pool, scoped to the user typed into the panel.
    pub fn for_user(&self, input: &str) -> Self {
        ApiClient {
            user: UserScope::from_input(input),
            ..self.clone()
        }
    }

    pub fn user(&self) -> &UserScope {
        &self.user
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send("GET", path, self.client.get(self.url(path))).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // `.json` also sets `Content-Type: application/json`.
        let request = self.client.post(self.url(path)).json(body);
        self.send("POST", path, request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send("DELETE", path, self.client.delete(self.url(path))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request
            .header(USER_HEADER, self.user.as_str())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!("{} {} failed: HTTP {}", method, path, status);
            return Err(AppError::Request { status, body });
        }
        debug!("{} {} -> HTTP {} (user {})", method, path, status, self.user);

        // 204 and friends carry no body at all.
        if body.trim().is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_str(&body)?)
    }
}
