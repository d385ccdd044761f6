//! HTTP client for communicating with the repodesk REST API

use crate::backend::{Backend, ErrorBody, ListEnvelope, SLOTS_PATH, SlotsEnvelope, WirePage};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use repodesk_core::config::ApiConfig;
use repodesk_core::{BookingSlot, ListQuery};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// API client for making HTTP requests to the admin API server
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client with reqwest defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Create a client from configuration, applying the request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the bearer token for authentication
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base URL endpoint paths are appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> ApiResult<Response> {
        let mut request = request.header(reqwest::header::ACCEPT, "application/json");

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Failed to {}: {}", what, e);
            ApiError::Http(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

        match body.errors {
            Some(errors) if !errors.is_empty() => {
                debug!("{} rejected with {} field error(s)", what, errors.len());
                Err(ApiError::Validation(errors))
            }
            _ => {
                let message = body.message.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                });
                warn!("Failed to {}: API returned {}", what, status);
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch_page(&self, path: &str, query: &ListQuery) -> ApiResult<WirePage> {
        let page = query.page.to_string();
        let request = self
            .client
            .get(self.url(path))
            .query(&[("page", page.as_str()), ("filter", query.filter.as_str())]);

        let response = self.send(request, "fetch page").await?;
        let envelope: ListEnvelope = Self::json(response).await?;
        Ok(envelope.data)
    }

    async fn fetch_slots(&self, date: NaiveDate) -> ApiResult<Vec<BookingSlot>> {
        let date = date.format("%Y-%m-%d").to_string();
        let request = self
            .client
            .get(self.url(SLOTS_PATH))
            .query(&[("date", date.as_str())]);

        let response = self.send(request, "fetch available slots").await?;
        let envelope: SlotsEnvelope = Self::json(response).await?;
        Ok(envelope.data.values)
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        let request = self.client.delete(self.url(path));
        self.send(request, "delete record").await?;
        Ok(())
    }

    async fn create(&self, path: &str, body: &serde_json::Value) -> ApiResult<serde_json::Value> {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.send(request, "create record").await?;
        lenient_json(response).await
    }

    async fn update(&self, path: &str, body: &serde_json::Value) -> ApiResult<serde_json::Value> {
        let request = self.client.put(self.url(path)).json(body);
        let response = self.send(request, "update record").await?;
        lenient_json(response).await
    }
}

/// Mutation responses are only informative; an empty or non-JSON body still counts as success
async fn lenient_json(response: Response) -> ApiResult<serde_json::Value> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}
