//! HTTP client for the gift search backend.
//!
//! Wraps `GET /search` and `POST /ai/fast-recommend` using [`reqwest`]
//! with a bounded per-request timeout.

use std::time::Duration;

use async_trait::async_trait;

use super::{ApiError, GiftBackend};
use crate::storefront::model::{AiRecommendRequest, AiRecommendResponse, SearchRequest, SearchResult};

/// Client for one backend instance
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: reqwest::Client,
    api_base: String,
}

impl BackendClient {
    /// Create a client whose every request fails with
    /// [`ApiError::Timeout`] after `timeout`.
    ///
    /// * `api_base` - Base URL, e.g. `http://localhost:8000/api/v1`.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_base))
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling)
    pub fn with_client(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { client, api_base }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, turning anything
    /// else into [`ApiError::Status`] with the body for debugging.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON body into the expected type
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl GiftBackend for BackendClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ApiError> {
        let url = self.endpoint("search");
        tracing::info!(
            url = %url,
            q = %request.q,
            sort = %request.sort,
            offset = request.offset,
            "Search request"
        );

        let started = std::time::Instant::now();
        let response = self
            .client
            .get(&url)
            .query(&request.query_pairs())
            .send()
            .await;

        let outcome = match response {
            Ok(response) => Self::parse_response::<SearchResult>(response).await,
            Err(e) => Err(ApiError::from(e)),
        };

        match &outcome {
            Ok(result) => tracing::info!(
                total = result.total,
                hits = result.items.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Search successful"
            ),
            Err(e) => tracing::error!(error = %e, "Search failed"),
        }
        outcome
    }

    async fn recommend(&self, user_input: &str) -> Result<AiRecommendResponse, ApiError> {
        let body = AiRecommendRequest {
            user_input: user_input.to_string(),
        };

        let response = self
            .client
            .post(self.endpoint("ai/fast-recommend"))
            .json(&body)
            .send()
            .await?;

        let parsed: AiRecommendResponse = Self::parse_response(response).await?;
        tracing::info!(
            recommendations = parsed.recommendations.len(),
            "AI recommendation received"
        );
        Ok(parsed)
    }
}
