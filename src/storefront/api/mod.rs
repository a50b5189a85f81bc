// storefront/api/mod.rs - Collaborator seam for the search and AI backends
//
// The orchestrator and the HTTP handlers only see `GiftBackend`; the real
// implementation talks HTTP (`client`), tests plug in scripted fakes.

use async_trait::async_trait;

use crate::storefront::model::{AiRecommendResponse, SearchRequest, SearchResult};

pub mod client;

#[cfg(feature = "server")]
pub mod handlers;

pub use client::BackendClient;

/// Errors from calls to the external backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend did not answer within the configured timeout
    #[error("backend request timed out")]
    Timeout,

    /// The HTTP request itself failed (network, DNS, TLS, etc.)
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The backend returned a non-2xx status code
    #[error("backend error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The body was not the expected JSON
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(err)
        }
    }
}

/// The external catalog services the storefront consumes
#[async_trait]
pub trait GiftBackend: Send + Sync {
    /// `GET <base>/search`
    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ApiError>;

    /// `POST <base>/ai/fast-recommend`
    async fn recommend(&self, user_input: &str) -> Result<AiRecommendResponse, ApiError>;

    /// AI consultation with the failure folded into an empty answer
    async fn recommend_or_empty(&self, user_input: &str) -> AiRecommendResponse {
        match self.recommend(user_input).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "AI recommendation failed, returning empty result");
                AiRecommendResponse::default()
            }
        }
    }
}
