// AI collaborator boundary.
//
// The collaborator receives a correlation payload and must return a
// Classification-shaped response. Anything else - transport failure, bad
// status, schema mismatch - is an AnalysisError, and every AnalysisError
// is treated identically by the engine: fall back to the rule tables.

use async_trait::async_trait;
use causelog_core::{Classification, CorrelationResult};
use reqwest::Client;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("collaborator returned error: {0}")]
    ApiError(String),

    #[error("response failed schema validation: {0}")]
    InvalidResponse(String),

    #[error("collaborator timed out")]
    TimedOut,
}

/// The external analysis seam. Implementations must not be trusted to
/// succeed; callers always keep the deterministic fallback ready.
#[async_trait]
pub trait AnalysisCollaborator: Send + Sync {
    async fn analyze(&self, correlation: &CorrelationResult)
        -> Result<Classification, AnalysisError>;

    fn name(&self) -> &str;
}

/// HTTP collaborator posting the correlation result as JSON and expecting
/// a Classification JSON body back.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: Client,
    endpoint: String,
}

impl HttpCollaborator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisCollaborator for HttpCollaborator {
    async fn analyze(
        &self,
        correlation: &CorrelationResult,
    ) -> Result<Classification, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(correlation)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::ApiError(error_text));
        }

        let body = response.text().await?;
        parse_classification(&body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Strict schema validation of a collaborator response. Model output
/// sometimes arrives wrapped in markdown fences; strip those, then require
/// every Classification field to deserialize.
pub fn parse_classification(body: &str) -> Result<Classification, AnalysisError> {
    let cleaned = body
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str::<Classification>(cleaned)
        .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
}
