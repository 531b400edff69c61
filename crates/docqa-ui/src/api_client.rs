//! HTTP client for the docqa API

use std::time::Duration;

use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Client-side failures talking to the API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The API could not be reached
    #[error("{0}")]
    Connection(#[from] reqwest::Error),

    /// The API answered with a non-200 status
    #[error("{0}")]
    Status(StatusCode),

    /// The body did not have the expected shape
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Outcome of forwarding one file to `/index_pdf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Indexed,
    /// HTTP 200 but the API reported an error
    Rejected(String),
}

#[derive(Serialize)]
struct PredictBody<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct PredictResult {
    result: String,
}

#[derive(Deserialize)]
struct HealthResult {
    status: String,
}

#[derive(Deserialize)]
struct IndexResult {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// docqa API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload one document as multipart field `pdf_file`
    pub async fn index_file(&self, filename: &str, data: Vec<u8>) -> Result<UploadOutcome, ApiError> {
        let part = multipart::Part::bytes(data).file_name(filename.to_string());
        let form = multipart::Form::new().part("pdf_file", part);

        let response = self
            .client
            .post(format!("{}/index_pdf", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ApiError::Status(response.status()));
        }

        let body: IndexResult = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        if body.status == "indexed" {
            Ok(UploadOutcome::Indexed)
        } else {
            Ok(UploadOutcome::Rejected(
                body.message.unwrap_or(body.status),
            ))
        }
    }

    /// Ask a question with the chosen model
    pub async fn predict(&self, text: &str, model: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&PredictBody { text, model })
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ApiError::Status(response.status()));
        }

        let body: PredictResult = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(body.result)
    }

    /// `GET /health` status text
    pub async fn health(&self) -> Result<String, ApiError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ApiError::Status(response.status()));
        }

        let body: HealthResult = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(body.status)
    }
}
