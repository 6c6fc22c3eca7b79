//! HTTP client for the action-routed query endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use trail_core::{Coordinates, CreatedResponse, ErrorBody, QueryEntry, QueryStatus, UpdatedResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Creates query entries.
#[async_trait]
pub trait QuerySubmitter: Send + Sync {
    async fn create(
        &self,
        coordinates: Coordinates,
        question: &str,
        context_tag: &str,
    ) -> Result<i64, ApiError>;
}

/// Reads back a single query entry.
#[async_trait]
pub trait EntryReader: Send + Sync {
    async fn read(&self, id: i64) -> Result<QueryEntry, ApiError>;
}

#[derive(Clone)]
pub struct QueryApi {
    client: Client,
    endpoint: String,
}

impl QueryApi {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
        })
    }

    /// Writes a response and status back to an entry, as the responder does.
    pub async fn update(
        &self,
        id: i64,
        llm_response: &str,
        status: QueryStatus,
    ) -> Result<(), ApiError> {
        let id = id.to_string();
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("action", "update"),
                ("id", id.as_str()),
                ("llm_response", llm_response),
                ("status", status.as_str()),
            ])
            .send()
            .await?;

        let body: UpdatedResponse = decode(response).await?;
        if !body.success {
            return Err(ApiError::Unexpected("update reported success=false".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl QuerySubmitter for QueryApi {
    async fn create(
        &self,
        coordinates: Coordinates,
        question: &str,
        context_tag: &str,
    ) -> Result<i64, ApiError> {
        let latitude = coordinates.latitude.to_string();
        let longitude = coordinates.longitude.to_string();
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("action", "create"),
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("user_question", question),
                ("context_tag", context_tag),
            ])
            .send()
            .await?;

        let body: CreatedResponse = decode(response).await?;
        if !body.success {
            return Err(ApiError::Unexpected("create reported success=false".to_string()));
        }
        debug!("Server assigned query id {}", body.id);
        Ok(body.id)
    }
}

#[async_trait]
impl EntryReader for QueryApi {
    async fn read(&self, id: i64) -> Result<QueryEntry, ApiError> {
        let id = id.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("action", "read"), ("id", id.as_str())])
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: error_message(body),
        });
    }
    Ok(response.json().await?)
}

/// Pulls the `error` string out of a JSON error body, falling back to the raw text.
fn error_message(body: String) -> String {
    serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_json_body() {
        let body = r#"{"error":"Entry not found","code":"NOT_FOUND"}"#.to_string();
        assert_eq!(error_message(body), "Entry not found");
    }

    #[test]
    fn test_error_message_without_code() {
        let body = r#"{"error":"Missing required fields"}"#.to_string();
        assert_eq!(error_message(body), "Missing required fields");
    }

    #[test]
    fn test_error_message_plain_text() {
        assert_eq!(error_message("Bad Gateway".to_string()), "Bad Gateway");
    }

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_decode_not_found_is_server_error() {
        let err = decode::<QueryEntry>(response(
            404,
            r#"{"error":"Entry not found","code":"NOT_FOUND"}"#,
        ))
        .await
        .unwrap_err();

        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Entry not found");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_success_body() {
        let created: CreatedResponse = decode(response(200, r#"{"success":true,"id":7}"#))
            .await
            .unwrap();
        assert_eq!(
            created,
            CreatedResponse {
                success: true,
                id: 7
            }
        );
    }
}
