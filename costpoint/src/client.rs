use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::TimeEntry;

/// Where pending time entries come from.
#[async_trait]
pub trait EntrySource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<TimeEntry>, FetchError>;
}

/// Fetches entries from the time tracking server's Costpoint endpoint.
///
/// Every call hits the server; nothing is cached and failures are not retried.
#[derive(Debug, Clone)]
pub struct HttpEntrySource {
    client: reqwest::Client,
    url: String,
}

impl HttpEntrySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::ResponseError(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl EntrySource for HttpEntrySource {
    async fn fetch_entries(&self) -> Result<Vec<TimeEntry>, FetchError> {
        debug!(url = %self.url, "Fetching time entries");

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::ResponseError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let entries = resp.json::<Vec<TimeEntry>>().await.map_err(|e| {
            FetchError::ParsingError(format!("Failed to parse response as JSON: {}", e))
        })?;

        info!(count = entries.len(), "Fetched time entries");
        Ok(entries)
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unexpected status: {0}")]
    Status(u16),
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/costpoint", addr)
    }

    #[tokio::test]
    async fn decodes_entries_from_server() {
        let router = Router::new().route(
            "/api/costpoint",
            get(|| async {
                r#"[{"charge_code":"ADMIN","hours":"7.50","date":"01/16/24"}]"#
            }),
        );
        let source = HttpEntrySource::new(serve(router).await);

        let entries = source.fetch_entries().await.unwrap();

        assert_eq!(entries, vec![TimeEntry::new("01/16/24", "ADMIN", 7.5, "")]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/api/costpoint",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let source = HttpEntrySource::new(serve(router).await);

        let err = source.fetch_entries().await.unwrap_err();

        assert!(matches!(err, FetchError::Status(500)));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parsing_error() {
        let router = Router::new().route("/api/costpoint", get(|| async { "not json" }));
        let source = HttpEntrySource::new(serve(router).await);

        let err = source.fetch_entries().await.unwrap_err();

        assert!(matches!(err, FetchError::ParsingError(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_response_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let source = HttpEntrySource::new(format!("http://{}/api/costpoint", addr));

        let err = source.fetch_entries().await.unwrap_err();

        assert!(matches!(err, FetchError::ResponseError(_)));
    }
}
