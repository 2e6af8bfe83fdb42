//! Catalog and assistant service clients
//!
//! The runtime talks to its collaborators through the traits in
//! [`crate::runtime`]; this module provides the HTTP implementation and a
//! logging wrapper.

mod error;
mod http;
pub mod types;

pub use error::ServiceError;
#[cfg(test)]
pub use error::ServiceErrorKind;
pub use http::HttpServiceClient;
pub use types::ChatRequest;

use crate::runtime::{AssistantClient, CatalogClient};
use async_trait::async_trait;
use std::time::Instant;

/// Logging wrapper for service clients
pub struct LoggingClient<T> {
    inner: T,
}

impl<T> LoggingClient<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: CatalogClient> CatalogClient for LoggingClient<T> {
    async fn fetch_titles(&self) -> Result<Vec<String>, ServiceError> {
        let start = Instant::now();
        let result = self.inner.fetch_titles().await;
        let duration = start.elapsed();

        match &result {
            Ok(titles) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    count = titles.len(),
                    "Catalog fetch completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Catalog fetch failed"
                );
            }
        }

        result
    }
}

#[async_trait]
impl<T: AssistantClient> AssistantClient for LoggingClient<T> {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        let start = Instant::now();
        let result = self.inner.chat(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    topic = %request.topic,
                    duration_ms = %duration.as_millis(),
                    reply_chars = reply.chars().count(),
                    "Assistant request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    topic = %request.topic,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Assistant request failed"
                );
            }
        }

        result
    }
}
