//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the runtime with mock implementations.

use crate::service::{ChatRequest, ServiceError};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for the assistant service
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Send one prompt and return the reply text
    async fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError>;
}

/// Client for the topic catalog
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the ordered list of poem titles
    async fn fetch_titles(&self) -> Result<Vec<String>, ServiceError>;
}

// ============================================================================
// Arc implementations for shared clients
// ============================================================================

#[async_trait]
impl<T: AssistantClient + ?Sized> AssistantClient for Arc<T> {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        (**self).chat(request).await
    }
}

#[async_trait]
impl<T: CatalogClient + ?Sized> CatalogClient for Arc<T> {
    async fn fetch_titles(&self) -> Result<Vec<String>, ServiceError> {
        (**self).fetch_titles().await
    }
}
