//! Wire types for the catalog and assistant services

use serde::{Deserialize, Serialize};

/// Catalog endpoint, relative to the base URL
pub const CATALOG_PATH: &str = "/api/poems";

/// Chat endpoint, relative to the base URL
pub const CHAT_PATH: &str = "/api/chat";

/// Body of a chat exchange. Field names are a contract with the assistant
/// service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub topic: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            topic: topic.into(),
        }
    }
}

/// Chat response. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}
