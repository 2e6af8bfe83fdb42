//! Events that can occur in a session

use crate::session::state::{ErrorInfo, RequestId};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Catalog events
    CatalogRequested,
    CatalogLoaded {
        titles: Vec<String>,
    },
    CatalogFailed {
        message: String,
    },

    // User events
    TopicSelected {
        title: String,
    },
    PromptSubmitted {
        text: String,
    },

    // Assistant events
    ReplyReceived {
        handle_id: RequestId,
        reply: String,
    },
    RequestFailed {
        handle_id: RequestId,
        error: ErrorInfo,
    },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::CatalogRequested => "catalog_requested",
            Event::CatalogLoaded { .. } => "catalog_loaded",
            Event::CatalogFailed { .. } => "catalog_failed",
            Event::TopicSelected { .. } => "topic_selected",
            Event::PromptSubmitted { .. } => "prompt_submitted",
            Event::ReplyReceived { .. } => "reply_received",
            Event::RequestFailed { .. } => "request_failed",
        }
    }
}
