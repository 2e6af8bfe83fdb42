//! Effects produced by state transitions

use crate::session::state::{RequestId, Topic};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the topic list from the catalog service
    FetchCatalog,

    /// Send one prompt to the assistant service
    SendPrompt {
        handle_id: RequestId,
        prompt: String,
        topic: Topic,
    },

    /// Hand the prompt of a failed turn back to the input box
    RestoreInput { text: String },
}

impl Effect {
    pub fn send_prompt(handle_id: RequestId, prompt: impl Into<String>, topic: Topic) -> Self {
        Effect::SendPrompt {
            handle_id,
            prompt: prompt.into(),
            topic,
        }
    }
}
