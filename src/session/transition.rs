//! Pure state transition function
//!
//! Catalog loading, topic selection, the optimistic user message of a turn
//! and its commit or rollback all happen here. Nothing in this file performs
//! I/O; network work is requested through [`Effect`]s.

use super::state::{normalize_topics, CatalogStatus, ErrorInfo, RequestHandle, RequestId, Role};
use super::{Effect, Event, SessionContext, SessionState};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Input problems reported next to the input box. Never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select a poem before sending a message")]
    NoTopicSelected,
    #[error("Type a message before sending")]
    EmptyPrompt,
    #[error("Unknown poem: {0}")]
    UnknownTopic(String),
}

/// Errors that can occur during transition. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("A reply is still pending")]
    RequestPending,
    #[error("Poem titles are already loading")]
    CatalogLoading,
    #[error("Poem titles were already loaded")]
    CatalogAlreadyLoaded,
    #[error("Stale completion for {handle_id}")]
    StaleCompletion { handle_id: RequestId },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. On `Err` the
/// caller keeps the previous state, so a rejected event is a no-op.
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Catalog loading
        // ============================================================
        Event::CatalogRequested => match state.catalog {
            CatalogStatus::Loading => Err(TransitionError::CatalogLoading),
            CatalogStatus::Loaded => Err(TransitionError::CatalogAlreadyLoaded),
            CatalogStatus::NotLoaded | CatalogStatus::Failed => {
                let mut next = state.clone();
                next.catalog = CatalogStatus::Loading;
                Ok(TransitionResult::new(next).with_effect(Effect::FetchCatalog))
            }
        },

        Event::CatalogLoaded { titles } => {
            if state.catalog != CatalogStatus::Loading {
                return Err(TransitionError::InvalidTransition(
                    "catalog result without a pending load".to_string(),
                ));
            }
            let mut next = state.clone();
            next.topics = normalize_topics(titles);
            next.selected_topic = next.topics.first().cloned();
            next.catalog = CatalogStatus::Loaded;
            next.last_error = None;
            Ok(TransitionResult::new(next))
        }

        Event::CatalogFailed { message } => {
            if state.catalog != CatalogStatus::Loading {
                return Err(TransitionError::InvalidTransition(
                    "catalog failure without a pending load".to_string(),
                ));
            }
            let mut next = state.clone();
            next.topics.clear();
            next.selected_topic = None;
            next.catalog = CatalogStatus::Failed;
            next.last_error = Some(ErrorInfo::catalog_load(message));
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Topic selection
        // ============================================================
        Event::TopicSelected { title } => {
            if state.pending_request.is_some() {
                return Err(TransitionError::RequestPending);
            }
            let topic = state
                .find_topic(&title)
                .cloned()
                .ok_or(ValidationError::UnknownTopic(title))?;
            let mut next = state.clone();
            next.selected_topic = Some(topic);
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Turn start: optimistic insert
        // ============================================================
        Event::PromptSubmitted { text } => {
            if state.pending_request.is_some() {
                return Err(TransitionError::RequestPending);
            }
            let topic = state
                .selected_topic
                .clone()
                .ok_or(ValidationError::NoTopicSelected)?;
            let prompt = text.trim();
            if prompt.is_empty() {
                return Err(ValidationError::EmptyPrompt.into());
            }

            let mut next = state.clone();
            let handle_id = RequestId(next.next_request_id);
            next.next_request_id += 1;
            let sequence = next.history.push(Role::User, prompt);
            next.pending_request = Some(RequestHandle {
                id: handle_id,
                prompt_text: prompt.to_string(),
                submitted_at_sequence: sequence,
            });
            next.last_error = None;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::send_prompt(handle_id, prompt, topic)))
        }

        // ============================================================
        // Turn end: commit or roll back
        // ============================================================
        Event::ReplyReceived { handle_id, reply } => {
            ensure_pending(state, handle_id)?;
            let mut next = state.clone();
            next.history.push(Role::Assistant, reply);
            next.pending_request = None;
            Ok(TransitionResult::new(next))
        }

        Event::RequestFailed { handle_id, error } => {
            let handle = ensure_pending(state, handle_id)?;
            let mut next = state.clone();
            next.history.rollback(handle.submitted_at_sequence);
            next.pending_request = None;
            next.last_error = Some(error);

            let result = TransitionResult::new(next);
            if context.restore_input_on_failure {
                Ok(result.with_effect(Effect::RestoreInput {
                    text: handle.prompt_text.clone(),
                }))
            } else {
                Ok(result)
            }
        }
    }
}

/// Completions only apply to the request they were issued for
fn ensure_pending(
    state: &SessionState,
    handle_id: RequestId,
) -> Result<&RequestHandle, TransitionError> {
    match &state.pending_request {
        Some(handle) if handle.id == handle_id => Ok(handle),
        _ => Err(TransitionError::StaleCompletion { handle_id }),
    }
}
