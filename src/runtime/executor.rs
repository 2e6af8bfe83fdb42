//! Session runtime executor

use super::traits::{AssistantClient, CatalogClient};

use crate::service::{ChatRequest, ServiceError};
use crate::session::{
    transition, Effect, Event, RequestId, SessionContext, SessionState, TransitionError,
    ValidationError,
};
use crate::view::{self, ViewState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Result of handing a prompt to the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Optimistic message appended and request dispatched
    Accepted(RequestId),
    /// A reply is still pending; nothing happened
    Busy,
    /// Input problem to show next to the input box; nothing was sent
    Rejected(ValidationError),
}

/// Generic session runtime that can work with any assistant and catalog
/// implementation
pub struct SessionRuntime<A, C>
where
    A: AssistantClient + 'static,
    C: CatalogClient + 'static,
{
    context: SessionContext,
    state: SessionState,
    assistant: Arc<A>,
    catalog: Arc<C>,
    /// Background tasks report their outcome here
    completion_tx: mpsc::Sender<Event>,
    completion_rx: mpsc::Receiver<Event>,
    /// Optional deadline for assistant requests
    request_timeout: Option<Duration>,
    /// Cancels outstanding network tasks when the session ends
    shutdown: CancellationToken,
    /// Prompt text handed back after a failed turn
    restored_input: Option<String>,
}

impl<A, C> SessionRuntime<A, C>
where
    A: AssistantClient + 'static,
    C: CatalogClient + 'static,
{
    pub fn new(context: SessionContext, assistant: A, catalog: C) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(32);
        Self {
            context,
            state: SessionState::default(),
            assistant: Arc::new(assistant),
            catalog: Arc::new(catalog),
            completion_tx,
            completion_rx,
            request_timeout: None,
            shutdown: CancellationToken::new(),
            restored_input: None,
        }
    }

    /// Fail assistant requests that take longer than `timeout`
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> ViewState {
        view::derive(&self.state)
    }

    /// Take the prompt text of the last failed turn, if it was handed back
    pub fn take_restored_input(&mut self) -> Option<String> {
        self.restored_input.take()
    }

    /// Start the one-time catalog load (or retry after a failed one)
    pub fn load_catalog(&mut self) -> Result<(), TransitionError> {
        self.dispatch(Event::CatalogRequested)
    }

    pub fn select_topic(&mut self, title: &str) -> Result<(), TransitionError> {
        self.dispatch(Event::TopicSelected {
            title: title.to_string(),
        })
    }

    /// Single entry point for prompts, typed or templated
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        match self.dispatch(Event::PromptSubmitted {
            text: text.to_string(),
        }) {
            Ok(()) => self
                .state
                .pending_request()
                .map_or(SubmitOutcome::Busy, |handle| SubmitOutcome::Accepted(handle.id)),
            Err(TransitionError::Invalid(reason)) => {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    reason = %reason,
                    "Prompt rejected"
                );
                SubmitOutcome::Rejected(reason)
            }
            Err(TransitionError::RequestPending) => {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    "Ignoring prompt while a reply is pending"
                );
                SubmitOutcome::Busy
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unexpected prompt rejection");
                SubmitOutcome::Busy
            }
        }
    }

    /// Wait for the next background task to report back.
    ///
    /// Pends forever when nothing is in flight, which makes it usable as a
    /// `tokio::select!` branch.
    pub async fn recv_completion(&mut self) -> Option<Event> {
        self.completion_rx.recv().await
    }

    /// Apply a completion reported by a background task
    pub fn apply(&mut self, event: Event) {
        match self.dispatch(event) {
            Ok(()) => {}
            Err(TransitionError::StaleCompletion { handle_id }) => {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    request_id = %handle_id,
                    "Discarding stale completion"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    error = %e,
                    "Completion rejected"
                );
            }
        }
    }

    /// Wait for one completion and apply it. Returns false if the channel
    /// closed.
    #[cfg(test)]
    pub async fn settle(&mut self) -> bool {
        match self.recv_completion().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, event: Event) -> Result<(), TransitionError> {
        let name = event.name();
        let result = transition(&self.state, &self.context, event)?;
        self.state = result.new_state;
        tracing::debug!(session_id = %self.context.session_id, event = name, "Applied event");

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    /// Execute an effect. Network effects are spawned as background tasks.
    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchCatalog => {
                let catalog = Arc::clone(&self.catalog);
                let tx = self.completion_tx.clone();
                let cancel = self.shutdown.child_token();

                tracing::info!(session_id = %self.context.session_id, "Loading poem titles");
                tokio::spawn(async move {
                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => {
                            tracing::debug!("Catalog load abandoned");
                        }

                        result = catalog.fetch_titles() => {
                            let event = match result {
                                Ok(titles) => Event::CatalogLoaded { titles },
                                Err(e) => Event::CatalogFailed { message: e.message },
                            };
                            let _ = tx.send(event).await;
                        }
                    }
                });
            }

            Effect::SendPrompt {
                handle_id,
                prompt,
                topic,
            } => {
                let assistant = Arc::clone(&self.assistant);
                let tx = self.completion_tx.clone();
                let cancel = self.shutdown.child_token();
                let timeout = self.request_timeout;
                let request = ChatRequest::new(prompt, topic.as_str());

                tracing::info!(
                    session_id = %self.context.session_id,
                    request_id = %handle_id,
                    topic = %topic,
                    "Sending prompt"
                );
                tokio::spawn(async move {
                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => {
                            tracing::debug!(request_id = %handle_id, "Assistant request abandoned");
                        }

                        result = call_assistant(assistant.as_ref(), &request, timeout) => {
                            let event = match result {
                                Ok(reply) => Event::ReplyReceived { handle_id, reply },
                                Err(e) => Event::RequestFailed {
                                    handle_id,
                                    error: e.into(),
                                },
                            };
                            let _ = tx.send(event).await;
                        }
                    }
                });
            }

            Effect::RestoreInput { text } => {
                self.restored_input = Some(text);
            }
        }
    }
}

impl<A, C> Drop for SessionRuntime<A, C>
where
    A: AssistantClient + 'static,
    C: CatalogClient + 'static,
{
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Run one assistant call, turning an expired deadline into a failure.
/// The timed-out call is dropped, so its response can never arrive.
async fn call_assistant<A: AssistantClient + ?Sized>(
    assistant: &A,
    request: &ChatRequest,
    timeout: Option<Duration>,
) -> Result<String, ServiceError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, assistant.chat(request))
            .await
            .unwrap_or_else(|_| {
                Err(ServiceError::timed_out(format!(
                    "No reply within {limit:?}"
                )))
            }),
        None => assistant.chat(request).await,
    }
}
