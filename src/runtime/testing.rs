//! Mock implementations for testing
//!
//! These mocks enable integration testing of the runtime without real I/O.

use super::traits::*;
use crate::service::{ChatRequest, ServiceError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Assistant
// ============================================================================

/// Mock assistant that returns queued replies
pub struct MockAssistant {
    replies: Mutex<VecDeque<Result<String, ServiceError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: ServiceError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::network("No mock reply queued")))
    }
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantClient for MockAssistant {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        self.next_reply(request)
    }
}

// ============================================================================
// Delayed Mock Assistant (for timeout and in-flight testing)
// ============================================================================

/// Mock assistant that waits before answering
pub struct DelayedMockAssistant {
    inner: MockAssistant,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockAssistant {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockAssistant::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl AssistantClient for DelayedMockAssistant {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ServiceError> {
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply(request)
    }
}

// ============================================================================
// Mock Catalog
// ============================================================================

/// Mock catalog with queued fetch results
pub struct MockCatalog {
    results: Mutex<VecDeque<Result<Vec<String>, ServiceError>>>,
    /// Number of fetches performed
    pub fetches: Mutex<usize>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            fetches: Mutex::new(0),
        }
    }

    pub fn with_titles(titles: &[&str]) -> Self {
        let catalog = Self::new();
        catalog.queue_titles(titles);
        catalog
    }

    pub fn queue_titles(&self, titles: &[&str]) {
        self.results
            .lock()
            .unwrap()
            .push_back(Ok(titles.iter().map(ToString::to_string).collect()));
    }

    pub fn queue_error(&self, error: ServiceError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn fetch_titles(&self) -> Result<Vec<String>, ServiceError> {
        *self.fetches.lock().unwrap() += 1;
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::network("No mock catalog queued")))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{SessionRuntime, SubmitOutcome};
    use crate::service::ServiceErrorKind;
    use crate::session::{
        CatalogStatus, ErrorKind, Event, Message, Role, SessionContext, ValidationError,
    };
    use crate::view::StatusBanner;

    type TestRuntime<A> = SessionRuntime<Arc<A>, Arc<MockCatalog>>;

    fn test_context() -> SessionContext {
        SessionContext::new("test-session")
    }

    /// Runtime with the catalog already loaded
    async fn loaded_runtime<A: AssistantClient + 'static>(
        assistant: Arc<A>,
        context: SessionContext,
        titles: &[&str],
    ) -> TestRuntime<A> {
        let catalog = Arc::new(MockCatalog::with_titles(titles));
        let mut rt = SessionRuntime::new(context, assistant, catalog);
        rt.load_catalog().unwrap();
        assert!(rt.settle().await);
        assert_eq!(rt.state().catalog(), CatalogStatus::Loaded);
        rt
    }

    #[tokio::test]
    async fn test_mock_assistant() {
        let mock = MockAssistant::new();
        mock.queue_reply("Hello");

        let request = ChatRequest::new("hi", "Ode");
        assert_eq!(mock.chat(&request).await.unwrap(), "Hello");

        // Second call should fail (no more replies)
        assert!(mock.chat(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    /// End-to-end: successful turn
    #[tokio::test]
    async fn test_successful_turn() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_reply("It is about loss.");
        let mut rt = loaded_runtime(assistant.clone(), test_context(), &["Ode", "Elegy"]).await;
        assert_eq!(rt.state().selected_topic().unwrap().as_str(), "Ode");

        let outcome = rt.submit("What is this about?");
        assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
        assert_eq!(
            rt.state().history().messages(),
            &[Message {
                role: Role::User,
                body: "What is this about?".to_string(),
                sequence: 1,
            }]
        );
        assert!(rt.state().pending_request().is_some());
        assert_eq!(rt.view().status_banner, StatusBanner::AwaitingReply);

        assert!(rt.settle().await);

        let history = rt.state().history().messages();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].body, "It is about loss.");
        assert_eq!(history[1].sequence, 2);
        assert!(rt.state().pending_request().is_none());

        assert_eq!(
            assistant.recorded_requests(),
            vec![ChatRequest::new("What is this about?", "Ode")]
        );
    }

    /// End-to-end: failed turn rolls back and the retry starts at sequence 1
    #[tokio::test]
    async fn test_failed_turn_rolls_back() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_error(ServiceError::server_status(500, "Service returned 500"));
        assistant.queue_reply("It is about loss.");
        let mut rt = loaded_runtime(assistant.clone(), test_context(), &["Ode", "Elegy"]).await;

        rt.submit("What is this about?");
        assert_eq!(rt.state().history().len(), 1);
        assert!(rt.settle().await);

        assert!(rt.state().history().is_empty());
        assert!(rt.state().pending_request().is_none());
        let error = rt.state().last_error().unwrap();
        assert_eq!(error.kind, ErrorKind::ServerStatus);
        assert!(matches!(rt.view().status_banner, StatusBanner::Error(_)));
        assert!(rt.take_restored_input().is_none());

        let outcome = rt.submit("What is this about?");
        assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
        assert_eq!(rt.state().history().messages()[0].sequence, 1);
        assert!(rt.state().last_error().is_none());

        assert!(rt.settle().await);
        assert_eq!(rt.state().history().len(), 2);
    }

    /// Two immediate submits produce exactly one network call
    #[tokio::test]
    async fn test_second_submit_is_noop_while_pending() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_reply("first reply");
        let mut rt = loaded_runtime(assistant.clone(), test_context(), &["Ode"]).await;

        assert!(matches!(rt.submit("first"), SubmitOutcome::Accepted(_)));
        assert_eq!(rt.submit("second"), SubmitOutcome::Busy);
        assert_eq!(rt.state().history().len(), 1);

        assert!(rt.settle().await);

        assert_eq!(assistant.recorded_requests().len(), 1);
        let bodies: Vec<&str> = rt
            .state()
            .history()
            .messages()
            .iter()
            .map(|m| m.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["first", "first reply"]);
    }

    /// No topic wins over an empty prompt, and nothing reaches the network
    #[tokio::test]
    async fn test_validation_precedence_without_topics() {
        let assistant = Arc::new(MockAssistant::new());
        let catalog = Arc::new(MockCatalog::new());
        let mut rt = SessionRuntime::new(test_context(), assistant.clone(), catalog);

        assert_eq!(
            rt.submit(""),
            SubmitOutcome::Rejected(ValidationError::NoTopicSelected)
        );
        assert_eq!(
            rt.submit("What is this about?"),
            SubmitOutcome::Rejected(ValidationError::NoTopicSelected)
        );
        assert!(rt.state().history().is_empty());
        assert!(assistant.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_with_topic() {
        let assistant = Arc::new(MockAssistant::new());
        let mut rt = loaded_runtime(assistant.clone(), test_context(), &["Ode"]).await;

        assert_eq!(
            rt.submit("   "),
            SubmitOutcome::Rejected(ValidationError::EmptyPrompt)
        );
        assert!(assistant.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_failure_then_retry() {
        let assistant = Arc::new(MockAssistant::new());
        let catalog = Arc::new(MockCatalog::new());
        catalog.queue_error(ServiceError::network("connection refused"));
        catalog.queue_titles(&["Ode", "Elegy"]);
        let mut rt = SessionRuntime::new(test_context(), assistant, catalog.clone());

        rt.load_catalog().unwrap();
        assert_eq!(rt.view().status_banner, StatusBanner::LoadingTopics);
        assert!(rt.settle().await);

        assert_eq!(rt.state().catalog(), CatalogStatus::Failed);
        assert_eq!(rt.state().last_error().unwrap().kind, ErrorKind::CatalogLoad);
        assert!(!rt.view().can_submit);

        rt.load_catalog().unwrap();
        assert!(rt.settle().await);
        assert_eq!(rt.state().catalog(), CatalogStatus::Loaded);
        assert_eq!(rt.state().selected_topic().unwrap().as_str(), "Ode");
        assert!(rt.view().can_submit);

        // Loaded once per session
        assert!(rt.load_catalog().is_err());
        assert_eq!(catalog.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_topic_selection_locked_while_pending() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_reply("ok");
        let mut rt = loaded_runtime(assistant.clone(), test_context(), &["Ode", "Elegy"]).await;

        rt.select_topic("Elegy").unwrap();
        rt.submit("Who is mourned?");
        assert!(rt.select_topic("Ode").is_err());
        assert!(!rt.view().can_select_topic);

        assert!(rt.settle().await);
        assert_eq!(
            assistant.recorded_requests()[0],
            ChatRequest::new("Who is mourned?", "Elegy")
        );
        rt.select_topic("Ode").unwrap();
    }

    #[tokio::test]
    async fn test_restore_input_after_failure() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_error(ServiceError::network("connection reset"));
        let context = test_context().with_restore_input(true);
        let mut rt = loaded_runtime(assistant, context, &["Ode"]).await;

        rt.submit("keep this question");
        assert!(rt.settle().await);

        assert_eq!(
            rt.take_restored_input().as_deref(),
            Some("keep this question")
        );
        assert!(rt.take_restored_input().is_none());
    }

    /// A deadline expiry fails the turn like any network failure
    #[tokio::test]
    async fn test_request_timeout_fails_turn() {
        let assistant = Arc::new(DelayedMockAssistant::new(Duration::from_secs(30)));
        assistant.queue_reply("too late");
        let catalog = Arc::new(MockCatalog::with_titles(&["Ode"]));
        let mut rt = SessionRuntime::new(test_context(), assistant.clone(), catalog)
            .with_request_timeout(Some(Duration::from_millis(20)));
        rt.load_catalog().unwrap();
        assert!(rt.settle().await);

        rt.submit("hello");
        let completed = tokio::time::timeout(Duration::from_secs(5), rt.settle())
            .await
            .unwrap();
        assert!(completed);

        assert!(rt.state().history().is_empty());
        assert!(rt.state().pending_request().is_none());
        assert_eq!(rt.state().last_error().unwrap().kind, ErrorKind::TimedOut);
        // The timed-out call never got as far as taking its reply
        assert!(assistant.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_stale_completion_is_ignored() {
        let assistant = Arc::new(MockAssistant::new());
        assistant.queue_reply("real reply");
        let mut rt = loaded_runtime(assistant, test_context(), &["Ode"]).await;

        let SubmitOutcome::Accepted(handle_id) = rt.submit("hello") else {
            panic!("submit should be accepted");
        };
        let before = rt.state().clone();
        rt.apply(Event::ReplyReceived {
            handle_id: crate::session::RequestId(handle_id.0 + 7),
            reply: "from nowhere".to_string(),
        });
        assert_eq!(rt.state(), &before);

        assert!(rt.settle().await);
        assert_eq!(rt.state().history().messages()[1].body, "real reply");
    }

    #[tokio::test]
    async fn test_in_flight_request_observed_before_reply() {
        let assistant = Arc::new(DelayedMockAssistant::new(Duration::from_millis(50)));
        assistant.queue_reply("slow reply");
        let started = assistant.request_started.clone();
        let mut rt = loaded_runtime(assistant.clone(), test_context(), &["Ode"]).await;

        let notified = started.notified();
        rt.submit("hello");
        notified.await;

        assert!(rt.view().status_banner == StatusBanner::AwaitingReply);
        assert_eq!(rt.submit("again"), SubmitOutcome::Busy);

        assert!(rt.settle().await);
        assert_eq!(assistant.recorded_requests().len(), 1);
        assert_eq!(rt.view().status_banner, StatusBanner::Idle);
    }

    #[test]
    fn test_service_error_maps_to_error_info() {
        let info: crate::session::ErrorInfo = ServiceError::malformed("bad json").into();
        assert_eq!(info.kind, ErrorKind::MalformedReply);
        assert_eq!(info.message, "bad json");
        assert_eq!(
            ErrorKind::from(ServiceErrorKind::ServerStatus(502)),
            ErrorKind::ServerStatus
        );
    }
}
