//! Session state types

use crate::markup::single_line;
use std::fmt;

// ============================================================================
// Topics
// ============================================================================

/// A selectable subject of conversation (a poem title)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    #[cfg(test)]
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turn raw catalog titles into the session's topic set.
///
/// Keeps catalog order, drops blank titles and keeps only the first
/// occurrence of a repeated title. Control characters are made visible so a
/// title cannot drive the terminal.
pub fn normalize_topics(titles: Vec<String>) -> Vec<Topic> {
    let mut topics: Vec<Topic> = Vec::with_capacity(titles.len());
    for raw in titles {
        let title = single_line(&raw);
        if title.trim().is_empty() {
            continue;
        }
        if topics.iter().any(|t| t.as_str() == title) {
            continue;
        }
        topics.push(Topic(title));
    }
    topics
}

// ============================================================================
// Messages and history
// ============================================================================

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation history. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub body: String,
    pub sequence: u64,
}

/// Ordered message history, append-only except for rollback of the
/// optimistic user message of a failed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    next_sequence: u64,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            next_sequence: 1,
        }
    }
}

impl ConversationHistory {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Sequence number the next appended message will receive
    #[cfg(test)]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Append a message and return its sequence number
    pub(super) fn push(&mut self, role: Role, body: impl Into<String>) -> u64 {
        let sequence = self.next_sequence;
        self.messages.push(Message {
            role,
            body: body.into(),
            sequence,
        });
        self.next_sequence += 1;
        sequence
    }

    /// Remove the most recent message if it carries `sequence`.
    ///
    /// The rolled-back message never committed, so its sequence number is
    /// handed out again to the next message. Committed sequence numbers are
    /// never reused.
    pub(super) fn rollback(&mut self, sequence: u64) -> Option<Message> {
        if self.messages.last().map(|m| m.sequence) != Some(sequence) {
            return None;
        }
        let removed = self.messages.pop()?;
        self.next_sequence = removed.sequence;
        Some(removed)
    }
}

// ============================================================================
// Requests and errors
// ============================================================================

/// Identifier of one assistant request. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// The single in-flight request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHandle {
    pub id: RequestId,
    pub prompt_text: String,
    pub submitted_at_sequence: u64,
}

/// Error classification for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CatalogLoad,
    Network,
    ServerStatus,
    MalformedReply,
    TimedOut,
}

/// Error shown to the user in the status banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn catalog_load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CatalogLoad, message)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Progress of the one-time catalog load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogStatus {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    /// Last attempt failed; a new load may be requested
    Failed,
}

/// The single source of truth for a running client.
///
/// Only [`transition`](super::transition) produces new values; everything
/// else reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub(super) topics: Vec<Topic>,
    pub(super) selected_topic: Option<Topic>,
    pub(super) history: ConversationHistory,
    pub(super) pending_request: Option<RequestHandle>,
    pub(super) last_error: Option<ErrorInfo>,
    pub(super) catalog: CatalogStatus,
    pub(super) next_request_id: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            selected_topic: None,
            history: ConversationHistory::default(),
            pending_request: None,
            last_error: None,
            catalog: CatalogStatus::NotLoaded,
            next_request_id: 1,
        }
    }
}

impl SessionState {
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn selected_topic(&self) -> Option<&Topic> {
        self.selected_topic.as_ref()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn pending_request(&self) -> Option<&RequestHandle> {
        self.pending_request.as_ref()
    }

    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    pub fn catalog(&self) -> CatalogStatus {
        self.catalog
    }

    /// Check if a request is in flight
    pub fn is_awaiting_reply(&self) -> bool {
        self.pending_request.is_some()
    }

    pub(super) fn find_topic(&self, title: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.as_str() == title)
    }
}

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Put the prompt text of a failed turn back into the input box
    pub restore_input_on_failure: bool,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            restore_input_on_failure: false,
        }
    }

    #[must_use]
    pub fn with_restore_input(mut self, restore: bool) -> Self {
        self.restore_input_on_failure = restore;
        self
    }
}
