//! Read-only projection of the session for whatever is drawing it

use crate::session::{CatalogStatus, ErrorInfo, Message, SessionState, Topic};

/// What the status area should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusBanner {
    Idle,
    LoadingTopics,
    AwaitingReply,
    Error(ErrorInfo),
}

/// Everything a presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub can_submit: bool,
    pub can_select_topic: bool,
    pub status_banner: StatusBanner,
    pub visible_history: Vec<Message>,
    pub topics: Vec<Topic>,
    pub selected_topic: Option<Topic>,
}

/// Derive the view from the current session state. Pure; never mutates.
pub fn derive(state: &SessionState) -> ViewState {
    let awaiting = state.is_awaiting_reply();

    let status_banner = if awaiting {
        StatusBanner::AwaitingReply
    } else if state.catalog() == CatalogStatus::Loading {
        StatusBanner::LoadingTopics
    } else if let Some(error) = state.last_error() {
        StatusBanner::Error(error.clone())
    } else {
        StatusBanner::Idle
    };

    ViewState {
        can_submit: !awaiting && state.selected_topic().is_some(),
        can_select_topic: !awaiting && !state.topics().is_empty(),
        status_banner,
        visible_history: state.history().messages().to_vec(),
        topics: state.topics().to_vec(),
        selected_topic: state.selected_topic().cloned(),
    }
}
