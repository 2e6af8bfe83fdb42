//! Key handling and the bits of UI state that live outside the session

use crate::prompt::PromptAction;
use crate::runtime::{AssistantClient, CatalogClient, SessionRuntime, SubmitOutcome};
use crate::session::{Event, ValidationError};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const SCROLL_STEP: u16 = 5;

pub struct App<A, C>
where
    A: AssistantClient + 'static,
    C: CatalogClient + 'static,
{
    runtime: SessionRuntime<A, C>,
    input: String,
    /// Validation message shown under the input box
    feedback: Option<String>,
    /// Lines scrolled up from the bottom of the history
    scroll: u16,
    should_quit: bool,
}

impl<A, C> App<A, C>
where
    A: AssistantClient + 'static,
    C: CatalogClient + 'static,
{
    pub fn new(runtime: SessionRuntime<A, C>) -> Self {
        Self {
            runtime,
            input: String::new(),
            feedback: None,
            scroll: 0,
            should_quit: false,
        }
    }

    pub fn runtime(&self) -> &SessionRuntime<A, C> {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut SessionRuntime<A, C> {
        &mut self.runtime
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Start (or retry) the catalog load. A load already running or done is
    /// left alone.
    pub fn load_catalog(&mut self) {
        if let Err(e) = self.runtime.load_catalog() {
            tracing::debug!(reason = %e, "Catalog load not started");
        }
    }

    pub fn on_completion(&mut self, event: Event) {
        self.runtime.apply(event);
        if let Some(text) = self.runtime.take_restored_input() {
            if self.input.is_empty() {
                self.input = text;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Enter => self.submit_input(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Tab => self.cycle_topic(true),
            KeyCode::BackTab => self.cycle_topic(false),
            KeyCode::F(2) => self.run_action(PromptAction::FullText),
            KeyCode::F(3) => self.run_action(PromptAction::DiscussionQuestions),
            KeyCode::F(5) => self.load_catalog(),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_add(SCROLL_STEP),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(SCROLL_STEP),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.input.push(c);
            }
            _ => {}
        }
    }

    fn submit_input(&mut self) {
        if self.handle_outcome(&self.input.clone()) {
            self.input.clear();
        }
    }

    fn run_action(&mut self, action: PromptAction) {
        let Some(topic) = self.runtime.state().selected_topic().cloned() else {
            self.feedback = Some(ValidationError::NoTopicSelected.to_string());
            return;
        };
        self.handle_outcome(&action.prompt(&topic));
    }

    /// Submit `text` and update feedback. Returns true if it was accepted.
    fn handle_outcome(&mut self, text: &str) -> bool {
        match self.runtime.submit(text) {
            SubmitOutcome::Accepted(_) => {
                self.feedback = None;
                self.scroll = 0;
                true
            }
            SubmitOutcome::Busy => false,
            SubmitOutcome::Rejected(reason) => {
                self.feedback = Some(reason.to_string());
                false
            }
        }
    }

    fn cycle_topic(&mut self, forward: bool) {
        let view = self.runtime.view();
        if !view.can_select_topic {
            return;
        }
        let len = view.topics.len();
        let current = view
            .selected_topic
            .as_ref()
            .and_then(|selected| view.topics.iter().position(|t| t == selected));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, _) => 0,
        };
        match self.runtime.select_topic(view.topics[next].as_str()) {
            Ok(()) => self.feedback = None,
            Err(e) => tracing::debug!(reason = %e, "Topic change rejected"),
        }
    }
}
