//! Canned prompts behind the action keys

use crate::session::Topic;

/// One-key prompts for the selected poem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    /// Ask for the complete text of the poem
    FullText,
    /// Ask for questions to discuss the poem
    DiscussionQuestions,
}

impl PromptAction {
    /// Build the prompt for `topic`
    pub fn prompt(self, topic: &Topic) -> String {
        match self {
            PromptAction::FullText => {
                format!("Please show me the full text of \"{topic}\".")
            }
            PromptAction::DiscussionQuestions => format!(
                "Suggest five discussion questions about \"{topic}\", \
                 covering its themes, imagery and form."
            ),
        }
    }
}
