//! Slot-filling dialogs.
//!
//! Each dialog is a plain state value with a pure `transition(self, input, ctx)`
//! returning its next state and one [`Effect`]. The [`orchestrator`] keeps the
//! stack of suspended dialogs between user turns and feeds results back in.

pub mod booking;
pub mod orchestrator;
pub mod resolver;
pub mod validation;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::services::recognizer::DateTimeRecognizer;

/// Which prompt recognizer interprets the user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Text,
    Confirm,
    DateTime,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
    /// Sent instead of `text` when an answer is rejected.
    pub retry: Option<String>,
    pub expecting_input: bool,
}

impl Prompt {
    pub fn new(kind: PromptKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            retry: None,
            expecting_input: true,
        }
    }

    pub fn with_retry(mut self, retry: impl Into<String>) -> Self {
        self.retry = Some(retry.into());
        self
    }

    /// The prompt to send after a rejected answer.
    pub fn reprompt(&self) -> Self {
        let text = self.retry.clone().unwrap_or_else(|| self.text.clone());
        Self {
            kind: self.kind,
            text: text.clone(),
            retry: Some(text),
            expecting_input: true,
        }
    }
}

/// A sub-dialog the waterfall suspends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dialog", rename_all = "snake_case")]
pub enum Delegation {
    DateResolver {
        candidate: Option<String>,
    },
    EmailResolver {
        candidate: Option<String>,
        attendee: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<T> {
    /// Suspend until the user answers.
    Prompt(Prompt),
    /// Suspend until the sub-dialog ends; its result resumes this dialog.
    Delegate(Delegation),
    /// End this dialog with a result.
    Complete(T),
    /// End this dialog with no result.
    Cancel,
}

impl<T> Effect<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Effect<U> {
        match self {
            Effect::Prompt(prompt) => Effect::Prompt(prompt),
            Effect::Delegate(delegation) => Effect::Delegate(delegation),
            Effect::Complete(value) => Effect::Complete(f(value)),
            Effect::Cancel => Effect::Cancel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogInput {
    Begin,
    /// A user message answering the pending prompt.
    Utterance(String),
    /// A sub-dialog ended; `None` when it ended with no result.
    Resumed(Option<String>),
}

/// Collaborators a transition may consult.
pub struct TurnContext<'a> {
    pub now: NaiveDateTime,
    pub recognizer: &'a dyn DateTimeRecognizer,
}
