//! Single-field resolver: prompt, validate, re-prompt until an answer is accepted.

use serde::{Deserialize, Serialize};

use super::validation::{accepts_email_answer, is_definite_datetime, strip_trailing_dot};
use super::{DialogInput, Effect, Prompt, PromptKind, TurnContext};

const DATE_PROMPT: &str = "On what date would you like the meeting?";
const DATE_RETRY: &str =
    "I'm sorry, for best results, please enter your meeting date including the month, day, year and time.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Date,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResolverState {
    Prompting { prompt: Prompt },
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResolver {
    pub kind: FieldKind,
    /// Used to personalise the email prompts.
    pub attendee: Option<String>,
    pub state: ResolverState,
}

impl FieldResolver {
    pub fn date() -> Self {
        Self {
            kind: FieldKind::Date,
            attendee: None,
            state: ResolverState::Terminal,
        }
    }

    pub fn email(attendee: Option<String>) -> Self {
        Self {
            kind: FieldKind::Email,
            attendee,
            state: ResolverState::Terminal,
        }
    }

    /// Entry transition with an optional already-known value.
    ///
    /// A definite date candidate is accepted as is. An email candidate always
    /// goes through the answer validator, so a tolerated trailing dot is
    /// stripped on the way out.
    pub fn begin(self, candidate: Option<&str>, ctx: &TurnContext<'_>) -> (Self, Effect<String>) {
        let candidate = candidate.filter(|c| !c.trim().is_empty());
        match (self.kind, candidate) {
            (FieldKind::Date, None) => {
                let prompt = Prompt::new(PromptKind::DateTime, DATE_PROMPT).with_retry(DATE_RETRY);
                self.prompting(prompt)
            }
            (FieldKind::Date, Some(timex)) if is_definite_datetime(timex) => {
                (self.terminal(), Effect::Complete(timex.to_string()))
            }
            (FieldKind::Date, Some(_)) => {
                self.prompting(Prompt::new(PromptKind::DateTime, DATE_RETRY))
            }
            (FieldKind::Email, None) => {
                let prompt = self.email_prompt();
                self.prompting(prompt)
            }
            (FieldKind::Email, Some(email)) => match self.accept(email, ctx) {
                Some(value) => (self.terminal(), Effect::Complete(value)),
                None => {
                    let prompt = self.email_prompt();
                    self.prompting(prompt)
                }
            },
        }
    }

    pub fn transition(self, input: DialogInput, ctx: &TurnContext<'_>) -> (Self, Effect<String>) {
        let (prompt, answer) = match (self.state.clone(), input) {
            (ResolverState::Prompting { prompt }, DialogInput::Utterance(answer)) => (prompt, answer),
            (_, input) => {
                tracing::warn!(kind = ?self.kind, input = ?input, "resolver received input it cannot handle");
                return (self.terminal(), Effect::Cancel);
            }
        };

        match self.accept(&answer, ctx) {
            Some(value) => {
                tracing::debug!(kind = ?self.kind, "resolver accepted answer");
                (self.terminal(), Effect::Complete(value))
            }
            None => {
                tracing::debug!(kind = ?self.kind, "resolver rejected answer, re-prompting");
                (self, Effect::Prompt(prompt.reprompt()))
            }
        }
    }

    /// Runs the acceptance predicate and, on success, the terminal extraction.
    fn accept(&self, answer: &str, ctx: &TurnContext<'_>) -> Option<String> {
        match self.kind {
            FieldKind::Date => ctx
                .recognizer
                .recognize(answer, ctx.now)
                .into_iter()
                .next()
                .filter(|timex| is_definite_datetime(timex)),
            FieldKind::Email => {
                accepts_email_answer(answer).then(|| strip_trailing_dot(answer).to_string())
            }
        }
    }

    fn email_prompt(&self) -> Prompt {
        let attendee = self.attendee.as_deref().unwrap_or("your attendee");
        Prompt::new(
            PromptKind::Email,
            format!("What is the email address for {attendee}?"),
        )
        .with_retry(format!("I'm sorry, I need a valid email for {attendee}."))
    }

    fn prompting(mut self, prompt: Prompt) -> (Self, Effect<String>) {
        self.state = ResolverState::Prompting {
            prompt: prompt.clone(),
        };
        (self, Effect::Prompt(prompt))
    }

    fn terminal(mut self) -> Self {
        self.state = ResolverState::Terminal;
        self
    }
}
