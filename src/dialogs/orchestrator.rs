//! Dialog stack driver.
//!
//! Holds the suspended dialogs of one conversation between turns, routes user
//! input to the top of the stack, starts delegated sub-dialogs and resumes
//! parents with their results. The whole stack serializes into the session row.

use serde::{Deserialize, Serialize};

use super::booking::BookingWaterfall;
use super::resolver::{FieldKind, FieldResolver};
use super::{Delegation, DialogInput, Effect, Prompt, TurnContext};
use crate::models::booking::BookingDetails;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dialog", rename_all = "snake_case")]
pub enum DialogFrame {
    Booking(BookingWaterfall),
    Resolver(FieldResolver),
}

/// How a dialog ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Completion {
    Field(String),
    Booking(BookingDetails),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The conversation waits for the user to answer this prompt.
    Prompting(Prompt),
    Completed(BookingDetails),
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogStack {
    frames: Vec<DialogFrame>,
    /// The prompt the user was last asked, re-sent on help.
    pending_prompt: Option<Prompt>,
}

impl DialogFrame {
    fn transition(self, input: DialogInput, ctx: &TurnContext<'_>) -> (Self, Effect<Completion>) {
        match self {
            DialogFrame::Booking(waterfall) => {
                let (waterfall, effect) = waterfall.transition(input, ctx);
                (DialogFrame::Booking(waterfall), effect.map(Completion::Booking))
            }
            DialogFrame::Resolver(resolver) => {
                let (resolver, effect) = resolver.transition(input, ctx);
                (DialogFrame::Resolver(resolver), effect.map(Completion::Field))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DialogFrame::Booking(_) => "booking",
            DialogFrame::Resolver(r) => match r.kind {
                FieldKind::Date => "date_resolver",
                FieldKind::Email => "email_resolver",
            },
        }
    }
}

impl DialogStack {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[DialogFrame] {
        &self.frames
    }

    pub fn pending_prompt(&self) -> Option<&Prompt> {
        self.pending_prompt.as_ref()
    }

    /// The record held by the booking waterfall, if one is running.
    pub fn booking(&self) -> Option<&BookingDetails> {
        self.frames.iter().find_map(|frame| match frame {
            DialogFrame::Booking(waterfall) => Some(&waterfall.details),
            DialogFrame::Resolver(_) => None,
        })
    }

    /// Starts a booking waterfall with the given options on an empty stack.
    pub fn begin(&mut self, options: BookingDetails, ctx: &TurnContext<'_>) -> TurnOutcome {
        self.frames.clear();
        self.pending_prompt = None;
        self.frames
            .push(DialogFrame::Booking(BookingWaterfall::new(options)));
        self.drive(DialogInput::Begin, ctx)
    }

    /// Feeds a user message to the dialog on top of the stack.
    pub fn continue_with(&mut self, text: &str, ctx: &TurnContext<'_>) -> TurnOutcome {
        if self.frames.is_empty() {
            tracing::warn!("user input with no active dialog");
            return TurnOutcome::Cancelled;
        }
        self.drive(DialogInput::Utterance(text.to_string()), ctx)
    }

    /// Unwinds every dialog with no result.
    pub fn cancel_all(&mut self) -> TurnOutcome {
        tracing::info!(depth = self.frames.len(), "cancelling all dialogs");
        self.frames.clear();
        self.pending_prompt = None;
        TurnOutcome::Cancelled
    }

    fn drive(&mut self, mut input: DialogInput, ctx: &TurnContext<'_>) -> TurnOutcome {
        loop {
            let Some(frame) = self.frames.pop() else {
                return TurnOutcome::Cancelled;
            };
            let name = frame.name();
            let (frame, effect) = frame.transition(input, ctx);

            match effect {
                Effect::Prompt(prompt) => {
                    self.frames.push(frame);
                    self.pending_prompt = Some(prompt.clone());
                    return TurnOutcome::Prompting(prompt);
                }
                Effect::Delegate(delegation) => {
                    tracing::debug!(parent = name, delegation = ?delegation, "starting sub-dialog");
                    self.frames.push(frame);
                    let (child, effect) = start_resolver(delegation, ctx);
                    match effect {
                        Effect::Prompt(prompt) => {
                            self.frames.push(DialogFrame::Resolver(child));
                            self.pending_prompt = Some(prompt.clone());
                            return TurnOutcome::Prompting(prompt);
                        }
                        Effect::Complete(value) => input = DialogInput::Resumed(Some(value)),
                        Effect::Cancel | Effect::Delegate(_) => input = DialogInput::Resumed(None),
                    }
                }
                Effect::Complete(completion) => {
                    tracing::debug!(dialog = name, "dialog completed");
                    if self.frames.is_empty() {
                        self.pending_prompt = None;
                        return match completion {
                            Completion::Booking(details) => TurnOutcome::Completed(details),
                            Completion::Field(_) => TurnOutcome::Cancelled,
                        };
                    }
                    input = match completion {
                        Completion::Field(value) => DialogInput::Resumed(Some(value)),
                        Completion::Booking(_) => DialogInput::Resumed(None),
                    };
                }
                Effect::Cancel => {
                    tracing::debug!(dialog = name, "dialog ended with no result");
                    if self.frames.is_empty() {
                        self.pending_prompt = None;
                        return TurnOutcome::Cancelled;
                    }
                    input = DialogInput::Resumed(None);
                }
            }
        }
    }
}

fn start_resolver(delegation: Delegation, ctx: &TurnContext<'_>) -> (FieldResolver, Effect<String>) {
    match delegation {
        Delegation::DateResolver { candidate } => {
            FieldResolver::date().begin(candidate.as_deref(), ctx)
        }
        Delegation::EmailResolver {
            candidate,
            attendee,
        } => FieldResolver::email(attendee).begin(candidate.as_deref(), ctx),
    }
}
