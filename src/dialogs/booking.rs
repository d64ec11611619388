//! The booking waterfall: subject, attendee, email, date, confirm.
//!
//! Each step either passes an already-known slot straight through or suspends
//! on a prompt or a resolver sub-dialog. Whatever the suspension yields is
//! captured into the record by the following step, so a cold start and a
//! prefilled conversation run through the same steps.

use serde::{Deserialize, Serialize};

use super::validation::{is_definite_datetime, is_valid_email};
use super::{Delegation, DialogInput, Effect, Prompt, PromptKind, TurnContext};
use crate::models::booking::{BookingDetails, BookingPatch};
use crate::models::timex::TimexProperty;
use crate::services::recognizer::recognize_confirmation;

const SUBJECT_PROMPT: &str = "What is the subject for your meeting?";
const ATTENDEE_PROMPT: &str = "With whom would you like to meet?";

/// The step that runs next, receiving the previous step's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Subject,
    Attendee,
    Email,
    Date,
    Confirm,
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingWaterfall {
    pub step: BookingStep,
    pub details: BookingDetails,
}

enum StepOutcome {
    /// Run `step` immediately with `value`.
    Next(BookingStep, BookingDetails, Option<String>),
    /// Wait in `step` for the effect to produce a value.
    Suspend(BookingStep, BookingDetails, Effect<BookingDetails>),
    /// The waterfall is over.
    End(Effect<BookingDetails>),
}

impl BookingWaterfall {
    pub fn new(options: BookingDetails) -> Self {
        Self {
            step: BookingStep::Subject,
            details: options,
        }
    }

    pub fn transition(
        self,
        input: DialogInput,
        ctx: &TurnContext<'_>,
    ) -> (Self, Effect<BookingDetails>) {
        let mut step = self.step;
        let mut details = self.details;
        let mut value = match input {
            DialogInput::Begin => None,
            DialogInput::Utterance(text) => Some(text),
            DialogInput::Resumed(result) => result,
        };

        loop {
            tracing::debug!(step = ?step, version = details.version, "running booking step");
            match run_step(step, details, value, ctx) {
                StepOutcome::Next(next, d, v) => {
                    step = next;
                    details = d;
                    value = v;
                }
                StepOutcome::Suspend(next, d, effect) => {
                    return (Self { step: next, details: d }, effect);
                }
                StepOutcome::End(effect) => {
                    // Nothing of the record survives a cancelled waterfall.
                    let details = match &effect {
                        Effect::Complete(d) => d.clone(),
                        _ => BookingDetails::default(),
                    };
                    return (
                        Self {
                            step: BookingStep::Final,
                            details,
                        },
                        effect,
                    );
                }
            }
        }
    }
}

fn run_step(
    step: BookingStep,
    details: BookingDetails,
    value: Option<String>,
    ctx: &TurnContext<'_>,
) -> StepOutcome {
    match step {
        BookingStep::Subject => match details.subject() {
            Some(subject) => {
                let subject = subject.to_string();
                StepOutcome::Next(BookingStep::Attendee, details, Some(subject))
            }
            None => text_prompt(BookingStep::Attendee, details, SUBJECT_PROMPT),
        },

        BookingStep::Attendee => {
            let Some(subject) = non_blank(value) else {
                return text_prompt(BookingStep::Attendee, details, SUBJECT_PROMPT);
            };
            let details = details.apply(BookingPatch::Subject(subject));
            match details.attendee() {
                Some(attendee) => {
                    let attendee = attendee.to_string();
                    StepOutcome::Next(BookingStep::Email, details, Some(attendee))
                }
                None => text_prompt(BookingStep::Email, details, ATTENDEE_PROMPT),
            }
        }

        BookingStep::Email => {
            let Some(attendee) = non_blank(value) else {
                return text_prompt(BookingStep::Email, details, ATTENDEE_PROMPT);
            };
            let details = details.apply(BookingPatch::Attendee(attendee));
            match details.email().filter(|e| is_valid_email(e)) {
                Some(email) => {
                    let email = email.to_string();
                    StepOutcome::Next(BookingStep::Date, details, Some(email))
                }
                None => {
                    let delegation = Delegation::EmailResolver {
                        candidate: details.email.clone(),
                        attendee: details.attendee.clone(),
                    };
                    StepOutcome::Suspend(BookingStep::Date, details, Effect::Delegate(delegation))
                }
            }
        }

        BookingStep::Date => {
            let Some(email) = value else {
                return StepOutcome::End(Effect::Cancel);
            };
            let details = details.apply(BookingPatch::Email(email));
            match details.meeting_date_time().filter(|t| is_definite_datetime(t)) {
                Some(timex) => {
                    let timex = timex.to_string();
                    StepOutcome::Next(BookingStep::Confirm, details, Some(timex))
                }
                None => {
                    let delegation = Delegation::DateResolver {
                        candidate: details.meeting_date_time.clone(),
                    };
                    StepOutcome::Suspend(BookingStep::Confirm, details, Effect::Delegate(delegation))
                }
            }
        }

        BookingStep::Confirm => {
            let Some(timex) = value else {
                return StepOutcome::End(Effect::Cancel);
            };
            let property = match TimexProperty::parse(&timex) {
                Ok(property) => property,
                Err(e) => {
                    tracing::warn!(error = %e, "resolved meeting time does not parse, abandoning booking");
                    return StepOutcome::End(Effect::Cancel);
                }
            };
            let message = property.to_natural_language(ctx.now);
            let details = details
                .apply(BookingPatch::MeetingDateTime(timex))
                .apply(BookingPatch::MeetingDateMsg(message.clone()));

            let text = format!(
                "Please confirm, I will setup a {} with {} on {}. Is this correct?",
                details.subject().unwrap_or_default(),
                details.attendee().unwrap_or_default(),
                message,
            );
            StepOutcome::Suspend(
                BookingStep::Final,
                details,
                Effect::Prompt(Prompt::new(PromptKind::Confirm, text)),
            )
        }

        BookingStep::Final => {
            let confirmed = value.as_deref().and_then(recognize_confirmation) == Some(true);
            if confirmed {
                StepOutcome::End(Effect::Complete(details))
            } else {
                StepOutcome::End(Effect::Cancel)
            }
        }
    }
}

fn text_prompt(next: BookingStep, details: BookingDetails, text: &str) -> StepOutcome {
    StepOutcome::Suspend(
        next,
        details,
        Effect::Prompt(Prompt::new(PromptKind::Text, text)),
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recognizer::RuleBasedRecognizer;
    use chrono::NaiveDateTime;

    fn ctx() -> TurnContext<'static> {
        TurnContext {
            now: NaiveDateTime::parse_from_str("2023-11-14 09:00", "%Y-%m-%d %H:%M").unwrap(),
            recognizer: &RuleBasedRecognizer,
        }
    }

    fn prefilled() -> BookingDetails {
        BookingDetails {
            subject: Some("Sync".to_string()),
            attendee: Some("Bob".to_string()),
            email: Some("bob@x.com".to_string()),
            meeting_date_time: Some("2023-11-15T14:00".to_string()),
            ..Default::default()
        }
    }

    fn answer(
        waterfall: BookingWaterfall,
        text: &str,
    ) -> (BookingWaterfall, Effect<BookingDetails>) {
        waterfall.transition(DialogInput::Utterance(text.to_string()), &ctx())
    }

    #[test]
    fn test_cold_start_prompts_for_subject() {
        let (waterfall, effect) =
            BookingWaterfall::new(BookingDetails::default()).transition(DialogInput::Begin, &ctx());
        assert_eq!(effect, Effect::Prompt(Prompt::new(PromptKind::Text, SUBJECT_PROMPT)));
        assert_eq!(waterfall.step, BookingStep::Attendee);
    }

    #[test]
    fn test_known_subject_and_attendee_pass_through() {
        let options = BookingDetails {
            subject: Some("Sync".to_string()),
            attendee: Some("Bob".to_string()),
            ..Default::default()
        };
        let (waterfall, effect) = BookingWaterfall::new(options).transition(DialogInput::Begin, &ctx());

        assert_eq!(
            effect,
            Effect::Delegate(Delegation::EmailResolver {
                candidate: None,
                attendee: Some("Bob".to_string()),
            })
        );
        assert_eq!(waterfall.details.subject.as_deref(), Some("Sync"));
        assert_eq!(waterfall.details.attendee.as_deref(), Some("Bob"));
        assert_eq!(waterfall.step, BookingStep::Date);
    }

    #[test]
    fn test_prefilled_record_goes_straight_to_confirmation() {
        let (waterfall, effect) =
            BookingWaterfall::new(prefilled()).transition(DialogInput::Begin, &ctx());

        match effect {
            Effect::Prompt(p) => {
                assert_eq!(p.kind, PromptKind::Confirm);
                assert_eq!(
                    p.text,
                    "Please confirm, I will setup a Sync with Bob on 2PM tomorrow. Is this correct?"
                );
            }
            other => panic!("expected confirmation prompt, got {other:?}"),
        }
        assert_eq!(waterfall.step, BookingStep::Final);

        let (_, effect) = answer(waterfall, "yes");
        let Effect::Complete(details) = effect else {
            panic!("expected completion");
        };
        assert_eq!(details.subject.as_deref(), Some("Sync"));
        assert_eq!(details.attendee.as_deref(), Some("Bob"));
        assert_eq!(details.email.as_deref(), Some("bob@x.com"));
        assert_eq!(details.meeting_date_time.as_deref(), Some("2023-11-15T14:00"));
        assert_eq!(details.meeting_date_msg.as_deref(), Some("2PM tomorrow"));
    }

    #[test]
    fn test_declining_yields_no_result() {
        for reply in ["no", "maybe", ""] {
            let (waterfall, _) =
                BookingWaterfall::new(prefilled()).transition(DialogInput::Begin, &ctx());
            let (waterfall, effect) = answer(waterfall, reply);
            assert_eq!(effect, Effect::Cancel);
            assert_eq!(waterfall.details, BookingDetails::default());
        }
    }

    #[test]
    fn test_invalid_prefilled_fields_are_delegated() {
        let options = BookingDetails {
            email: Some("jane.doe@example.com.".to_string()),
            meeting_date_time: Some("XXXX-WXX-2".to_string()),
            ..prefilled()
        };
        let (waterfall, effect) = BookingWaterfall::new(options).transition(DialogInput::Begin, &ctx());
        assert_eq!(
            effect,
            Effect::Delegate(Delegation::EmailResolver {
                candidate: Some("jane.doe@example.com.".to_string()),
                attendee: Some("Bob".to_string()),
            })
        );

        let (waterfall, effect) = waterfall.transition(
            DialogInput::Resumed(Some("jane.doe@example.com".to_string())),
            &ctx(),
        );
        assert_eq!(
            effect,
            Effect::Delegate(Delegation::DateResolver {
                candidate: Some("XXXX-WXX-2".to_string()),
            })
        );
        assert_eq!(waterfall.details.email.as_deref(), Some("jane.doe@example.com"));
    }

    #[test]
    fn test_blank_subject_is_asked_again() {
        let (waterfall, _) =
            BookingWaterfall::new(BookingDetails::default()).transition(DialogInput::Begin, &ctx());
        let (waterfall, effect) = answer(waterfall, "   ");
        assert_eq!(effect, Effect::Prompt(Prompt::new(PromptKind::Text, SUBJECT_PROMPT)));
        assert_eq!(waterfall.step, BookingStep::Attendee);

        let (waterfall, effect) = answer(waterfall, "Planning");
        assert_eq!(effect, Effect::Prompt(Prompt::new(PromptKind::Text, ATTENDEE_PROMPT)));
        assert_eq!(waterfall.details.subject.as_deref(), Some("Planning"));
    }

    #[test]
    fn test_resolver_without_result_abandons_booking() {
        let options = BookingDetails {
            subject: Some("Sync".to_string()),
            attendee: Some("Bob".to_string()),
            ..Default::default()
        };
        let (waterfall, _) = BookingWaterfall::new(options).transition(DialogInput::Begin, &ctx());
        let (waterfall, effect) = waterfall.transition(DialogInput::Resumed(None), &ctx());
        assert_eq!(effect, Effect::Cancel);
        assert_eq!(waterfall.details, BookingDetails::default());
    }

    #[test]
    fn test_every_captured_field_bumps_version() {
        let (waterfall, _) =
            BookingWaterfall::new(prefilled()).transition(DialogInput::Begin, &ctx());
        // subject, attendee, email, date, rendered date
        assert_eq!(waterfall.details.version, 5);
    }
}
