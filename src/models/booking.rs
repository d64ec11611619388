use serde::{Deserialize, Serialize};

/// The slots collected by the booking waterfall.
///
/// Every change goes through [`BookingDetails::apply`], which returns an
/// updated copy and bumps `version`, so a step never mutates a record it
/// does not own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// TIMEX expression for the meeting start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_date_time: Option<String>,
    /// Rendered from `meeting_date_time` at confirmation, never user supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_date_msg: Option<String>,
    #[serde(default)]
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingPatch {
    Subject(String),
    Attendee(String),
    Email(String),
    MeetingDateTime(String),
    MeetingDateMsg(String),
}

impl BookingDetails {
    pub fn apply(&self, patch: BookingPatch) -> Self {
        let mut next = self.clone();
        match patch {
            BookingPatch::Subject(v) => next.subject = Some(v),
            BookingPatch::Attendee(v) => next.attendee = Some(v),
            BookingPatch::Email(v) => next.email = Some(v),
            BookingPatch::MeetingDateTime(v) => next.meeting_date_time = Some(v),
            BookingPatch::MeetingDateMsg(v) => next.meeting_date_msg = Some(v),
        }
        next.version += 1;
        next
    }

    pub fn subject(&self) -> Option<&str> {
        known(&self.subject)
    }

    pub fn attendee(&self) -> Option<&str> {
        known(&self.attendee)
    }

    pub fn email(&self) -> Option<&str> {
        known(&self.email)
    }

    pub fn meeting_date_time(&self) -> Option<&str> {
        known(&self.meeting_date_time)
    }
}

// An empty string counts as not supplied.
fn known(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.trim().is_empty())
}
