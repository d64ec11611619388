//! Recognizers for prompt answers.
//!
//! [`DateTimeRecognizer`] is the seam to an entity-recognition backend; the
//! dialogs only consume the TIMEX strings it returns. [`RuleBasedRecognizer`]
//! covers the common English phrasings without any external service.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};

use crate::models::timex::TimexProperty;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const AFFIRMATIVE: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "correct", "confirm", "confirmed",
    "right", "absolutely", "definitely",
];

const NEGATIVE: &[&str] = &["no", "n", "nope", "nah", "wrong", "incorrect"];

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})(?:t(\d{1,2})(?::(\d{2}))?)?").unwrap()
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b(?:,?\s+(\d{4})\b)?",
    )
    .unwrap()
});

static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?(?:,?\s+(\d{4})\b)?",
    )
    .unwrap()
});

static RELATIVE_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(today|tonight|tomorrow)\b").unwrap());

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b").unwrap()
});

static YEAR_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d{4})\s*$").unwrap());

static CLOCK_12_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d:])(\d{1,2})(?::(\d{2}))?\s*(a\.?m\.?|p\.?m\.?)").unwrap()
});

static CLOCK_24_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\d])(\d{1,2}):(\d{2})").unwrap());

static NAMED_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(noon|midday|midnight)\b").unwrap());

pub trait DateTimeRecognizer: Send + Sync {
    /// Candidate TIMEX expressions found in `text`, best first.
    fn recognize(&self, text: &str, reference: NaiveDateTime) -> Vec<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedRecognizer;

impl DateTimeRecognizer for RuleBasedRecognizer {
    fn recognize(&self, text: &str, reference: NaiveDateTime) -> Vec<String> {
        let text = text.trim().to_lowercase();

        if let Some(caps) = YEAR_ONLY_RE.captures(&text) {
            let year = caps[1].parse().ok();
            let timex = TimexProperty {
                year,
                ..Default::default()
            };
            return vec![timex.to_string()];
        }

        let date = recognize_date(&text, reference.date());
        let time = recognize_time(&text);
        if date.is_none() && time.is_none() {
            tracing::debug!(text = %text, "no date or time recognized");
            return vec![];
        }

        let mut timex = date.unwrap_or_default();
        if let Some((hour, minute)) = time {
            timex = timex.with_time(hour, minute);
        }
        vec![timex.to_string()]
    }
}

/// Interprets a yes/no answer. `None` when the answer is neither.
pub fn recognize_confirmation(text: &str) -> Option<bool> {
    let lowered = text.trim().to_lowercase();
    let first = lowered
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphanumeric());

    if AFFIRMATIVE.contains(&first) {
        Some(true)
    } else if NEGATIVE.contains(&first) {
        Some(false)
    } else {
        None
    }
}

fn recognize_date(text: &str, today: NaiveDate) -> Option<TimexProperty> {
    if let Some(caps) = ISO_DATE_RE.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).map(TimexProperty::from_date);
    }
    if let Some(caps) = MONTH_DAY_RE.captures(text) {
        return month_day(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()));
    }
    if let Some(caps) = DAY_MONTH_RE.captures(text) {
        return month_day(&caps[2], &caps[1], caps.get(3).map(|m| m.as_str()));
    }
    if let Some(caps) = RELATIVE_DAY_RE.captures(text) {
        let date = match &caps[1] {
            "tomorrow" => today + Duration::days(1),
            _ => today,
        };
        return Some(TimexProperty::from_date(date));
    }
    if let Some(caps) = WEEKDAY_RE.captures(text) {
        let day = WEEKDAYS.iter().position(|d| *d == &caps[1])? as u32 + 1;
        return Some(TimexProperty {
            day_of_week: Some(day),
            ..Default::default()
        });
    }
    None
}

fn month_day(month: &str, day: &str, year: Option<&str>) -> Option<TimexProperty> {
    let month = MONTHS.iter().position(|m| *m == month)? as u32 + 1;
    let day: u32 = day.parse().ok().filter(|d| (1..=31).contains(d))?;

    match year {
        Some(year) => {
            let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month, day)?;
            Some(TimexProperty::from_date(date))
        }
        None => Some(TimexProperty {
            month: Some(month),
            day_of_month: Some(day),
            ..Default::default()
        }),
    }
}

fn recognize_time(text: &str) -> Option<(u32, u32)> {
    if let Some(caps) = ISO_DATE_RE.captures(text) {
        if let Some(hour) = caps.get(4) {
            let hour: u32 = hour.as_str().parse().ok()?;
            let minute = minute_of(&caps, 5)?;
            return (hour < 24).then_some((hour, minute));
        }
    }
    if let Some(caps) = CLOCK_12_RE.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute = minute_of(&caps, 2)?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let hour = match (caps[3].starts_with('p'), hour) {
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, 12) => 0,
            (false, h) => h,
        };
        return Some((hour, minute));
    }
    if let Some(caps) = CLOCK_24_RE.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute = minute_of(&caps, 2)?;
        return (hour < 24).then_some((hour, minute));
    }
    if let Some(caps) = NAMED_TIME_RE.captures(text) {
        return Some(if &caps[1] == "midnight" { (0, 0) } else { (12, 0) });
    }
    None
}

fn minute_of(caps: &Captures<'_>, group: usize) -> Option<u32> {
    match caps.get(group) {
        Some(m) => m.as_str().parse().ok().filter(|m| *m < 60),
        None => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2023-11-14 09:00", "%Y-%m-%d %H:%M").unwrap()
    }

    fn recognize(text: &str) -> Vec<String> {
        RuleBasedRecognizer.recognize(text, reference())
    }

    #[test]
    fn test_iso_forms() {
        assert_eq!(recognize("2023-11-15T14:00"), vec!["2023-11-15T14"]);
        assert_eq!(recognize("2023-11-15 2pm"), vec!["2023-11-15T14"]);
        assert_eq!(recognize("2023-11-15 at 09:45"), vec!["2023-11-15T09:45"]);
        assert_eq!(recognize("2023-11-15"), vec!["2023-11-15"]);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(
            recognize("November 15 2023 at 2:30pm"),
            vec!["2023-11-15T14:30"]
        );
        assert_eq!(recognize("Nov 15th, 2023 at 9 a.m."), vec!["2023-11-15T09"]);
        assert_eq!(recognize("15th of November at 3pm"), vec!["XXXX-11-15T15"]);
    }

    #[test]
    fn test_relative_days_are_definite() {
        assert_eq!(recognize("tomorrow at 10am"), vec!["2023-11-15T10"]);
        assert_eq!(recognize("today at midnight"), vec!["2023-11-14T00"]);
    }

    #[test]
    fn test_ambiguous_forms() {
        assert_eq!(recognize("Tuesday"), vec!["XXXX-WXX-2"]);
        assert_eq!(recognize("Friday at noon"), vec!["XXXX-WXX-5T12"]);
        assert_eq!(recognize("2023"), vec!["2023"]);
        assert_eq!(recognize("at 3pm"), vec!["T15"]);
    }

    #[test]
    fn test_nothing_recognized() {
        assert!(recognize("sometime soon").is_empty());
        assert!(recognize("").is_empty());
        assert!(recognize("at 13pm").is_empty());
    }

    #[test]
    fn test_impossible_dates_drop_the_date() {
        assert_eq!(recognize("2023-02-30 2pm"), vec!["T14"]);
        assert_eq!(recognize("February 30 2023"), Vec::<String>::new());
    }

    #[test]
    fn test_confirmation() {
        assert_eq!(recognize_confirmation("yes"), Some(true));
        assert_eq!(recognize_confirmation("Yes, please!"), Some(true));
        assert_eq!(recognize_confirmation("OK"), Some(true));
        assert_eq!(recognize_confirmation("no"), Some(false));
        assert_eq!(recognize_confirmation("Nope."), Some(false));
        assert_eq!(recognize_confirmation("maybe later"), None);
        assert_eq!(recognize_confirmation(""), None);
    }
}
