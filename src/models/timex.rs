//! TIMEX date/time expressions.
//!
//! A TIMEX is an ISO-8601-like calendar expression that may leave parts
//! unknown: `XXXX-11-15T14` has no year, `XXXX-WXX-2` is "some Tuesday",
//! `T15` is a time on no particular day.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, Duration, Month, NaiveDate, NaiveDateTime, Timelike};

const PRESENT_REF: &str = "PRESENT_REF";

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimexError {
    #[error("empty TIMEX expression")]
    Empty,

    #[error("malformed TIMEX expression: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimexType {
    Present,
    Definite,
    Date,
    DateRange,
    Time,
    DateTime,
}

impl TimexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimexType::Present => "present",
            TimexType::Definite => "definite",
            TimexType::Date => "date",
            TimexType::DateRange => "daterange",
            TimexType::Time => "time",
            TimexType::DateTime => "datetime",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimexProperty {
    pub present: bool,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day_of_month: Option<u32>,
    /// ISO day of week, 1 = Monday.
    pub day_of_week: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl TimexProperty {
    pub fn parse(raw: &str) -> Result<Self, TimexError> {
        raw.parse()
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: Some(date.month()),
            day_of_month: Some(date.day()),
            ..Default::default()
        }
    }

    pub fn from_date_time(dt: NaiveDateTime) -> Self {
        Self::from_date(dt.date()).with_time(dt.hour(), dt.minute())
    }

    /// Sets the time of day. A zero minute is left implicit, `T14` rather than `T14:00`.
    pub fn with_time(mut self, hour: u32, minute: u32) -> Self {
        self.hour = Some(hour);
        self.minute = (minute != 0).then_some(minute);
        self.second = None;
        self
    }

    pub fn types(&self) -> BTreeSet<TimexType> {
        let mut types = BTreeSet::new();
        if self.present {
            types.insert(TimexType::Present);
            return types;
        }

        let has_date =
            (self.month.is_some() && self.day_of_month.is_some()) || self.day_of_week.is_some();
        if has_date {
            types.insert(TimexType::Date);
        }
        if self.year.is_some() && self.month.is_some() && self.day_of_month.is_some() {
            types.insert(TimexType::Definite);
        }
        if !has_date && (self.year.is_some() || self.month.is_some()) {
            types.insert(TimexType::DateRange);
        }
        if self.hour.is_some() {
            types.insert(TimexType::Time);
            if has_date {
                types.insert(TimexType::DateTime);
            }
        }
        types
    }

    pub fn has(&self, kind: TimexType) -> bool {
        self.types().contains(&kind)
    }

    /// The calendar date, when year, month and day are all known.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day_of_month?)
    }

    /// Renders the expression as English relative to `reference`,
    /// e.g. "2PM tomorrow" or "9AM 25th December 2023".
    pub fn to_natural_language(&self, reference: NaiveDateTime) -> String {
        if self.present {
            return "now".to_string();
        }

        match (self.describe_time(), self.describe_date(reference.date())) {
            (Some(time), Some(date)) => format!("{time} {date}"),
            (Some(time), None) => time,
            (None, Some(date)) => date,
            (None, None) => String::new(),
        }
    }

    fn describe_date(&self, reference: NaiveDate) -> Option<String> {
        if let Some(date) = self.date() {
            return Some(describe_relative(date, reference));
        }
        if let Some(day) = self.day_of_week {
            return Some(weekday_name(day).to_string());
        }

        let month = self.month.and_then(month_name);
        match (self.day_of_month, month, self.year) {
            (Some(day), Some(month), _) => Some(format!("{day}{} {month}", ordinal_suffix(day))),
            (None, Some(month), Some(year)) => Some(format!("{month} {year}")),
            (None, Some(month), None) => Some(month.to_string()),
            (None, None, Some(year)) => Some(year.to_string()),
            _ => None,
        }
    }

    fn describe_time(&self) -> Option<String> {
        let hour = self.hour?;
        let minute = self.minute.unwrap_or(0);
        let second = self.second.unwrap_or(0);

        if minute == 0 && second == 0 {
            match hour {
                0 => return Some("midnight".to_string()),
                12 => return Some("midday".to_string()),
                _ => {}
            }
        }

        let h12 = match hour % 12 {
            0 => 12,
            h => h,
        };
        let suffix = if hour < 12 { "AM" } else { "PM" };

        Some(match (minute, second) {
            (0, 0) => format!("{h12}{suffix}"),
            (m, 0) => format!("{h12}:{m:02}{suffix}"),
            (m, s) => format!("{h12}:{m:02}:{s:02}{suffix}"),
        })
    }

    fn parse_date(&mut self, part: &str, raw: &str) -> Result<(), TimexError> {
        let pieces: Vec<&str> = part.split('-').collect();
        match pieces.as_slice() {
            [year] => {
                self.year = parse_year(year, raw)?;
            }
            [year, month] => {
                self.year = parse_year(year, raw)?;
                self.month = Some(parse_number(month, 1..=12, raw)?);
            }
            [year, week, day] if week.starts_with('W') => {
                if *week != "WXX" {
                    return Err(TimexError::Malformed(raw.to_string()));
                }
                self.year = parse_year(year, raw)?;
                self.day_of_week = Some(parse_number(day, 1..=7, raw)?);
            }
            [year, month, day] => {
                self.year = parse_year(year, raw)?;
                self.month = Some(parse_number(month, 1..=12, raw)?);
                self.day_of_month = Some(parse_number(day, 1..=31, raw)?);
                if self.year.is_some() && self.date().is_none() {
                    return Err(TimexError::Malformed(raw.to_string()));
                }
            }
            _ => return Err(TimexError::Malformed(raw.to_string())),
        }
        Ok(())
    }

    fn parse_time(&mut self, part: &str, raw: &str) -> Result<(), TimexError> {
        let pieces: Vec<&str> = part.split(':').collect();
        if pieces.is_empty() || pieces.len() > 3 {
            return Err(TimexError::Malformed(raw.to_string()));
        }
        self.hour = Some(parse_number(pieces[0], 0..=23, raw)?);
        if let Some(minute) = pieces.get(1) {
            self.minute = Some(parse_number(minute, 0..=59, raw)?);
        }
        if let Some(second) = pieces.get(2) {
            self.second = Some(parse_number(second, 0..=59, raw)?);
        }
        Ok(())
    }
}

impl FromStr for TimexProperty {
    type Err = TimexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(TimexError::Empty);
        }
        if raw == PRESENT_REF {
            return Ok(Self {
                present: true,
                ..Default::default()
            });
        }

        let mut timex = Self::default();
        let (date_part, time_part) = match raw.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (raw, None),
        };
        if !date_part.is_empty() {
            timex.parse_date(date_part, raw)?;
        }
        if let Some(time) = time_part {
            timex.parse_time(time, raw)?;
        }
        Ok(timex)
    }
}

impl fmt::Display for TimexProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.present {
            return f.write_str(PRESENT_REF);
        }

        let year = match self.year {
            Some(year) => format!("{year:04}"),
            None => "XXXX".to_string(),
        };
        if let Some(day) = self.day_of_week {
            write!(f, "{year}-WXX-{day}")?;
        } else if let Some(month) = self.month {
            write!(f, "{year}-{month:02}")?;
            if let Some(day) = self.day_of_month {
                write!(f, "-{day:02}")?;
            }
        } else if self.year.is_some() {
            f.write_str(&year)?;
        }

        if let Some(hour) = self.hour {
            write!(f, "T{hour:02}")?;
            if let Some(minute) = self.minute {
                write!(f, ":{minute:02}")?;
                if let Some(second) = self.second {
                    write!(f, ":{second:02}")?;
                }
            }
        }
        Ok(())
    }
}

fn parse_year(piece: &str, raw: &str) -> Result<Option<i32>, TimexError> {
    if piece == "XXXX" {
        return Ok(None);
    }
    if piece.len() != 4 || !piece.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimexError::Malformed(raw.to_string()));
    }
    piece
        .parse()
        .map(Some)
        .map_err(|_| TimexError::Malformed(raw.to_string()))
}

fn parse_number(piece: &str, range: RangeInclusive<u32>, raw: &str) -> Result<u32, TimexError> {
    if piece.is_empty() || piece.len() > 2 || !piece.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimexError::Malformed(raw.to_string()));
    }
    piece
        .parse()
        .ok()
        .filter(|n| range.contains(n))
        .ok_or_else(|| TimexError::Malformed(raw.to_string()))
}

fn describe_relative(date: NaiveDate, reference: NaiveDate) -> String {
    match (date - reference).num_days() {
        0 => return "today".to_string(),
        1 => return "tomorrow".to_string(),
        -1 => return "yesterday".to_string(),
        _ => {}
    }

    let name = weekday_name(date.weekday().number_from_monday());
    let week = date.iso_week();
    if week == reference.iso_week() {
        format!("this {name}")
    } else if week == (reference + Duration::days(7)).iso_week() {
        format!("next {name}")
    } else if week == (reference - Duration::days(7)).iso_week() {
        format!("last {name}")
    } else {
        let day = date.day();
        let month = month_name(date.month()).unwrap_or_default();
        format!("{day}{} {month} {}", ordinal_suffix(day), date.year())
    }
}

fn weekday_name(day: u32) -> &'static str {
    WEEKDAYS[(day.clamp(1, 7) - 1) as usize]
}

fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
