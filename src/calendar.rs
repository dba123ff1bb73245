//! The Utopian calendar.
//!
//! A Utopian year has seven months (January..July) of 24 days, and one
//! game tick is one day. News lines are prefixed with dates like
//! `"July 1 of YR3"`; this module recognizes those prefixes and maps them
//! onto a flat tick count so lines can be ordered and spaced.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub const MONTHS: [&str; 7] = [
    "January", "February", "March", "April", "May", "June", "July",
];
pub const DAYS_PER_MONTH: u32 = 24;
pub const TICKS_PER_YEAR: u32 = DAYS_PER_MONTH * MONTHS.len() as u32;

// "July 1 of YR3", "jan 24 of yr12", "Feb. 3 of YR 0" followed by a tab,
// spaces or a colon before the event text.
static RE_DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<month>jan|feb|mar|apr|may|jun|jul)[a-z]*\.?\s+(?P<day>\d{1,2})\s+of\s+yr\s*(?P<year>\d{1,4})\b[\s:,]*"
    ).unwrap()
});

/// A day on the Utopian calendar. `month` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameDate {
    pub year: u32,
    pub month: u8,
    pub day: u8,
}

impl GameDate {
    pub fn new(year: u32, month: u8, day: u8) -> Option<Self> {
        let in_range =
            (month as usize) < MONTHS.len() && (1..=DAYS_PER_MONTH).contains(&(day as u32));
        in_range.then_some(Self { year, month, day })
    }

    /// `year*168 + month*24 + (day-1)`
    pub fn tick(&self) -> u32 {
        self.year * TICKS_PER_YEAR + self.month as u32 * DAYS_PER_MONTH + (self.day as u32 - 1)
    }

    pub fn month_name(&self) -> &'static str {
        MONTHS[self.month as usize]
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} of YR{}", self.month_name(), self.day, self.year)
    }
}

/// Three-letter month stem (any case) → zero-based month index.
pub fn month_index(stem: &str) -> Option<u8> {
    let stem = stem.get(..3)?;
    MONTHS
        .iter()
        .position(|m| m[..3].eq_ignore_ascii_case(stem))
        .map(|i| i as u8)
}

/// A line split into its date prefix and the event text that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedText<'a> {
    pub date: Option<GameDate>,
    /// The prefix exactly as written, trimmed; empty when absent
    pub prefix: &'a str,
    pub text: &'a str,
}

/// Strip a leading date prefix. Lines without one come back unchanged with
/// `date == None`; so do prefixes naming an impossible day.
pub fn split_date_prefix(line: &str) -> DatedText<'_> {
    let undated = DatedText {
        date: None,
        prefix: "",
        text: line.trim(),
    };

    let Some(caps) = RE_DATE_PREFIX.captures(line) else {
        return undated;
    };
    let whole = caps.get(0).unwrap();
    let month = caps.name("month").and_then(|m| month_index(m.as_str()));
    let day = caps.name("day").and_then(|m| m.as_str().parse::<u8>().ok());
    let year = caps.name("year").and_then(|m| m.as_str().parse::<u32>().ok());

    let date = match (month, day, year) {
        (Some(m), Some(d), Some(y)) => GameDate::new(y, m, d),
        _ => None,
    };
    match date {
        Some(date) => DatedText {
            date: Some(date),
            prefix: whole.as_str().trim(),
            text: line[whole.end()..].trim(),
        },
        None => undated,
    }
}
