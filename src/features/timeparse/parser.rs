//! Natural-language time expression parser
//!
//! Resolves expressions like "in 2 hours", "tomorrow at 3pm",
//! "next monday at 15:00" or "2024-03-07 15:30" into an absolute UTC instant.
//! Wall-clock expressions are interpreted in the configured timezone, relative
//! to the caller's reference instant.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Trailing day phrases ("3pm tomorrow"), "tonight", DST gap detection
//! - 1.0.0: Initial grammar (relative, named days, clock times, date literals)

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;

use super::duration::parse_duration;

/// Example expressions shown to users when parsing fails
pub const TIME_EXAMPLES: &str = "Examples:\n- in 2 hours\n- today at 3pm\n- tomorrow at 3pm\n- next monday at 15:00\n- 2024-03-07 15:30";

const WEEKDAYS: &str =
    "monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun";

/// Default hour for a bare "tonight"
const TONIGHT_HOUR: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("could not understand the time expression")]
    Unrecognized,

    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),

    /// Local time falls in a DST gap or overlap
    #[error("{0} does not exist or occurs twice in the configured timezone")]
    AmbiguousLocalTime(String),
}

/// A wall-clock time as written by the user
#[derive(Debug, Clone, Copy)]
struct Clock {
    hour: u32,
    minute: u32,
    second: u32,
    meridiem: bool,
    has_minutes: bool,
}

impl Clock {
    fn word(hour: u32) -> Self {
        Clock {
            hour,
            minute: 0,
            second: 0,
            meridiem: true,
            has_minutes: true,
        }
    }

    /// "at 3" could be 03:00 or 15:00
    fn is_unambiguous(&self) -> bool {
        self.meridiem || self.has_minutes || self.hour == 0 || self.hour > 12
    }

    /// Read the clock as an evening time; None when it contradicts "tonight"
    ///
    /// Explicit am times and a bare 12 (noon or midnight) are refused.
    fn evening(mut self) -> Option<Self> {
        if self.meridiem {
            return (self.hour >= 12).then_some(self);
        }
        if self.hour == 12 {
            return None;
        }
        if self.hour < 12 {
            self.hour += 12;
        }
        self.meridiem = true;
        Some(self)
    }

    fn time(&self) -> Result<NaiveTime, ParseError> {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second).ok_or(ParseError::Unrecognized)
    }
}

/// Compiled time grammar
///
/// Build once at startup and share by reference; parsing never mutates it.
pub struct TimeParser {
    relative_unit: Regex,
    compact: Regex,
    date_literal: Regex,
    day_phrase: Regex,
    trailing_day: Regex,
    clock: Regex,
}

impl TimeParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            relative_unit: Regex::new(
                r"^(\d+|an|a|one)\s*(seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|wks?|w)$",
            )?,
            compact: Regex::new(r"^(?:\d+[smhdw])+$")?,
            date_literal: Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:(?:t|\s)(.+))?$")?,
            day_phrase: Regex::new(&format!(
                r"^(today|tonight|tomorrow|(?:(this|next)\s)?({WEEKDAYS}))(?:\s(.+))?$"
            ))?,
            trailing_day: Regex::new(&format!(
                r"^(?:at\s)?(.+?)\s(today|tonight|tomorrow|(?:(?:this|next)\s)?(?:{WEEKDAYS}))$"
            ))?,
            clock: Regex::new(
                r"^(?:at\s)?(?:(noon|midnight)|(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?\s?(am|pm|a\.m\.|p\.m\.)?)$",
            )?,
        })
    }

    /// Resolve `text` to a UTC instant
    ///
    /// # Arguments
    ///
    /// * `text` - The user's time expression
    /// * `timezone` - IANA timezone name used for wall-clock expressions
    /// * `reference` - "Now"; relative expressions and local day boundaries hang off it
    pub fn parse(
        &self,
        text: &str,
        timezone: &str,
        reference: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ParseError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| ParseError::InvalidTimezone(timezone.to_string()))?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Unrecognized);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        let input = normalize(trimmed);
        self.parse_normalized(&input, tz, reference.with_timezone(&tz))
    }

    fn parse_normalized(
        &self,
        input: &str,
        tz: Tz,
        now: DateTime<Tz>,
    ) -> Result<DateTime<Utc>, ParseError> {
        if let Some(rest) = input.strip_prefix("in ") {
            let offset = self.relative_offset(rest)?;
            return now
                .with_timezone(&Utc)
                .checked_add_signed(offset)
                .ok_or(ParseError::Unrecognized);
        }

        if self.compact.is_match(input) {
            let offset = compact_offset(input)?;
            return now
                .with_timezone(&Utc)
                .checked_add_signed(offset)
                .ok_or(ParseError::Unrecognized);
        }

        if let Some(caps) = self.date_literal.captures(input) {
            let date = (|| {
                NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
            })()
            .ok_or(ParseError::Unrecognized)?;
            // A bare date has no obvious time of day
            let rest = caps.get(4).ok_or(ParseError::Unrecognized)?;
            let clock = self
                .parse_clock(rest.as_str())
                .filter(Clock::is_unambiguous)
                .ok_or(ParseError::Unrecognized)?;
            return localize(tz, date, clock.time()?);
        }

        if self.day_phrase.is_match(input) {
            return self.resolve_day_phrase(input, tz, now);
        }

        if let Some(caps) = self.trailing_day.captures(input) {
            let reordered = format!("{} at {}", &caps[2], &caps[1]);
            if self.day_phrase.is_match(&reordered) {
                return self.resolve_day_phrase(&reordered, tz, now);
            }
        }

        if let Some(clock) = self.parse_clock(input) {
            if !clock.is_unambiguous() {
                return Err(ParseError::Unrecognized);
            }
            return localize(tz, now.date_naive(), clock.time()?);
        }

        Err(ParseError::Unrecognized)
    }

    /// "2 hours", "1 hour and 30 minutes", "an hour", "1h30m"
    fn relative_offset(&self, rest: &str) -> Result<Duration, ParseError> {
        if self.compact.is_match(rest) {
            return compact_offset(rest);
        }

        let rest = rest.replace(',', " and ");
        let mut total: i64 = 0;
        let mut parts = 0;

        for part in rest.split(" and ").map(str::trim).filter(|p| !p.is_empty()) {
            let caps = self
                .relative_unit
                .captures(part)
                .ok_or(ParseError::Unrecognized)?;
            let amount: i64 = match &caps[1] {
                "a" | "an" | "one" => 1,
                n => n.parse().map_err(|_| ParseError::Unrecognized)?,
            };
            let unit = unit_seconds(&caps[2]).ok_or(ParseError::Unrecognized)?;
            total = amount
                .checked_mul(unit)
                .and_then(|secs| total.checked_add(secs))
                .ok_or(ParseError::Unrecognized)?;
            parts += 1;
        }

        if parts == 0 {
            return Err(ParseError::Unrecognized);
        }
        Duration::try_seconds(total).ok_or(ParseError::Unrecognized)
    }

    fn resolve_day_phrase(
        &self,
        input: &str,
        tz: Tz,
        now: DateTime<Tz>,
    ) -> Result<DateTime<Utc>, ParseError> {
        let caps = self
            .day_phrase
            .captures(input)
            .ok_or(ParseError::Unrecognized)?;
        let today = now.date_naive();

        let (date, tonight) = match &caps[1] {
            "today" => (today, false),
            "tonight" => (today, true),
            "tomorrow" => (today.succ_opt().ok_or(ParseError::Unrecognized)?, false),
            _ => {
                let weekday = caps
                    .get(3)
                    .and_then(|m| parse_weekday(m.as_str()))
                    .ok_or(ParseError::Unrecognized)?;
                let strictly_after = caps.get(2).is_some_and(|m| m.as_str() == "next");
                (next_weekday(today, weekday, strictly_after)?, false)
            }
        };

        let time = match caps.get(4) {
            Some(rest) => {
                let clock = self
                    .parse_clock(rest.as_str())
                    .ok_or(ParseError::Unrecognized)?;
                let clock = if tonight {
                    clock.evening().ok_or(ParseError::Unrecognized)?
                } else {
                    clock
                };
                if !clock.is_unambiguous() {
                    return Err(ParseError::Unrecognized);
                }
                clock.time()?
            }
            None if tonight => Clock::word(TONIGHT_HOUR).time()?,
            // "tomorrow" keeps the current time of day
            None => NaiveTime::from_hms_opt(now.hour(), now.minute(), now.second())
                .ok_or(ParseError::Unrecognized)?,
        };

        localize(tz, date, time)
    }

    fn parse_clock(&self, text: &str) -> Option<Clock> {
        let caps = self.clock.captures(text)?;

        if let Some(word) = caps.get(1) {
            return Some(match word.as_str() {
                "noon" => Clock::word(12),
                _ => Clock::word(0),
            });
        }

        let mut hour: u32 = caps.get(2)?.as_str().parse().ok()?;
        let minute: u32 = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        let second: u32 = match caps.get(4) {
            Some(s) => s.as_str().parse().ok()?,
            None => 0,
        };

        let pm = caps.get(5).map(|m| m.as_str().starts_with('p'));
        match pm {
            Some(pm) => {
                if !(1..=12).contains(&hour) {
                    return None;
                }
                hour %= 12;
                if pm {
                    hour += 12;
                }
            }
            None if hour > 23 => return None,
            None => {}
        }

        if minute > 59 || second > 59 {
            return None;
        }

        Some(Clock {
            hour,
            minute,
            second,
            meridiem: pm.is_some(),
            has_minutes: caps.get(3).is_some(),
        })
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn compact_offset(text: &str) -> Result<Duration, ParseError> {
    parse_duration(text)
        .and_then(Duration::try_seconds)
        .ok_or(ParseError::Unrecognized)
}

fn unit_seconds(unit: &str) -> Option<i64> {
    Some(match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
        "d" | "day" | "days" => 86_400,
        "w" | "wk" | "wks" | "week" | "weeks" => 604_800,
        _ => return None,
    })
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    Some(match word.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    })
}

/// Next date falling on `weekday`; today counts unless `strictly_after`
fn next_weekday(
    today: NaiveDate,
    weekday: Weekday,
    strictly_after: bool,
) -> Result<NaiveDate, ParseError> {
    let mut ahead = (7 + weekday.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        % 7;
    if ahead == 0 && strictly_after {
        ahead = 7;
    }
    today
        .checked_add_signed(Duration::days(ahead))
        .ok_or(ParseError::Unrecognized)
}

fn localize(tz: Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>, ParseError> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ParseError::AmbiguousLocalTime(naive.format("%Y-%m-%d %H:%M").to_string()))
}
