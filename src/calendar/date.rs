// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Date normalization into AppleScript date literals.
//!
//! Calendar only understands `date "M/D/YYYY h:mm:ss AM|PM"`. Inputs arrive
//! as `YYYY-MM-DD HH:MM` (or a bare `YYYY-MM-DD` meaning midnight), are
//! resolved in the local time zone and rendered in that grammar.

use super::{CalendarError, Result};
use chrono::{DateTime, Days, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;

/// Accepted date-time input layouts, tried in order.
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rendering used for `date "..."` literals and for the dates Calendar
/// reports back.
pub const HOST_FORMAT: &str = "%-m/%-d/%Y %-I:%M:%S %p";

const HOST_PARSE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// A date already rendered in the AppleScript literal grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDateLiteral(String);

impl HostDateLiteral {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostDateLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of "today" for the day listing.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Reads the local process clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Normalize `input` in the local process time zone.
pub fn normalize(input: &str) -> Result<HostDateLiteral> {
    normalize_in(input, &Local)
}

/// Normalize `input` in an explicit time zone.
pub fn normalize_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<HostDateLiteral> {
    let instant = resolve(input, tz)?;
    Ok(render(&instant))
}

/// Normalize a start/end pair, rejecting ranges whose end is not strictly
/// after the start.
pub fn normalize_range(start: &str, end: &str) -> Result<(HostDateLiteral, HostDateLiteral)> {
    normalize_range_in(start, end, &Local)
}

pub fn normalize_range_in<Tz: TimeZone>(
    start: &str,
    end: &str,
    tz: &Tz,
) -> Result<(HostDateLiteral, HostDateLiteral)> {
    let from = resolve(start, tz)?;
    let to = resolve(end, tz)?;
    if to <= from {
        return Err(CalendarError::InvalidDateRange {
            start: start.trim().to_string(),
            end: end.trim().to_string(),
        });
    }
    Ok((render(&from), render(&to)))
}

/// Parse a rendered host literal back into a naive local date-time.
pub fn parse_host_literal(literal: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(literal.trim(), HOST_PARSE_FORMAT)
        .map_err(|_| CalendarError::InvalidDateFormat(literal.to_string()))
}

/// `[today 00:00, tomorrow 00:00)` as input strings.
pub fn today_bounds(clock: &dyn Clock) -> Result<(String, String)> {
    day_span(clock.today(), 1)
}

/// `[weekStart 00:00, weekStart + 7 days 00:00)` as input strings.
pub fn week_bounds(week_start: &str) -> Result<(String, String)> {
    let start = NaiveDate::parse_from_str(week_start.trim(), DATE_FORMAT)
        .map_err(|_| CalendarError::InvalidDateFormat(week_start.to_string()))?;
    day_span(start, 7)
}

fn day_span(start: NaiveDate, days: u64) -> Result<(String, String)> {
    let end = start
        .checked_add_days(Days::new(days))
        .ok_or_else(|| CalendarError::InvalidDateFormat(start.to_string()))?;
    Ok((midnight(start), midnight(end)))
}

fn midnight(day: NaiveDate) -> String {
    format!("{} 00:00", day.format(DATE_FORMAT))
}

fn parse_input(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();
    for format in INPUT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(|day| day.and_time(NaiveTime::MIN))
        .map_err(|_| CalendarError::InvalidDateFormat(input.to_string()))
}

fn resolve<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Tz>> {
    let naive = parse_input(input)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => Ok(instant),
        // DST fall-back: the wall-clock time occurs twice, take the first.
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(CalendarError::InvalidDateFormat(format!(
            "{} does not exist in the local time zone",
            input.trim()
        ))),
    }
}

fn render<Tz: TimeZone>(instant: &DateTime<Tz>) -> HostDateLiteral {
    HostDateLiteral(instant.naive_local().format(HOST_FORMAT).to_string())
}
