// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! macOS Calendar automation core.
//!
//! Every operation is turned into AppleScript text, run through `osascript`,
//! and the single-line reply is decoded back into records. Dates go through
//! [`date`], script text through [`script`], process execution through
//! [`executor`], reply decoding through [`parser`]. [`engine`] composes them
//! and [`report`] renders what the engine returns.

pub mod date;
pub mod engine;
pub mod executor;
pub mod parser;
pub mod report;
pub mod script;

pub use date::{Clock, FixedClock, HostDateLiteral, SystemClock};
pub use engine::OperationEngine;
pub use executor::{OsascriptRunner, ScriptRunner};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised anywhere in the command pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// A date/time argument did not parse to a valid local instant.
    #[error("invalid date format: {0} (expected YYYY-MM-DD HH:MM)")]
    InvalidDateFormat(String),

    /// The end of an event is not strictly after its start.
    #[error("invalid date range: end {end} is not after start {start}")]
    InvalidDateRange { start: String, end: String },

    /// An argument is present but unusable (e.g. an empty keyword).
    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// `osascript` failed, could not be started, or timed out.
    #[error("AppleScript execution failed: {0}")]
    Execution(String),

    /// Calendar replied with text that does not match the expected layout.
    #[error("malformed Calendar output: {0}")]
    MalformedResult(String),
}

pub type Result<T> = std::result::Result<T, CalendarError>;

/// One event property, as it appears in a `|`-separated reply segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Title,
    Start,
    End,
    Description,
    Location,
}

/// Field order for day listings and searches.
pub const DAY_FIELDS: [EventField; 5] = [
    EventField::Title,
    EventField::Start,
    EventField::End,
    EventField::Description,
    EventField::Location,
];

/// Field order for week listings (no description).
pub const WEEK_FIELDS: [EventField; 4] = [
    EventField::Title,
    EventField::Start,
    EventField::End,
    EventField::Location,
];

/// An event as reported by Calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub title: String,
    pub start: String,
    pub end: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// A create request before script synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub calendar: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub location: String,
}

/// Moves every event whose title contains `keyword` to new start/end times
/// on the target date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimeCorrection {
    pub keyword: String,
    pub new_start_time: String,
    pub new_end_time: String,
}

/// Result of one unit inside a batch or keyword operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub label: String,
    pub succeeded: bool,
    pub detail: String,
}

impl OperationOutcome {
    pub fn success(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            succeeded: true,
            detail: detail.into(),
        }
    }

    pub fn failure(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            succeeded: false,
            detail: detail.into(),
        }
    }
}

/// Rejects empty substrings: an empty keyword would match every event.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CalendarError::InvalidArgument {
            field,
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = CalendarError::InvalidDateFormat("2025-13-01".into());
        assert!(err.to_string().contains("2025-13-01"));

        let err = CalendarError::Execution("Can't get calendar \"Nope\".".into());
        assert!(err.to_string().contains("Can't get calendar"));
    }

    #[test]
    fn empty_values_are_rejected() {
        assert!(require_non_empty("keyword", "standup").is_ok());
        let err = require_non_empty("keyword", "   ").unwrap_err();
        assert!(matches!(err, CalendarError::InvalidArgument { field: "keyword", .. }));
    }

    #[test]
    fn time_correction_deserializes_camel_case() {
        let correction: TimeCorrection = serde_json::from_value(serde_json::json!({
            "keyword": "Standup",
            "newStartTime": "09:00",
            "newEndTime": "09:30"
        }))
        .unwrap();
        assert_eq!(correction.new_start_time, "09:00");
        assert_eq!(correction.new_end_time, "09:30");
    }
}
