// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Human-readable results returned by the engine.
//!
//! Each operation returns a typed report; its `Display` impl is the text the
//! tool hands back to the caller.

use super::{CalendarError, EventDraft, EventRecord, OperationOutcome, TimeCorrection};
use std::fmt;

/// `list-calendars`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarList {
    pub names: Vec<String>,
}

impl fmt::Display for CalendarList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "📅 Available calendars ({}):", self.names.len())?;
        for name in &self.names {
            write!(f, "\n• {name}")?;
        }
        Ok(())
    }
}

/// `create-event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCreated {
    pub draft: EventDraft,
}

impl fmt::Display for EventCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.draft;
        write!(
            f,
            "✅ Event created\n📅 Calendar: {}\n📝 Title: {}\n🕒 Time: {} - {}\n📍 Location: {}\n📄 Description: {}",
            d.calendar,
            d.title,
            d.start_date,
            d.end_date,
            or_none(&d.location),
            or_none(&d.description)
        )
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        "none"
    } else {
        value
    }
}

/// `create-batch-events`: one outcome per input item, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub calendar: String,
    pub outcomes: Vec<OperationOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "📊 Batch result for {}:\nSucceeded: {}\nFailed: {}\n\nDetails:",
            self.calendar,
            self.succeeded(),
            self.failed()
        )?;
        for outcome in &self.outcomes {
            if outcome.succeeded {
                write!(f, "\n✅ {} - {}", outcome.label, outcome.detail)?;
            } else {
                write!(f, "\n❌ {} - failed: {}", outcome.label, outcome.detail)?;
            }
        }
        Ok(())
    }
}

/// `delete-events-by-keyword`: the two states of the confirmation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteReport {
    /// Nothing was executed; the caller must repeat with `confirm: true`.
    AwaitingConfirmation { calendar: String, keyword: String },
    /// The deletion ran and Calendar reported `count` removed events.
    Deleted {
        calendar: String,
        keyword: String,
        count: u64,
    },
}

impl fmt::Display for DeleteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingConfirmation { calendar, keyword } => write!(
                f,
                "⚠️ Please confirm the deletion!\nThis deletes every event in calendar \"{calendar}\" whose title contains \"{keyword}\".\nTo proceed, call again with confirm: true"
            ),
            Self::Deleted {
                calendar,
                keyword,
                count,
            } => write!(
                f,
                "🗑️ Deletion complete!\nDeleted {count} event(s) containing \"{keyword}\" from \"{calendar}\""
            ),
        }
    }
}

/// What an [`EventListing`] was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingScope {
    Today,
    Week { week_start: String },
    Search { query: String },
}

/// `list-today-events`, `list-week-events` and `search-events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventListing {
    pub calendar: String,
    pub scope: ListingScope,
    pub records: Vec<EventRecord>,
}

impl fmt::Display for EventListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let calendar = &self.calendar;
        let count = self.records.len();
        if self.records.is_empty() {
            return match &self.scope {
                ListingScope::Today => write!(f, "📅 {calendar} - no events today"),
                ListingScope::Week { week_start } => {
                    write!(f, "📅 {calendar} - no events in the week of {week_start}")
                }
                ListingScope::Search { query } => {
                    write!(f, "🔍 No events containing \"{query}\" found in {calendar}")
                }
            };
        }

        match &self.scope {
            ListingScope::Today => write!(f, "📅 {calendar} - today's events ({count}):")?,
            ListingScope::Week { week_start } => {
                write!(f, "📅 {calendar} - events in the week of {week_start} ({count}):")?
            }
            ListingScope::Search { query } => write!(
                f,
                "🔍 Found {count} event(s) containing \"{query}\" in {calendar}:"
            )?,
        }
        for record in &self.records {
            write!(f, "\n\n{}", RecordView(record))?;
        }
        Ok(())
    }
}

struct RecordView<'a>(&'a EventRecord);

impl fmt::Display for RecordView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        write!(f, "📝 {}\n🕒 {} - {}", r.title, r.start, r.end)?;
        if let Some(location) = &r.location {
            write!(f, "\n📍 {location}")?;
        }
        if let Some(description) = &r.description {
            write!(f, "\n📄 {description}")?;
        }
        Ok(())
    }
}

/// One correction of `fix-event-times`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionOutcome {
    pub outcome: OperationOutcome,
    /// Events moved; zero for "no match" and for failures.
    pub fixed: u64,
}

impl CorrectionOutcome {
    pub fn fixed(correction: &TimeCorrection, count: u64) -> Self {
        let detail = if count == 0 {
            "no match".to_string()
        } else {
            format!(
                "fixed {count} event(s) to {}-{}",
                correction.new_start_time, correction.new_end_time
            )
        };
        Self {
            outcome: OperationOutcome::success(correction.keyword.clone(), detail),
            fixed: count,
        }
    }

    pub fn failed(correction: &TimeCorrection, error: &CalendarError) -> Self {
        Self {
            outcome: OperationOutcome::failure(correction.keyword.clone(), error.to_string()),
            fixed: 0,
        }
    }

    pub fn is_no_match(&self) -> bool {
        self.outcome.succeeded && self.fixed == 0
    }
}

/// `fix-event-times`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionReport {
    pub calendar: String,
    pub date_pattern: String,
    pub outcomes: Vec<CorrectionOutcome>,
}

impl CorrectionReport {
    pub fn events_fixed(&self) -> u64 {
        self.outcomes.iter().map(|o| o.fixed).sum()
    }

    pub fn failed_corrections(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.outcome.succeeded).count()
    }
}

impl fmt::Display for CorrectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🔧 Time correction result for {} on {}:\nEvents fixed: {}\nFailed corrections: {}\n\nDetails:",
            self.calendar,
            self.date_pattern,
            self.events_fixed(),
            self.failed_corrections()
        )?;
        for item in &self.outcomes {
            let o = &item.outcome;
            let marker = if !o.succeeded {
                "❌"
            } else if item.is_no_match() {
                "⚠️"
            } else {
                "✅"
            };
            write!(f, "\n{marker} \"{}\" - {}", o.label, o.detail)?;
        }
        Ok(())
    }
}
