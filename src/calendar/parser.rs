// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Decoding of Calendar's single-line replies.

use super::{CalendarError, EventField, EventRecord, Result};

pub const ITEM_SEPARATOR: &str = ", ";
pub const FIELD_SEPARATOR: char = '|';

/// `""` is how osascript prints an empty string result.
fn is_empty_reply(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "\"\""
}

/// Split a list-style reply into event records with the given field order.
///
/// An item with a different number of fields than `fields` makes the whole
/// reply malformed; partial records are never padded.
pub fn parse_events(raw: &str, fields: &[EventField]) -> Result<Vec<EventRecord>> {
    if is_empty_reply(raw) {
        return Ok(Vec::new());
    }

    raw.trim()
        .split(ITEM_SEPARATOR)
        .map(|item| parse_record(item, fields))
        .collect()
}

fn parse_record(item: &str, fields: &[EventField]) -> Result<EventRecord> {
    let values: Vec<&str> = item.split(FIELD_SEPARATOR).collect();
    if values.len() != fields.len() {
        return Err(CalendarError::MalformedResult(format!(
            "expected {} fields, found {} in {item:?}",
            fields.len(),
            values.len()
        )));
    }

    let mut record = EventRecord {
        title: String::new(),
        start: String::new(),
        end: String::new(),
        description: None,
        location: None,
    };
    for (field, value) in fields.iter().zip(values) {
        match field {
            EventField::Title => record.title = value.to_string(),
            EventField::Start => record.start = value.to_string(),
            EventField::End => record.end = value.to_string(),
            EventField::Description => record.description = optional(value),
            EventField::Location => record.location = optional(value),
        }
    }
    Ok(record)
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "missing value" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Calendar names from `name of calendars`.
pub fn parse_names(raw: &str) -> Vec<String> {
    if is_empty_reply(raw) {
        return Vec::new();
    }
    raw.trim()
        .split(ITEM_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// The integer a delete or fix script returns.
pub fn parse_count(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    trimmed
        .parse::<u64>()
        .map_err(|_| CalendarError::MalformedResult(format!("expected a count, got {trimmed:?}")))
}
