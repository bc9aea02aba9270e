// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! AppleScript synthesis for every Calendar command.
//!
//! User-supplied text (titles, descriptions, locations, keywords, queries,
//! calendar names) only ever reaches the script through
//! [`escape_applescript_string`], so a stray `"` cannot close the literal
//! and a newline cannot start a new statement.
//!
//! List-style scripts reply with one line: items joined by `", "`, fields
//! joined by `"|"`, dates rendered by the `hostDate` handler in the same
//! `M/D/YYYY h:mm:ss AM|PM` grammar used for the `date "..."` literals.
//! Text values go through `fieldText`, which rewrites `"|"` to `"/"` and
//! `", "` to `","` so a value can never split its own row.

use super::date::{normalize, normalize_range};
use super::{EventDraft, EventField, Result};

/// Handlers shared by every script that reads event properties.
const PRELUDE: &str = r#"on hostDate(d)
	set h to hours of d
	set suffix to "AM"
	if h is greater than or equal to 12 then set suffix to "PM"
	set h to h mod 12
	if h = 0 then set h to 12
	set mm to text -2 thru -1 of ("0" & (minutes of d))
	set ss to text -2 thru -1 of ("0" & (seconds of d))
	return ((month of d as integer) as text) & "/" & (day of d) & "/" & (year of d) & " " & h & ":" & mm & ":" & ss & " " & suffix
end hostDate

on textOrEmpty(v)
	if v is missing value then return ""
	return v as text
end textOrEmpty

on replaceText(t, search, replacement)
	set saved to AppleScript's text item delimiters
	set AppleScript's text item delimiters to search
	set parts to text items of t
	set AppleScript's text item delimiters to replacement
	set t to parts as text
	set AppleScript's text item delimiters to saved
	return t
end replaceText

on fieldText(v)
	set t to my textOrEmpty(v)
	set t to my replaceText(t, "|", "/")
	return my replaceText(t, ", ", ",")
end fieldText

on joinItems(theItems)
	set AppleScript's text item delimiters to ", "
	set joined to theItems as text
	set AppleScript's text item delimiters to ""
	return joined
end joinItems
"#;

/// Escape a value for use inside an AppleScript double-quoted literal.
pub fn escape_applescript_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\0' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// One Calendar command with its arguments. Date arguments are raw
/// `YYYY-MM-DD HH:MM` inputs; [`CalendarCommand::build`] normalizes them.
#[derive(Debug, Clone, Copy)]
pub enum CalendarCommand<'a> {
    ListCalendars,
    CreateEvent(&'a EventDraft),
    DeleteByKeyword {
        calendar: &'a str,
        keyword: &'a str,
    },
    ListBetween {
        calendar: &'a str,
        from: &'a str,
        to: &'a str,
        fields: &'a [EventField],
    },
    Search {
        calendar: &'a str,
        query: &'a str,
        fields: &'a [EventField],
    },
    FixTimes {
        calendar: &'a str,
        keyword: &'a str,
        start: &'a str,
        end: &'a str,
    },
}

impl CalendarCommand<'_> {
    /// Produce the script text, or fail if a date argument does not normalize.
    pub fn build(&self) -> Result<String> {
        match *self {
            Self::ListCalendars => Ok(list_calendars()),
            Self::CreateEvent(draft) => create_event(draft),
            Self::DeleteByKeyword { calendar, keyword } => Ok(delete_by_keyword(calendar, keyword)),
            Self::ListBetween {
                calendar,
                from,
                to,
                fields,
            } => list_between(calendar, from, to, fields),
            Self::Search {
                calendar,
                query,
                fields,
            } => Ok(search(calendar, query, fields)),
            Self::FixTimes {
                calendar,
                keyword,
                start,
                end,
            } => fix_times(calendar, keyword, start, end),
        }
    }
}

fn list_calendars() -> String {
    format!(
        r#"{PRELUDE}
tell application "Calendar"
	set calendarNames to {{}}
	repeat with aName in (name of calendars)
		set end of calendarNames to my fieldText(aName)
	end repeat
end tell
return my joinItems(calendarNames)
"#
    )
}

fn create_event(draft: &EventDraft) -> Result<String> {
    let (start, end) = normalize_range(&draft.start_date, &draft.end_date)?;
    Ok(format!(
        r#"tell application "Calendar"
	set theCalendar to calendar "{calendar}"
	set startDate to date "{start}"
	set endDate to date "{end}"
	make new event at end of events of theCalendar with properties {{summary:"{title}", start date:startDate, end date:endDate, description:"{description}", location:"{location}"}}
end tell
"#,
        calendar = escape_applescript_string(&draft.calendar),
        title = escape_applescript_string(&draft.title),
        description = escape_applescript_string(&draft.description),
        location = escape_applescript_string(&draft.location),
    ))
}

fn delete_by_keyword(calendar: &str, keyword: &str) -> String {
    // Walk backwards so deleting an event never shifts the ones not yet visited.
    format!(
        r#"{PRELUDE}
tell application "Calendar"
	set theCalendar to calendar "{calendar}"
	set allEvents to every event of theCalendar
	set deletedCount to 0
	considering case
		repeat with i from (count of allEvents) to 1 by -1
			set anEvent to item i of allEvents
			if (my textOrEmpty(summary of anEvent)) contains "{keyword}" then
				delete anEvent
				set deletedCount to deletedCount + 1
			end if
		end repeat
	end considering
	return deletedCount
end tell
"#,
        calendar = escape_applescript_string(calendar),
        keyword = escape_applescript_string(keyword),
    )
}

fn list_between(calendar: &str, from: &str, to: &str, fields: &[EventField]) -> Result<String> {
    let from = normalize(from)?;
    let to = normalize(to)?;
    Ok(format!(
        r#"{PRELUDE}
tell application "Calendar"
	set theCalendar to calendar "{calendar}"
	set rangeStart to date "{from}"
	set rangeEnd to date "{to}"
	set rangeEvents to (every event of theCalendar whose start date is greater than or equal to rangeStart and start date is less than rangeEnd)
	set eventList to {{}}
	repeat with anEvent in rangeEvents
		set end of eventList to {row}
	end repeat
end tell
return my joinItems(eventList)
"#,
        calendar = escape_applescript_string(calendar),
        row = row_expression(fields),
    ))
}

fn search(calendar: &str, query: &str, fields: &[EventField]) -> String {
    format!(
        r#"{PRELUDE}
tell application "Calendar"
	set theCalendar to calendar "{calendar}"
	set eventList to {{}}
	considering case
		repeat with anEvent in (every event of theCalendar)
			if (my textOrEmpty(summary of anEvent)) contains "{query}" or (my textOrEmpty(description of anEvent)) contains "{query}" then
				set end of eventList to {row}
			end if
		end repeat
	end considering
end tell
return my joinItems(eventList)
"#,
        calendar = escape_applescript_string(calendar),
        query = escape_applescript_string(query),
        row = row_expression(fields),
    )
}

fn fix_times(calendar: &str, keyword: &str, start: &str, end: &str) -> Result<String> {
    let (start, end) = normalize_range(start, end)?;
    Ok(format!(
        r#"{PRELUDE}
tell application "Calendar"
	set theCalendar to calendar "{calendar}"
	set newStart to date "{start}"
	set newEnd to date "{end}"
	set fixedCount to 0
	considering case
		repeat with anEvent in (every event of theCalendar)
			if (my textOrEmpty(summary of anEvent)) contains "{keyword}" then
				set start date of anEvent to newStart
				set end date of anEvent to newEnd
				set fixedCount to fixedCount + 1
			end if
		end repeat
	end considering
	return fixedCount
end tell
"#,
        calendar = escape_applescript_string(calendar),
        keyword = escape_applescript_string(keyword),
    ))
}

/// `a & "|" & b & ...` for the requested fields, in order.
fn row_expression(fields: &[EventField]) -> String {
    fields
        .iter()
        .map(|field| match field {
            EventField::Title => "my fieldText(summary of anEvent)",
            EventField::Start => "my hostDate(start date of anEvent)",
            EventField::End => "my hostDate(end date of anEvent)",
            EventField::Description => "my fieldText(description of anEvent)",
            EventField::Location => "my fieldText(location of anEvent)",
        })
        .collect::<Vec<_>>()
        .join(" & \"|\" & ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{CalendarError, DAY_FIELDS, WEEK_FIELDS};

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            calendar: "Work".into(),
            title: title.into(),
            start_date: "2025-07-10 09:00".into(),
            end_date: "2025-07-10 10:00".into(),
            description: String::new(),
            location: "Room A".into(),
        }
    }

    /// Every `"` in `script` that is not preceded by a backslash.
    fn unescaped_quotes(script: &str) -> usize {
        let mut count = 0;
        let mut escaped = false;
        for c in script.chars() {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => count += 1,
                _ => escaped = false,
            }
        }
        count
    }

    #[test]
    fn escape_handles_quotes_backslashes_and_controls() {
        assert_eq!(escape_applescript_string("plain"), "plain");
        assert_eq!(escape_applescript_string(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_applescript_string(r"C:\temp"), r"C:\\temp");
        assert_eq!(escape_applescript_string("a\nb\rc\td"), r"a\nb\rc\td");
        assert_eq!(escape_applescript_string("nul\0byte"), "nulbyte");
        assert_eq!(escape_applescript_string("会议 ☕"), "会议 ☕");
    }

    #[test]
    fn injected_title_cannot_close_the_literal() {
        let hostile = "x\"}\ndo shell script \"rm -rf ~\"\n--";
        let benign = CalendarCommand::CreateEvent(&draft("x")).build().unwrap();
        let script = CalendarCommand::CreateEvent(&draft(hostile)).build().unwrap();

        assert_eq!(unescaped_quotes(&script), unescaped_quotes(&benign));
        assert!(!script.contains("\ndo shell script"));
        assert!(script.contains(r#"summary:"x\"}\ndo shell script \"rm -rf ~\"\n--""#));
    }

    #[test]
    fn create_event_uses_host_literals() {
        let script = CalendarCommand::CreateEvent(&draft("Standup")).build().unwrap();
        assert!(script.contains(r#"calendar "Work""#));
        assert!(script.contains(r#"date "7/10/2025 9:00:00 AM""#));
        assert!(script.contains(r#"date "7/10/2025 10:00:00 AM""#));
        assert!(script.contains(r#"summary:"Standup""#));
        assert!(script.contains(r#"location:"Room A""#));
    }

    #[test]
    fn create_event_rejects_bad_dates() {
        let mut bad = draft("Standup");
        bad.start_date = "soon".into();
        let err = CalendarCommand::CreateEvent(&bad).build().unwrap_err();
        assert!(matches!(err, CalendarError::InvalidDateFormat(_)));

        let mut inverted = draft("Standup");
        inverted.end_date = "2025-07-10 08:00".into();
        let err = CalendarCommand::CreateEvent(&inverted).build().unwrap_err();
        assert!(matches!(err, CalendarError::InvalidDateRange { .. }));
    }

    #[test]
    fn delete_walks_backwards_case_sensitively() {
        let script = CalendarCommand::DeleteByKeyword {
            calendar: "Work",
            keyword: "Sync \"A\"",
        }
        .build()
        .unwrap();
        assert!(script.contains("to 1 by -1"));
        assert!(script.contains("considering case"));
        assert!(script.contains(r#"contains "Sync \"A\"""#));
        assert!(script.contains("return deletedCount"));
    }

    #[test]
    fn week_listing_is_half_open_and_skips_description() {
        let script = CalendarCommand::ListBetween {
            calendar: "Work",
            from: "2025-07-07 00:00",
            to: "2025-07-14 00:00",
            fields: &WEEK_FIELDS,
        }
        .build()
        .unwrap();
        assert!(script.contains(r#"date "7/7/2025 12:00:00 AM""#));
        assert!(script.contains(r#"date "7/14/2025 12:00:00 AM""#));
        assert!(script.contains("start date is less than rangeEnd"));
        assert!(script.contains("start date is greater than or equal to rangeStart"));
        assert!(!script.contains("description of anEvent"));
        assert!(script.contains("location of anEvent"));
    }

    #[test]
    fn search_matches_title_or_description() {
        let script = CalendarCommand::Search {
            calendar: "Personal",
            query: "dentist",
            fields: &DAY_FIELDS,
        }
        .build()
        .unwrap();
        assert!(script.contains(r#"(my textOrEmpty(summary of anEvent)) contains "dentist" or (my textOrEmpty(description of anEvent)) contains "dentist""#));
        assert!(script.contains("my joinItems(eventList)"));
    }

    #[test]
    fn fix_times_overwrites_both_dates() {
        let script = CalendarCommand::FixTimes {
            calendar: "Work",
            keyword: "Review",
            start: "2025-07-10 14:00",
            end: "2025-07-10 15:30",
        }
        .build()
        .unwrap();
        assert!(script.contains(r#"set newStart to date "7/10/2025 2:00:00 PM""#));
        assert!(script.contains(r#"set newEnd to date "7/10/2025 3:30:00 PM""#));
        assert!(script.contains("set start date of anEvent to newStart"));
        assert!(script.contains("return fixedCount"));
    }

    #[test]
    fn listed_values_cannot_contain_separators() {
        assert!(PRELUDE.contains(r#"my replaceText(t, "|", "/")"#));
        assert!(PRELUDE.contains(r#"my replaceText(t, ", ", ",")"#));

        let script = CalendarCommand::ListBetween {
            calendar: "Work",
            from: "2025-07-07 00:00",
            to: "2025-07-14 00:00",
            fields: &DAY_FIELDS,
        }
        .build()
        .unwrap();
        assert!(script.contains("my fieldText(location of anEvent)"));
        assert!(script.contains("my fieldText(description of anEvent)"));
        assert!(!script.contains("my textOrEmpty(location of anEvent)"));

        let names = CalendarCommand::ListCalendars.build().unwrap();
        assert!(names.contains("my fieldText(aName)"));
    }

    #[test]
    fn matching_uses_unrewritten_text() {
        let script = CalendarCommand::DeleteByKeyword {
            calendar: "Work",
            keyword: "A, B",
        }
        .build()
        .unwrap();
        assert!(script.contains(r#"(my textOrEmpty(summary of anEvent)) contains "A, B""#));
    }

    #[test]
    fn row_expression_follows_field_order() {
        let row = row_expression(&WEEK_FIELDS);
        assert_eq!(
            row,
            "my fieldText(summary of anEvent) & \"|\" & my hostDate(start date of anEvent) & \"|\" & my hostDate(end date of anEvent) & \"|\" & my fieldText(location of anEvent)"
        );
    }
}
