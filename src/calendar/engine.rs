// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! The calendar operations.
//!
//! Every operation builds its script(s), runs them strictly one after the
//! other through the injected [`ScriptRunner`] and decodes the reply. Batch
//! and keyword operations capture failures per item and keep going.

use super::date::{today_bounds, week_bounds, Clock};
use super::executor::ScriptRunner;
use super::parser::{parse_count, parse_events, parse_names};
use super::report::{
    BatchReport, CalendarList, CorrectionOutcome, CorrectionReport, DeleteReport, EventCreated,
    EventListing, ListingScope,
};
use super::script::CalendarCommand;
use super::{require_non_empty, EventDraft, OperationOutcome, Result, TimeCorrection};
use super::{DAY_FIELDS, WEEK_FIELDS};
use std::sync::Arc;

pub struct OperationEngine {
    runner: Arc<dyn ScriptRunner>,
    clock: Arc<dyn Clock>,
}

impl OperationEngine {
    pub fn new(runner: Arc<dyn ScriptRunner>, clock: Arc<dyn Clock>) -> Self {
        Self { runner, clock }
    }

    async fn execute(&self, command: CalendarCommand<'_>) -> Result<String> {
        let script = command.build()?;
        tracing::debug!(bytes = script.len(), "Running AppleScript");
        self.runner.run(&script).await
    }

    /// Names of every calendar Calendar knows about.
    pub async fn list_calendars(&self) -> Result<CalendarList> {
        let raw = self.execute(CalendarCommand::ListCalendars).await?;
        Ok(CalendarList {
            names: parse_names(&raw),
        })
    }

    /// Create one event. The calendar is not looked up first; a missing
    /// calendar surfaces as an execution error.
    pub async fn create_event(&self, draft: EventDraft) -> Result<EventCreated> {
        require_non_empty("title", &draft.title)?;
        self.execute(CalendarCommand::CreateEvent(&draft)).await?;
        tracing::info!(calendar = %draft.calendar, title = %draft.title, "Event created");
        Ok(EventCreated { draft })
    }

    /// Create each draft independently, in order. A failing item is recorded
    /// and the next one still runs.
    pub async fn create_batch_events(&self, calendar: &str, drafts: &[EventDraft]) -> BatchReport {
        let mut outcomes = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let result = match require_non_empty("title", &draft.title) {
                Ok(()) => self
                    .execute(CalendarCommand::CreateEvent(draft))
                    .await
                    .map(|_| ()),
                Err(e) => Err(e),
            };
            let outcome = match result {
                Ok(()) => OperationOutcome::success(draft.title.clone(), draft.start_date.clone()),
                Err(e) => {
                    tracing::warn!(title = %draft.title, error = %e, "Batch item failed");
                    OperationOutcome::failure(draft.title.clone(), e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let report = BatchReport {
            calendar: calendar.to_string(),
            outcomes,
        };
        tracing::info!(
            calendar,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch create finished"
        );
        report
    }

    /// Delete events whose title contains `keyword`. Without `confirm` this
    /// only describes what would be deleted and runs nothing.
    pub async fn delete_events_by_keyword(
        &self,
        calendar: &str,
        keyword: &str,
        confirm: bool,
    ) -> Result<DeleteReport> {
        require_non_empty("keyword", keyword)?;
        if !confirm {
            return Ok(DeleteReport::AwaitingConfirmation {
                calendar: calendar.to_string(),
                keyword: keyword.to_string(),
            });
        }

        let raw = self
            .execute(CalendarCommand::DeleteByKeyword { calendar, keyword })
            .await?;
        let count = parse_count(&raw)?;
        tracing::info!(calendar, keyword, count, "Events deleted");
        Ok(DeleteReport::Deleted {
            calendar: calendar.to_string(),
            keyword: keyword.to_string(),
            count,
        })
    }

    /// Events starting in `[today 00:00, tomorrow 00:00)`.
    pub async fn list_today_events(&self, calendar: &str) -> Result<EventListing> {
        let (from, to) = today_bounds(self.clock.as_ref())?;
        let raw = self
            .execute(CalendarCommand::ListBetween {
                calendar,
                from: &from,
                to: &to,
                fields: &DAY_FIELDS,
            })
            .await?;
        Ok(EventListing {
            calendar: calendar.to_string(),
            scope: ListingScope::Today,
            records: parse_events(&raw, &DAY_FIELDS)?,
        })
    }

    /// Events starting in `[weekStart 00:00, weekStart + 7 days 00:00)`.
    pub async fn list_week_events(&self, calendar: &str, week_start: &str) -> Result<EventListing> {
        let (from, to) = week_bounds(week_start)?;
        let raw = self
            .execute(CalendarCommand::ListBetween {
                calendar,
                from: &from,
                to: &to,
                fields: &WEEK_FIELDS,
            })
            .await?;
        Ok(EventListing {
            calendar: calendar.to_string(),
            scope: ListingScope::Week {
                week_start: week_start.trim().to_string(),
            },
            records: parse_events(&raw, &WEEK_FIELDS)?,
        })
    }

    /// Events whose title or description contains `query`.
    pub async fn search_events(&self, calendar: &str, query: &str) -> Result<EventListing> {
        require_non_empty("query", query)?;
        let raw = self
            .execute(CalendarCommand::Search {
                calendar,
                query,
                fields: &DAY_FIELDS,
            })
            .await?;
        Ok(EventListing {
            calendar: calendar.to_string(),
            scope: ListingScope::Search {
                query: query.to_string(),
            },
            records: parse_events(&raw, &DAY_FIELDS)?,
        })
    }

    /// Apply each correction in turn on `date_pattern` (`YYYY-MM-DD`). One
    /// failing correction never stops the next.
    pub async fn fix_event_times(
        &self,
        calendar: &str,
        date_pattern: &str,
        corrections: &[TimeCorrection],
    ) -> CorrectionReport {
        let date_pattern = date_pattern.trim();
        let mut outcomes = Vec::with_capacity(corrections.len());
        for correction in corrections {
            let outcome = match self.apply_correction(calendar, date_pattern, correction).await {
                Ok(count) => CorrectionOutcome::fixed(correction, count),
                Err(e) => {
                    tracing::warn!(keyword = %correction.keyword, error = %e, "Correction failed");
                    CorrectionOutcome::failed(correction, &e)
                }
            };
            outcomes.push(outcome);
        }

        let report = CorrectionReport {
            calendar: calendar.to_string(),
            date_pattern: date_pattern.to_string(),
            outcomes,
        };
        tracing::info!(
            calendar,
            fixed = report.events_fixed(),
            failed = report.failed_corrections(),
            "Time corrections finished"
        );
        report
    }

    async fn apply_correction(
        &self,
        calendar: &str,
        date_pattern: &str,
        correction: &TimeCorrection,
    ) -> Result<u64> {
        require_non_empty("keyword", &correction.keyword)?;
        let start = format!("{date_pattern} {}", correction.new_start_time.trim());
        let end = format!("{date_pattern} {}", correction.new_end_time.trim());
        let raw = self
            .execute(CalendarCommand::FixTimes {
                calendar,
                keyword: &correction.keyword,
                start: &start,
                end: &end,
            })
            .await?;
        parse_count(&raw)
    }
}
