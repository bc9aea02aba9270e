// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Calendar tools: one `Tool` per engine operation.
//!
//! Arguments arrive already checked against `parameters_schema()` and are
//! decoded into typed structs here. Calendar failures come back as a failed
//! `ToolResult`, never as an `Err`. Array items are only shape-checked by
//! the schema; their dates are validated per item by the engine so one bad
//! item never rejects its siblings.

use crate::calendar::{self, EventDraft, OperationEngine, TimeCorrection};
use crate::config::CalendarsConfig;
use crate::tools::{Tool, ToolResult};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Display;
use std::sync::Arc;

/// Version of the tool catalog below. Bump when a tool is added or a schema
/// changes shape.
pub const CATALOG_VERSION: &str = "2.1";

const DATE_TIME_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}(:\d{2})?$";
const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";

fn decode<T: DeserializeOwned>(tool: &str, args: Value) -> anyhow::Result<T> {
    serde_json::from_value(args).with_context(|| format!("Invalid arguments for '{tool}'"))
}

fn render<T: Display>(result: calendar::Result<T>) -> ToolResult {
    match result {
        Ok(report) => ToolResult::ok(report.to_string()),
        Err(e) => ToolResult::failed(e.to_string()),
    }
}

fn calendar_property(default: &str) -> Value {
    json!({
        "type": "string",
        "description": "Calendar name",
        "default": default
    })
}

// ── list-calendars ──────────────────────────────────────────────

pub struct ListCalendarsTool {
    engine: Arc<OperationEngine>,
}

impl ListCalendarsTool {
    pub fn new(engine: Arc<OperationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for ListCalendarsTool {
    fn name(&self) -> &str {
        "list-calendars"
    }

    fn description(&self) -> &str {
        "List the names of all calendars in macOS Calendar."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value) -> anyhow::Result<ToolResult> {
        Ok(render(self.engine.list_calendars().await))
    }
}

// ── create-event ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateEventArgs {
    calendar: Option<String>,
    title: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: String,
}

pub struct CreateEventTool {
    engine: Arc<OperationEngine>,
    default_calendar: String,
}

impl CreateEventTool {
    pub fn new(engine: Arc<OperationEngine>, default_calendar: impl Into<String>) -> Self {
        Self {
            engine,
            default_calendar: default_calendar.into(),
        }
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn name(&self) -> &str {
        "create-event"
    }

    fn description(&self) -> &str {
        "Create one event in macOS Calendar. Dates use YYYY-MM-DD HH:MM in local time; the end must be after the start."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "calendar": calendar_property(&self.default_calendar),
                "title": {"type": "string", "minLength": 1, "description": "Event title"},
                "startDate": {"type": "string", "pattern": DATE_TIME_PATTERN, "description": "Start, YYYY-MM-DD HH:MM"},
                "endDate": {"type": "string", "pattern": DATE_TIME_PATTERN, "description": "End, YYYY-MM-DD HH:MM"},
                "description": {"type": "string", "default": "", "description": "Event notes"},
                "location": {"type": "string", "default": "", "description": "Event location"}
            },
            "required": ["title", "startDate", "endDate"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let args: CreateEventArgs = decode(self.name(), args)?;
        let draft = EventDraft {
            calendar: args
                .calendar
                .unwrap_or_else(|| self.default_calendar.clone()),
            title: args.title,
            start_date: args.start_date,
            end_date: args.end_date,
            description: args.description,
            location: args.location,
        };
        Ok(render(self.engine.create_event(draft).await))
    }
}

// ── create-batch-events ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct BatchItem {
    title: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateBatchArgs {
    events: Vec<BatchItem>,
    calendar: Option<String>,
}

pub struct CreateBatchEventsTool {
    engine: Arc<OperationEngine>,
    default_calendar: String,
}

impl CreateBatchEventsTool {
    pub fn new(engine: Arc<OperationEngine>, default_calendar: impl Into<String>) -> Self {
        Self {
            engine,
            default_calendar: default_calendar.into(),
        }
    }
}

#[async_trait]
impl Tool for CreateBatchEventsTool {
    fn name(&self) -> &str {
        "create-batch-events"
    }

    fn description(&self) -> &str {
        "Create several events one after another. A failing event is reported and the rest are still created."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "events": {
                    "type": "array",
                    "description": "Events to create, in order",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "startDate": {"type": "string", "description": "Start, YYYY-MM-DD HH:MM"},
                            "endDate": {"type": "string", "description": "End, YYYY-MM-DD HH:MM"},
                            "description": {"type": "string", "default": ""},
                            "location": {"type": "string", "default": ""}
                        },
                        "required": ["title", "startDate", "endDate"],
                        "additionalProperties": false
                    }
                },
                "calendar": calendar_property(&self.default_calendar)
            },
            "required": ["events"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let args: CreateBatchArgs = decode(self.name(), args)?;
        let calendar = args
            .calendar
            .unwrap_or_else(|| self.default_calendar.clone());
        let drafts: Vec<EventDraft> = args
            .events
            .into_iter()
            .map(|item| EventDraft {
                calendar: calendar.clone(),
                title: item.title,
                start_date: item.start_date,
                end_date: item.end_date,
                description: item.description,
                location: item.location,
            })
            .collect();

        let report = self.engine.create_batch_events(&calendar, &drafts).await;
        Ok(ToolResult::ok(report.to_string()))
    }
}

// ── delete-events-by-keyword ────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DeleteArgs {
    keyword: String,
    calendar: Option<String>,
    #[serde(default)]
    confirm: bool,
}

pub struct DeleteEventsByKeywordTool {
    engine: Arc<OperationEngine>,
    default_calendar: String,
}

impl DeleteEventsByKeywordTool {
    pub fn new(engine: Arc<OperationEngine>, default_calendar: impl Into<String>) -> Self {
        Self {
            engine,
            default_calendar: default_calendar.into(),
        }
    }
}

#[async_trait]
impl Tool for DeleteEventsByKeywordTool {
    fn name(&self) -> &str {
        "delete-events-by-keyword"
    }

    fn description(&self) -> &str {
        "Delete every event whose title contains the keyword (case-sensitive). Nothing is deleted unless confirm is true."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keyword": {"type": "string", "minLength": 1, "description": "Substring to match in event titles"},
                "calendar": calendar_property(&self.default_calendar),
                "confirm": {"type": "boolean", "default": false, "description": "Must be true to actually delete"}
            },
            "required": ["keyword"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let args: DeleteArgs = decode(self.name(), args)?;
        let calendar = args
            .calendar
            .unwrap_or_else(|| self.default_calendar.clone());
        Ok(render(
            self.engine
                .delete_events_by_keyword(&calendar, &args.keyword, args.confirm)
                .await,
        ))
    }
}

// ── list-today-events ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CalendarOnlyArgs {
    calendar: Option<String>,
}

pub struct ListTodayEventsTool {
    engine: Arc<OperationEngine>,
    default_calendar: String,
}

impl ListTodayEventsTool {
    pub fn new(engine: Arc<OperationEngine>, default_calendar: impl Into<String>) -> Self {
        Self {
            engine,
            default_calendar: default_calendar.into(),
        }
    }
}

#[async_trait]
impl Tool for ListTodayEventsTool {
    fn name(&self) -> &str {
        "list-today-events"
    }

    fn description(&self) -> &str {
        "List the events starting today in a calendar."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "calendar": calendar_property(&self.default_calendar)
            },
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let args: CalendarOnlyArgs = decode(self.name(), args)?;
        let calendar = args
            .calendar
            .unwrap_or_else(|| self.default_calendar.clone());
        Ok(render(self.engine.list_today_events(&calendar).await))
    }
}

// ── list-week-events ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct WeekArgs {
    week_start: String,
    calendar: Option<String>,
}

pub struct ListWeekEventsTool {
    engine: Arc<OperationEngine>,
    default_calendar: String,
}

impl ListWeekEventsTool {
    pub fn new(engine: Arc<OperationEngine>, default_calendar: impl Into<String>) -> Self {
        Self {
            engine,
            default_calendar: default_calendar.into(),
        }
    }
}

#[async_trait]
impl Tool for ListWeekEventsTool {
    fn name(&self) -> &str {
        "list-week-events"
    }

    fn description(&self) -> &str {
        "List the events starting in the seven days from weekStart (YYYY-MM-DD)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "weekStart": {"type": "string", "pattern": DATE_PATTERN, "description": "First day of the week, YYYY-MM-DD"},
                "calendar": calendar_property(&self.default_calendar)
            },
            "required": ["weekStart"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let args: WeekArgs = decode(self.name(), args)?;
        let calendar = args
            .calendar
            .unwrap_or_else(|| self.default_calendar.clone());
        Ok(render(
            self.engine
                .list_week_events(&calendar, &args.week_start)
                .await,
        ))
    }
}

// ── search-events ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SearchArgs {
    query: String,
    calendar: Option<String>,
}

pub struct SearchEventsTool {
    engine: Arc<OperationEngine>,
    default_calendar: String,
}

impl SearchEventsTool {
    pub fn new(engine: Arc<OperationEngine>, default_calendar: impl Into<String>) -> Self {
        Self {
            engine,
            default_calendar: default_calendar.into(),
        }
    }
}

#[async_trait]
impl Tool for SearchEventsTool {
    fn name(&self) -> &str {
        "search-events"
    }

    fn description(&self) -> &str {
        "Find events whose title or description contains the query (case-sensitive)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "minLength": 1, "description": "Text to look for"},
                "calendar": calendar_property(&self.default_calendar)
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let args: SearchArgs = decode(self.name(), args)?;
        let calendar = args
            .calendar
            .unwrap_or_else(|| self.default_calendar.clone());
        Ok(render(self.engine.search_events(&calendar, &args.query).await))
    }
}

// ── fix-event-times ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FixTimesArgs {
    calendar: String,
    date_pattern: String,
    corrections: Vec<TimeCorrection>,
}

pub struct FixEventTimesTool {
    engine: Arc<OperationEngine>,
}

impl FixEventTimesTool {
    pub fn new(engine: Arc<OperationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for FixEventTimesTool {
    fn name(&self) -> &str {
        "fix-event-times"
    }

    fn description(&self) -> &str {
        "Move events on one date to new times. Each correction rewrites every event whose title contains its keyword."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "calendar": {"type": "string", "description": "Calendar name"},
                "datePattern": {"type": "string", "pattern": DATE_PATTERN, "description": "Target date, YYYY-MM-DD"},
                "corrections": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "keyword": {"type": "string"},
                            "newStartTime": {"type": "string", "description": "HH:MM"},
                            "newEndTime": {"type": "string", "description": "HH:MM"}
                        },
                        "required": ["keyword", "newStartTime", "newEndTime"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["calendar", "datePattern", "corrections"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let args: FixTimesArgs = decode(self.name(), args)?;
        let report = self
            .engine
            .fix_event_times(&args.calendar, &args.date_pattern, &args.corrections)
            .await;
        Ok(ToolResult::ok(report.to_string()))
    }
}

/// The complete calendar catalog, in advertised order.
pub fn calendar_tools(
    engine: Arc<OperationEngine>,
    calendars: &CalendarsConfig,
) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(ListCalendarsTool::new(engine.clone())),
        Box::new(CreateEventTool::new(engine.clone(), &calendars.personal)),
        Box::new(CreateBatchEventsTool::new(engine.clone(), &calendars.work)),
        Box::new(DeleteEventsByKeywordTool::new(
            engine.clone(),
            &calendars.work,
        )),
        Box::new(ListTodayEventsTool::new(engine.clone(), &calendars.personal)),
        Box::new(ListWeekEventsTool::new(engine.clone(), &calendars.work)),
        Box::new(SearchEventsTool::new(engine.clone(), &calendars.personal)),
        Box::new(FixEventTimesTool::new(engine)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{CalendarError, FixedClock, ScriptRunner};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct EchoCount {
        reply: String,
        scripts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ScriptRunner for EchoCount {
        async fn run(&self, script: &str) -> calendar::Result<String> {
            self.scripts.lock().unwrap().push(script.to_string());
            if self.reply == "fail" {
                return Err(CalendarError::Execution("Can't get calendar.".into()));
            }
            Ok(self.reply.clone())
        }
    }

    fn tools_with(reply: &str) -> (Vec<Box<dyn Tool>>, Arc<EchoCount>) {
        let runner = Arc::new(EchoCount {
            reply: reply.into(),
            scripts: Mutex::new(Vec::new()),
        });
        let clock = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()));
        let engine = Arc::new(OperationEngine::new(runner.clone(), clock));
        (calendar_tools(engine, &CalendarsConfig::default()), runner)
    }

    fn find<'a>(tools: &'a [Box<dyn Tool>], name: &str) -> &'a dyn Tool {
        tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
            .unwrap()
    }

    #[test]
    fn catalog_has_eight_distinct_tools() {
        let (tools, _) = tools_with("");
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "list-calendars",
                "create-event",
                "create-batch-events",
                "delete-events-by-keyword",
                "list-today-events",
                "list-week-events",
                "search-events",
                "fix-event-times",
            ]
        );
    }

    #[test]
    fn schemas_are_closed_objects_with_descriptions() {
        let (tools, _) = tools_with("");
        for tool in &tools {
            let schema = tool.parameters_schema();
            assert_eq!(schema["type"], "object", "{}", tool.name());
            assert_eq!(schema["additionalProperties"], false, "{}", tool.name());
            assert!(!tool.description().is_empty());
        }
    }

    #[test]
    fn default_calendars_appear_in_schemas() {
        let (tools, _) = tools_with("");
        let create = find(&tools, "create-event").parameters_schema();
        assert_eq!(create["properties"]["calendar"]["default"], "Personal");
        let week = find(&tools, "list-week-events").parameters_schema();
        assert_eq!(week["properties"]["calendar"]["default"], "Work");
    }

    #[tokio::test]
    async fn create_event_uses_default_calendar() {
        let (tools, runner) = tools_with("");
        let result = find(&tools, "create-event")
            .execute(json!({
                "title": "Dentist",
                "startDate": "2025-07-10 09:00",
                "endDate": "2025-07-10 10:00"
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("📅 Calendar: Personal"));
        assert!(runner.scripts.lock().unwrap()[0].contains(r#"calendar "Personal""#));
    }

    #[tokio::test]
    async fn host_failure_becomes_failed_result() {
        let (tools, _) = tools_with("fail");
        let result = find(&tools, "list-calendars").execute(json!({})).await.unwrap();
        assert!(!result.success);
        assert!(result.text().contains("Can't get calendar."));
    }

    #[tokio::test]
    async fn delete_without_confirm_is_dry_run() {
        let (tools, runner) = tools_with("3");
        let result = find(&tools, "delete-events-by-keyword")
            .execute(json!({"keyword": "Sync"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("confirm: true"));
        assert!(runner.scripts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn undecodable_args_are_errors() {
        let (tools, _) = tools_with("");
        let err = find(&tools, "search-events")
            .execute(json!({"query": 5}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("search-events"));
    }
}
