// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

pub mod calendar;
pub mod traits;

pub use calendar::{
    calendar_tools, CreateBatchEventsTool, CreateEventTool, DeleteEventsByKeywordTool,
    FixEventTimesTool, ListCalendarsTool, ListTodayEventsTool, ListWeekEventsTool,
    SearchEventsTool, CATALOG_VERSION,
};
pub use traits::{Tool, ToolResult, ToolSpec};
