// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! MCP (Model Context Protocol) server for macOS Calendar.
//!
//! Exposes the calendar tools to an MCP client over stdio.

pub mod dispatcher;
pub mod server;

pub use dispatcher::{DispatchError, ToolDispatcher};
pub use server::McpServer;

use crate::calendar::{Clock, OperationEngine, OsascriptRunner, ScriptRunner, SystemClock};
use crate::config::Config;
use crate::tools::calendar_tools;
use std::sync::Arc;

/// Build the dispatcher for the calendar catalog on top of the given host
/// boundary and clock.
pub fn calendar_dispatcher(
    config: &Config,
    runner: Arc<dyn ScriptRunner>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<ToolDispatcher> {
    let engine = Arc::new(OperationEngine::new(runner, clock));
    let dispatcher = ToolDispatcher::new(calendar_tools(engine, &config.calendars))?;
    tracing::debug!(count = dispatcher.len(), "Calendar tools registered");
    Ok(dispatcher)
}

/// The production server: `osascript` on the local clock.
pub fn calendar_server(config: &Config) -> anyhow::Result<McpServer> {
    let runner = OsascriptRunner::new(config.executor.program()?, config.executor.timeout());
    tracing::info!(
        osascript = %runner.program().display(),
        timeout_secs = config.executor.timeout().as_secs(),
        "Using osascript"
    );
    let dispatcher = calendar_dispatcher(config, Arc::new(runner), Arc::new(SystemClock))?;
    Ok(McpServer::new(dispatcher))
}
