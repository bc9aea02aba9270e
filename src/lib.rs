// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! MCP server exposing macOS Calendar through AppleScript.

pub mod calendar;
pub mod config;
pub mod mcp;
pub mod tools;
