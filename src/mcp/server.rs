// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! MCP server side of the stdio transport.
//!
//! Newline-delimited JSON-RPC 2.0: one request per line in, one response
//! line out. Notifications (no `id`) never get a reply. Tool failures are
//! ordinary results with `isError: true`; only protocol problems become
//! JSON-RPC errors.

use crate::mcp::dispatcher::ToolDispatcher;
use crate::tools::CATALOG_VERSION;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "macos-calendar-mcp";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

// ── JSON-RPC types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

// ── MCP model types ─────────────────────────────────────────────

/// A tool definition as listed by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// The result of `tools/call`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpCallToolResult {
    pub content: Vec<McpContent>,
    pub is_error: bool,
}

/// A content block in a tool result.
#[derive(Debug, Serialize)]
pub struct McpContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

// ── MCP Server ──────────────────────────────────────────────────

pub struct McpServer {
    dispatcher: ToolDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Handle one input line. Returns the serialized response, or `None`
    /// for notifications and blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(message).await?,
            Err(e) => {
                tracing::debug!(error = %e, "Unparseable JSON-RPC line");
                JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {e}"))
            }
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize JSON-RPC response");
                None
            }
        }
    }

    async fn handle_message(&self, message: Value) -> Option<JsonRpcResponse> {
        let Some(object) = message.as_object() else {
            return Some(JsonRpcResponse::error(
                Value::Null,
                INVALID_REQUEST,
                "Invalid Request: expected an object",
            ));
        };

        let id = object.get("id").cloned();
        let Some(method) = object.get("method").and_then(Value::as_str) else {
            return Some(JsonRpcResponse::error(
                id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid Request: missing method",
            ));
        };

        let Some(id) = id else {
            tracing::debug!(method, "Notification received");
            return None;
        };

        let params = object.get("params").cloned().unwrap_or(Value::Null);
        tracing::debug!(method, "Request received");

        Some(match method {
            "initialize" => JsonRpcResponse::result(id, self.initialize_result()),
            "ping" => JsonRpcResponse::result(id, json!({})),
            "tools/list" => JsonRpcResponse::result(id, self.tools_list_result()),
            "tools/call" => self.call_tool(id, params).await,
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "catalogVersion": CATALOG_VERSION
            }
        })
    }

    fn tools_list_result(&self) -> Value {
        let tools: Vec<McpToolInfo> = self
            .dispatcher
            .specs()
            .into_iter()
            .map(|spec| McpToolInfo {
                name: spec.name,
                description: spec.description,
                input_schema: spec.parameters,
            })
            .collect();
        json!({
            "tools": tools,
            "_meta": {"catalogVersion": CATALOG_VERSION}
        })
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                "Invalid params: tools/call requires a tool name",
            );
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let result = self.dispatcher.dispatch(name, arguments).await;
        let call_result = McpCallToolResult {
            content: vec![McpContent {
                content_type: "text",
                text: result.text().to_string(),
            }],
            is_error: !result.success,
        };

        match serde_json::to_value(call_result) {
            Ok(value) => JsonRpcResponse::result(id, value),
            Err(e) => JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
        }
    }

    /// Serve requests from `reader` until it reaches EOF, one at a time.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from MCP client")?
        {
            if let Some(response) = self.handle_line(&line).await {
                writer
                    .write_all(response.as_bytes())
                    .await
                    .context("Failed to write to MCP client")?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        tracing::info!("MCP client closed the connection");
        Ok(())
    }

    /// Serve on the process's stdin/stdout.
    pub async fn serve_stdio(&self) -> Result<()> {
        tracing::info!(
            server = SERVER_NAME,
            tools = self.dispatcher.len(),
            "MCP server listening on stdio"
        );
        self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolResult};
    use async_trait::async_trait;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase the text"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }

        async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::ok(
                args["text"].as_str().unwrap_or_default().to_uppercase(),
            ))
        }
    }

    fn server() -> McpServer {
        McpServer::new(ToolDispatcher::new(vec![Box::new(Upper)]).unwrap())
    }

    async fn roundtrip(server: &McpServer, line: &str) -> Value {
        let text = server.handle_line(line).await.unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_tools_capability() {
        let reply = roundtrip(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        )
        .await;
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(reply["result"]["capabilities"]["tools"].is_object());
        assert_eq!(reply["result"]["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let s = server();
        assert!(s
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
        assert!(s.handle_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn protocol_errors_use_json_rpc_codes() {
        let s = server();
        let reply = roundtrip(&s, "{not json").await;
        assert_eq!(reply["error"]["code"], PARSE_ERROR);
        assert!(reply["id"].is_null());

        let reply = roundtrip(&s, r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#).await;
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(reply["id"], 2);

        let reply = roundtrip(&s, r#"{"jsonrpc":"2.0","id":3}"#).await;
        assert_eq!(reply["error"]["code"], INVALID_REQUEST);

        let reply = roundtrip(
            &s,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{}}"#,
        )
        .await;
        assert_eq!(reply["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn tools_call_wraps_text_content() {
        let reply = roundtrip(
            &server(),
            r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"upper","arguments":{"text":"hi"}}}"#,
        )
        .await;
        assert_eq!(reply["id"], "a");
        assert_eq!(reply["result"]["isError"], false);
        assert_eq!(reply["result"]["content"][0]["type"], "text");
        assert_eq!(reply["result"]["content"][0]["text"], "HI");
    }

    #[tokio::test]
    async fn run_writes_one_line_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let mut output = Vec::new();
        server().run(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let list: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(list["result"]["tools"][0]["name"], "upper");
        assert!(list["result"]["tools"][0]["inputSchema"].is_object());
    }
}
