// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Tool routing with argument validation.
//!
//! Every schema is compiled once at startup. A call is checked against its
//! tool's schema before the tool sees it, so tools only decode well-formed
//! arguments.

use crate::tools::{Tool, ToolResult, ToolSpec};
use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {}", reasons.join("; "))]
    InvalidArguments { tool: String, reasons: Vec<String> },

    #[error("tool {tool} has an invalid schema: {reason}")]
    InvalidSchema { tool: String, reason: String },
}

struct Entry {
    tool: Box<dyn Tool>,
    schema: JSONSchema,
}

pub struct ToolDispatcher {
    entries: Vec<Entry>,
}

impl ToolDispatcher {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Result<Self, DispatchError> {
        let mut entries = Vec::with_capacity(tools.len());
        for tool in tools {
            let raw = tool.parameters_schema();
            let schema = JSONSchema::compile(&raw).map_err(|e| DispatchError::InvalidSchema {
                tool: tool.name().to_string(),
                reason: e.to_string(),
            })?;
            entries.push(Entry { tool, schema });
        }
        Ok(Self { entries })
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.entries.iter().map(|e| e.tool.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self, name: &str, args: &Value) -> Result<&dyn Tool, DispatchError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.tool.name() == name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        if let Err(errors) = entry.schema.validate(args) {
            let reasons = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect();
            return Err(DispatchError::InvalidArguments {
                tool: name.to_string(),
                reasons,
            });
        }
        Ok(entry.tool.as_ref())
    }

    /// Run one tool call. Never fails: every problem becomes a failed
    /// `ToolResult` whose error text starts with `Error: `.
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolResult {
        let args = if args.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            args
        };

        let tool = match self.validate(name, &args) {
            Ok(tool) => tool,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Rejected tool call");
                return ToolResult::failed(format!("Error: {e}"));
            }
        };

        tracing::debug!(tool = name, "Dispatching tool call");
        match tool.execute(args).await {
            Ok(result) if result.success => {
                tracing::info!(tool = name, "Tool call succeeded");
                result
            }
            Ok(result) => {
                let message = result.text().to_string();
                tracing::warn!(tool = name, error = %message, "Tool call failed");
                ToolResult {
                    success: false,
                    output: result.output,
                    error: Some(format!("Error: {message}")),
                }
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                ToolResult::failed(format!("Error: {e:#}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the text argument"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"],
                "additionalProperties": false
            })
        }

        async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
            let text = args["text"].as_str().unwrap_or_default();
            if text == "explode" {
                anyhow::bail!("exploded");
            }
            if text == "refuse" {
                return Ok(ToolResult::failed("refused"));
            }
            Ok(ToolResult::ok(text))
        }
    }

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(vec![Box::new(Echo)]).unwrap()
    }

    #[tokio::test]
    async fn routes_valid_calls() {
        let result = dispatcher().dispatch("echo", json!({"text": "hi"})).await;
        assert!(result.success);
        assert_eq!(result.output, "hi");
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failed_result() {
        let result = dispatcher().dispatch("nope", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.text(), "Error: unknown tool: nope");
    }

    #[tokio::test]
    async fn schema_violations_never_reach_the_tool() {
        let d = dispatcher();
        for args in [json!({}), json!({"text": 1}), json!({"text": "a", "extra": true}), Value::Null] {
            let result = d.dispatch("echo", args).await;
            assert!(!result.success);
            assert!(result.text().starts_with("Error: invalid arguments for echo"));
        }
    }

    #[tokio::test]
    async fn tool_errors_are_prefixed() {
        let d = dispatcher();
        let result = d.dispatch("echo", json!({"text": "explode"})).await;
        assert_eq!(result.text(), "Error: exploded");

        let result = d.dispatch("echo", json!({"text": "refuse"})).await;
        assert_eq!(result.text(), "Error: refused");
    }

    #[test]
    fn specs_list_every_tool() {
        let specs = dispatcher().specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "echo");
    }
}
