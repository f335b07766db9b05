use crate::agent::{ToolDefinition, Toolset};
use crate::index::FaqIndex;
use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Value};
use std::sync::Arc;

use super::search;

pub type ToolHandler = Box<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

pub struct RegisteredTool {
    pub definition: ToolDefinition,
    pub handler: ToolHandler,
}

/// Tools the agent can call during a run, grouped under one toolset name.
pub struct ToolRegistry {
    name: String,
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
        }
    }

    /// Registry with the FAQ `search` tool over `index`.
    pub fn for_index(index: Arc<FaqIndex>, max_results: usize) -> Self {
        let mut registry = Self::new("faq");
        registry.register(
            ToolDefinition {
                name: search::SEARCH_TOOL.to_string(),
                description: "Search the FAQ database for entries matching the given query. \
                              Returns the best matching question/answer entries."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query text"
                        }
                    },
                    "required": ["query"],
                    "additionalProperties": false
                }),
            },
            Box::new(move |args: &Value| search::handle_search(&index, args, max_results)),
        );
        registry
    }

    /// Register a tool. A later registration replaces an earlier one of the
    /// same name.
    pub fn register(&mut self, definition: ToolDefinition, handler: ToolHandler) {
        self.tools.retain(|t| t.definition.name != definition.name);
        self.tools.push(RegisteredTool {
            definition,
            handler,
        });
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|t| t.definition.name == name)
    }

    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| &t.definition).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn toolset(&self) -> Toolset {
        self.tools
            .iter()
            .fold(Toolset::new(self.name.clone()), |ts, t| {
                ts.with_tool(t.definition.clone())
            })
    }

    pub fn validate_arguments(&self, tool_name: &str, arguments: &Value) -> Result<(), String> {
        let tool = self
            .get(tool_name)
            .ok_or_else(|| format!("Tool '{}' not found", tool_name))?;

        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&tool.definition.parameters)
            .map_err(|e| format!("Invalid tool schema: {}", e))?;

        if let Err(errors) = schema.validate(arguments) {
            let error_messages: Vec<String> = errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();
            return Err(error_messages.join("; "));
        }

        Ok(())
    }

    /// Validate and run a tool.
    pub fn call(&self, tool_name: &str, arguments: &Value) -> Result<Value, String> {
        self.validate_arguments(tool_name, arguments)?;

        let tool = self
            .get(tool_name)
            .ok_or_else(|| format!("Tool '{}' not found", tool_name))?;

        (tool.handler)(arguments)
    }
}

/// Tool list in chat-completions `tools` format.
pub fn format_tools_for_llm(registry: &ToolRegistry) -> Vec<Value> {
    registry
        .list()
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })
        })
        .collect()
}
