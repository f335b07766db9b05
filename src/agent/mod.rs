mod faq;
mod stream;

pub use faq::{FaqAgent, FaqRun};
pub use stream::coalesce_cumulative;

use crate::error::Result;
use crate::json::{display_value, is_truthy};
use crate::models::ModelMessage;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::time::Duration;

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Named group of tools registered on an agent. Order is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toolset {
    pub name: String,
    tools: Vec<ToolDefinition>,
}

impl Toolset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.retain(|t| t.name != tool.name);
        self.tools.push(tool);
        self
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }
}

/// Who answered: recorded verbatim in every interaction log.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentIdentity {
    pub name: String,
    pub system_prompt: String,
    pub provider: String,
    pub model_name: String,
    pub toolsets: Vec<Toolset>,
}

impl AgentIdentity {
    /// Tool names across all toolsets, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.toolsets
            .iter()
            .flat_map(|ts| ts.tool_names())
            .map(str::to_string)
            .collect()
    }
}

/// One unit of streamed output. Text may be cumulative or incremental;
/// the consumer reconciles.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputChunk {
    Text(String),
    Structured(Value),
}

impl OutputChunk {
    /// Empty text and falsy JSON carry nothing to display.
    pub fn is_empty(&self) -> bool {
        match self {
            OutputChunk::Text(text) => text.is_empty(),
            OutputChunk::Structured(value) => !is_truthy(value),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutputChunk::Text(text) => Some(text),
            OutputChunk::Structured(_) => None,
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            OutputChunk::Text(text) => text.clone(),
            OutputChunk::Structured(value) => display_value(value),
        }
    }
}

impl From<&str> for OutputChunk {
    fn from(text: &str) -> Self {
        OutputChunk::Text(text.to_string())
    }
}

impl From<String> for OutputChunk {
    fn from(text: String) -> Self {
        OutputChunk::Text(text)
    }
}

/// The seam between the chat front end and whatever produces answers.
#[async_trait]
pub trait Agent: Send + Sync {
    fn identity(&self) -> &AgentIdentity;

    /// Start a run for `prompt`. The returned handle owns every resource of
    /// the run; dropping it releases them.
    async fn run_stream(&self, prompt: &str) -> Result<Box<dyn StreamedRun>>;
}

/// An open run whose output has not been consumed yet.
pub trait StreamedRun: Send {
    /// Output chunks, coalesced so that no more than one is produced per
    /// `debounce_by` interval. Single pass: a second call yields nothing.
    fn stream_output(&mut self, debounce_by: Duration) -> BoxStream<'_, Result<OutputChunk>>;

    /// Messages produced by this run, complete once the output stream is
    /// exhausted.
    fn new_messages(&self) -> Vec<ModelMessage>;
}
