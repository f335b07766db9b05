#![allow(dead_code)]

use async_trait::async_trait;
use faq_assistant::agent::{
    Agent, AgentIdentity, OutputChunk, StreamedRun, ToolDefinition, Toolset,
};
use faq_assistant::error::{FaqError, Result};
use faq_assistant::logs::InteractionSink;
use faq_assistant::models::{ModelMessage, RequestPart, ResponsePart};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn test_identity() -> AgentIdentity {
    AgentIdentity {
        name: "faq_agent".to_string(),
        system_prompt: "You are a helpful assistant for a course.".to_string(),
        provider: "openai".to_string(),
        model_name: "gpt-4o-mini".to_string(),
        toolsets: vec![Toolset::new("faq").with_tool(ToolDefinition {
            name: "search".to_string(),
            description: "Search the FAQ".to_string(),
            parameters: json!({"type": "object"}),
        })],
    }
}

/// What a scripted run does when its output is pulled.
#[derive(Clone)]
pub enum Step {
    Chunk(OutputChunk),
    Fail(String),
    /// Never yields again.
    Hang,
}

pub fn text(s: &str) -> Step {
    Step::Chunk(OutputChunk::Text(s.to_string()))
}

/// Agent that replays a fixed script of output steps.
pub struct ScriptedAgent {
    identity: AgentIdentity,
    steps: Vec<Step>,
    fail_on_start: bool,
    pub prompts: Mutex<Vec<String>>,
    pub runs_dropped: Arc<Mutex<usize>>,
}

impl ScriptedAgent {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            identity: test_identity(),
            steps,
            fail_on_start: false,
            prompts: Mutex::new(Vec::new()),
            runs_dropped: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing_on_start() -> Self {
        Self {
            fail_on_start: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn dropped_runs(&self) -> usize {
        *self.runs_dropped.lock().unwrap()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn run_stream(&self, prompt: &str) -> Result<Box<dyn StreamedRun>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_on_start {
            return Err(FaqError::ApiError {
                status: 503,
                message: "upstream unavailable".to_string(),
            });
        }

        Ok(Box::new(ScriptedRun {
            prompt: prompt.to_string(),
            steps: Some(self.steps.clone()),
            final_text: String::new(),
            dropped: Arc::clone(&self.runs_dropped),
        }))
    }
}

pub struct ScriptedRun {
    prompt: String,
    steps: Option<Vec<Step>>,
    final_text: String,
    dropped: Arc<Mutex<usize>>,
}

impl StreamedRun for ScriptedRun {
    fn stream_output(&mut self, _debounce_by: Duration) -> BoxStream<'_, Result<OutputChunk>> {
        let steps = self.steps.take().unwrap_or_default();
        let final_text = &mut self.final_text;
        stream::iter(steps)
            .then(|step| async move {
                match step {
                    Step::Chunk(chunk) => Some(Ok(chunk)),
                    Step::Fail(message) => Some(Err(FaqError::Other(message))),
                    Step::Hang => {
                        futures::future::pending::<()>().await;
                        None
                    }
                }
            })
            .filter_map(|item| async move { item })
            .map(move |item| {
                if let Ok(OutputChunk::Text(text)) = &item {
                    final_text.clone_from(text);
                }
                item
            })
            .boxed()
    }

    fn new_messages(&self) -> Vec<ModelMessage> {
        vec![
            ModelMessage::request(vec![RequestPart::user_prompt(self.prompt.clone())]),
            ModelMessage::response(
                vec![ResponsePart::Text {
                    content: self.final_text.clone(),
                }],
                "gpt-4o-mini",
            ),
        ]
    }
}

impl Drop for ScriptedRun {
    fn drop(&mut self) {
        *self.dropped.lock().unwrap() += 1;
    }
}

/// Sink that remembers what it was asked to log.
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Mutex<Vec<(String, Vec<ModelMessage>, String)>>,
}

impl RecordingSink {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl InteractionSink for RecordingSink {
    fn log_interaction(
        &self,
        agent: &AgentIdentity,
        messages: &[ModelMessage],
        source: &str,
    ) -> Result<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push((agent.name.clone(), messages.to_vec(), source.to_string()));
        Ok(PathBuf::from("logs/recorded.json"))
    }
}

/// Sink whose disk is always full.
pub struct FailingSink;

impl InteractionSink for FailingSink {
    fn log_interaction(
        &self,
        _agent: &AgentIdentity,
        _messages: &[ModelMessage],
        _source: &str,
    ) -> Result<PathBuf> {
        Err(FaqError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            "No space left on device",
        )))
    }
}
