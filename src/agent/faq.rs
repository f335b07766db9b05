use super::{coalesce_cumulative, Agent, AgentIdentity, OutputChunk, StreamedRun};
use crate::api::response::{extract_content, parse_tool_calls};
use crate::api::{make_api_request, response_deltas, ApiMessage, RequestBody};
use crate::config::Config;
use crate::error::Result;
use crate::index::FaqIndex;
use crate::json::display_value;
use crate::models::{FunctionCall, ModelMessage, RequestPart, ResponsePart, ToolCall};
use crate::tools::{format_tools_for_llm, ToolRegistry};
use async_trait::async_trait;
use colored::*;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Retrieval-augmented FAQ agent on top of an OpenAI-compatible
/// chat-completions endpoint.
pub struct FaqAgent {
    identity: AgentIdentity,
    registry: ToolRegistry,
    api_key: String,
    api_endpoint: String,
    stream_timeout: u64,
    verbose: bool,
}

impl FaqAgent {
    pub fn new(config: &Config, index: Arc<FaqIndex>) -> Self {
        let registry = ToolRegistry::for_index(index, config.max_results);
        let identity = AgentIdentity {
            name: config.agent_name.clone(),
            system_prompt: config.system_prompt.clone(),
            provider: config.provider.clone(),
            model_name: config.model.clone(),
            toolsets: vec![registry.toolset()],
        };

        Self {
            identity,
            registry,
            api_key: config.api_key.clone(),
            api_endpoint: config.api_endpoint.clone(),
            stream_timeout: config.stream_timeout,
            verbose: config.verbose,
        }
    }

    fn log(&self, message: &str) {
        if self.verbose {
            eprintln!("{}", format!("[faq] {}", message).dimmed());
        }
    }

    /// Run one tool call from the model. Malformed calls and tool failures
    /// come back as error text for the model to read, never as a failed run.
    fn execute_tool_call(&self, tool_call: &Value) -> ToolExchange {
        let id = tool_call
            .get("id")
            .and_then(|i| i.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
        let function = tool_call.get("function");
        let name = function
            .and_then(|f| f.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("unknown")
            .to_string();
        let arguments_str = function
            .and_then(|f| f.get("arguments"))
            .and_then(|a| a.as_str());

        let (args, outcome) = match arguments_str {
            None => (
                Value::Null,
                Err(format!(
                    "Tool call {} missing required 'function.arguments' field",
                    id
                )),
            ),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(args) => {
                    self.log(&format!("Selected tool: '{}' with args: {}", name, raw));
                    let outcome = self.registry.call(&name, &args);
                    (args, outcome)
                }
                Err(e) => (
                    Value::String(raw.to_string()),
                    Err(format!(
                        "failed to parse arguments for tool '{}' : {}",
                        name, e
                    )),
                ),
            },
        };

        let content = match outcome {
            Ok(result) => result,
            Err(e) => {
                self.log(&format!("Tool '{}' failed: {}", name, e));
                Value::String(format!("Error: {}", e))
            }
        };

        // Echoed back from the fields read above so every tool reply has a
        // matching assistant call, whatever shape the model sent
        let wire_call = ToolCall {
            id: id.clone(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: name.clone(),
                arguments: arguments_str.unwrap_or("{}").to_string(),
            },
        };

        ToolExchange {
            reply: ApiMessage::tool(id.clone(), display_value(&content)),
            call: ResponsePart::ToolCall {
                tool_name: name.clone(),
                args,
                tool_call_id: id.clone(),
            },
            tool_return: RequestPart::tool_return(name, content, id),
            wire_call,
        }
    }

    /// Run every tool call of a response and record the round in both
    /// histories: the agent-side `messages` and the wire conversation.
    fn apply_tool_calls(
        &self,
        content: Option<String>,
        tool_calls: &[Value],
        messages: &mut Vec<ModelMessage>,
        wire: &mut Vec<ApiMessage>,
    ) {
        let mut call_parts = Vec::new();
        if let Some(text) = content.clone().filter(|c| !c.is_empty()) {
            call_parts.push(ResponsePart::Text { content: text });
        }

        let exchanges: Vec<ToolExchange> = tool_calls
            .iter()
            .map(|tool_call| self.execute_tool_call(tool_call))
            .collect();

        wire.push(ApiMessage {
            role: "assistant".to_string(),
            content,
            tool_calls: Some(exchanges.iter().map(|e| e.wire_call.clone()).collect()),
            tool_call_id: None,
        });

        let mut return_parts = Vec::new();
        for exchange in exchanges {
            call_parts.push(exchange.call);
            return_parts.push(exchange.tool_return);
            wire.push(exchange.reply);
        }
        messages.push(ModelMessage::response(
            call_parts,
            self.identity.model_name.clone(),
        ));
        messages.push(ModelMessage::request(return_parts));
    }
}

/// One executed tool call, in every form the run needs it.
struct ToolExchange {
    call: ResponsePart,
    tool_return: RequestPart,
    wire_call: ToolCall,
    reply: ApiMessage,
}

#[async_trait]
impl Agent for FaqAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn run_stream(&self, prompt: &str) -> Result<Box<dyn StreamedRun>> {
        let model = self.identity.model_name.clone();
        let mut messages = vec![ModelMessage::request(vec![
            RequestPart::system_prompt(&self.identity.system_prompt),
            RequestPart::user_prompt(prompt),
        ])];
        let mut wire = vec![
            ApiMessage::system(&self.identity.system_prompt),
            ApiMessage::user(prompt),
        ];

        let tools = format_tools_for_llm(&self.registry);
        let request_body = RequestBody {
            model: model.clone(),
            messages: wire.clone(),
            stream: false,
            tools: if tools.is_empty() { None } else { Some(tools) },
        };

        // Tool arguments do not stream reliably, so the first round trip is
        // non-streaming and only the final answer is streamed.
        self.log(&format!("Using model: {}", model));
        let response = make_api_request(&self.api_key, &self.api_endpoint, &request_body).await?;
        let response_text = response.text().await?;
        self.log(&format!("Raw response: {}", response_text));
        let response_json: Value = serde_json::from_str(&response_text)?;

        let tool_calls = match parse_tool_calls(&response_json)? {
            Some(tool_calls) => tool_calls,
            None => {
                let content = extract_content(&response_json)?.unwrap_or_default();
                return Ok(Box::new(FaqRun::complete(messages, model, content)));
            }
        };

        let content = extract_content(&response_json)?;
        self.apply_tool_calls(content, &tool_calls, &mut messages, &mut wire);

        let followup = RequestBody {
            model: model.clone(),
            messages: wire,
            stream: true,
            tools: None,
        };
        self.log("Making follow-up request with tool results (streaming enabled)...");
        let response = make_api_request(&self.api_key, &self.api_endpoint, &followup).await?;
        let deltas = response_deltas(response, self.stream_timeout, self.verbose);

        Ok(Box::new(FaqRun::streaming(messages, model, deltas)))
    }
}

enum RunOutput {
    Streaming(BoxStream<'static, Result<String>>),
    Complete(String),
}

/// An open FAQ agent run. Dropping it drops the underlying HTTP response.
pub struct FaqRun {
    messages: Vec<ModelMessage>,
    model: String,
    output: Option<RunOutput>,
    final_text: String,
}

impl FaqRun {
    fn streaming(
        messages: Vec<ModelMessage>,
        model: String,
        deltas: BoxStream<'static, Result<String>>,
    ) -> Self {
        Self {
            messages,
            model,
            output: Some(RunOutput::Streaming(deltas)),
            final_text: String::new(),
        }
    }

    fn complete(messages: Vec<ModelMessage>, model: String, content: String) -> Self {
        Self {
            messages,
            model,
            output: Some(RunOutput::Complete(content)),
            final_text: String::new(),
        }
    }
}

impl StreamedRun for FaqRun {
    fn stream_output(&mut self, debounce_by: Duration) -> BoxStream<'_, Result<OutputChunk>> {
        match self.output.take() {
            Some(RunOutput::Streaming(deltas)) => {
                let final_text = &mut self.final_text;
                coalesce_cumulative(deltas, debounce_by)
                    .map(move |chunk| {
                        chunk.map(|text| {
                            final_text.clone_from(&text);
                            OutputChunk::Text(text)
                        })
                    })
                    .boxed()
            }
            Some(RunOutput::Complete(content)) => {
                self.final_text.clone_from(&content);
                stream::once(async move { Ok(OutputChunk::Text(content)) }).boxed()
            }
            None => stream::empty().boxed(),
        }
    }

    fn new_messages(&self) -> Vec<ModelMessage> {
        let mut messages = self.messages.clone();
        messages.push(ModelMessage::response(
            vec![ResponsePart::Text {
                content: self.final_text.clone(),
            }],
            self.model.clone(),
        ));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FaqDocument;
    use serde_json::{json, Map};
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config {
            api_key: "sk-test".to_string(),
            api_endpoint: "http://localhost:9/v1/chat/completions".to_string(),
            stream_timeout: 5,
            model: "gpt-4o-mini".to_string(),
            provider: "openai".to_string(),
            system_prompt: "You are a helpful assistant for a course.".to_string(),
            agent_name: "faq_agent".to_string(),
            debounce: Duration::from_millis(1),
            faq_directory: PathBuf::from("faq"),
            filter: String::new(),
            max_results: 5,
            logs_directory: PathBuf::from("logs"),
            verbose: false,
        }
    }

    fn test_agent() -> FaqAgent {
        let index = FaqIndex::new(vec![FaqDocument {
            filename: "deadline.md".to_string(),
            id: None,
            question: Some("When is the homework deadline?".to_string()),
            section: None,
            content: "Homework is due on Friday.".to_string(),
            metadata: Map::new(),
        }]);
        FaqAgent::new(&test_config(), Arc::new(index))
    }

    fn first_request() -> Vec<ModelMessage> {
        vec![ModelMessage::request(vec![
            RequestPart::system_prompt("You are a helpful assistant for a course."),
            RequestPart::user_prompt("When is the deadline?"),
        ])]
    }

    fn returned_content(exchange: &ToolExchange) -> Value {
        match &exchange.tool_return {
            RequestPart::ToolReturn { content, .. } => content.clone(),
            other => panic!("expected tool return, got {:?}", other),
        }
    }

    #[test]
    fn test_identity_lists_search_tool() {
        let agent = test_agent();
        assert_eq!(agent.identity().name, "faq_agent");
        assert_eq!(agent.identity().tool_names(), vec!["search".to_string()]);
    }

    #[test]
    fn test_tool_call_runs_search() {
        let agent = test_agent();
        let exchange = agent.execute_tool_call(&json!({
            "id": "call_1",
            "type": "function",
            "function": {"name": "search", "arguments": "{\"query\": \"homework deadline\"}"}
        }));

        let content = returned_content(&exchange);
        assert_eq!(content[0]["filename"], "deadline.md");
        assert_eq!(exchange.reply.tool_call_id.as_deref(), Some("call_1"));
        assert!(exchange.reply.content.as_deref().unwrap().contains("deadline.md"));
        assert_eq!(
            exchange.call,
            ResponsePart::ToolCall {
                tool_name: "search".to_string(),
                args: json!({"query": "homework deadline"}),
                tool_call_id: "call_1".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_arguments_become_error_reply() {
        let agent = test_agent();
        let exchange = agent.execute_tool_call(&json!({
            "id": "call_2",
            "function": {"name": "search"}
        }));

        let content = returned_content(&exchange);
        assert!(content
            .as_str()
            .unwrap()
            .starts_with("Error: Tool call call_2 missing"));
        assert_eq!(exchange.wire_call.function.arguments, "{}");
    }

    #[test]
    fn test_unparsable_arguments_become_error_reply() {
        let agent = test_agent();
        let exchange = agent.execute_tool_call(&json!({
            "id": "call_3",
            "type": "function",
            "function": {"name": "search", "arguments": "{query: oops"}
        }));

        let content = returned_content(&exchange);
        assert!(content
            .as_str()
            .unwrap()
            .contains("failed to parse arguments for tool 'search'"));
        match &exchange.call {
            ResponsePart::ToolCall { args, .. } => assert_eq!(args, &json!("{query: oops")),
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_violation_becomes_error_reply() {
        let agent = test_agent();
        let exchange = agent.execute_tool_call(&json!({
            "id": "call_4",
            "type": "function",
            "function": {"name": "search", "arguments": "{\"q\": \"deadline\"}"}
        }));

        let content = returned_content(&exchange);
        assert!(content.as_str().unwrap().starts_with("Error: "));
    }

    #[test]
    fn test_missing_id_gets_generated_one() {
        let agent = test_agent();
        let exchange = agent.execute_tool_call(&json!({
            "function": {"name": "search", "arguments": "{\"query\": \"friday\"}"}
        }));

        assert!(exchange.wire_call.id.starts_with("call_"));
        assert_eq!(exchange.reply.tool_call_id.as_deref(), Some(exchange.wire_call.id.as_str()));
    }

    #[test]
    fn test_every_tool_reply_has_matching_assistant_call() {
        let agent = test_agent();
        let mut messages = first_request();
        let mut wire = vec![ApiMessage::user("When is the deadline?")];
        let tool_calls = vec![
            json!({
                "id": "call_a",
                "type": "function",
                "function": {"name": "search", "arguments": "{\"query\": \"deadline\"}"}
            }),
            // No "type": not a valid wire ToolCall as sent
            json!({
                "id": "call_b",
                "function": {"name": "search", "arguments": "{\"query\": \"friday\"}"}
            }),
        ];

        agent.apply_tool_calls(None, &tool_calls, &mut messages, &mut wire);

        assert_eq!(wire.len(), 4);
        let announced: Vec<String> = wire[1]
            .tool_calls
            .as_ref()
            .unwrap()
            .iter()
            .map(|call| call.id.clone())
            .collect();
        assert_eq!(announced, vec!["call_a", "call_b"]);
        assert!(wire[1]
            .tool_calls
            .as_ref()
            .unwrap()
            .iter()
            .all(|call| call.tool_type == "function"));
        let replies: Vec<&str> = wire[2..]
            .iter()
            .map(|m| m.tool_call_id.as_deref().unwrap())
            .collect();
        assert_eq!(replies, vec!["call_a", "call_b"]);
    }

    #[tokio::test]
    async fn test_tool_run_history_ends_with_final_text() {
        let agent = test_agent();
        let mut messages = first_request();
        let mut wire = Vec::new();
        agent.apply_tool_calls(
            Some("Let me look that up.".to_string()),
            &[json!({
                "id": "call_1",
                "type": "function",
                "function": {"name": "search", "arguments": "{\"query\": \"deadline\"}"}
            })],
            &mut messages,
            &mut wire,
        );

        let deltas = stream::iter(vec![Ok("Homework".to_string()), Ok(" is due Friday.".to_string())]).boxed();
        let mut run = FaqRun::streaming(messages, "gpt-4o-mini".to_string(), deltas);
        let chunks: Vec<OutputChunk> = run
            .stream_output(Duration::from_millis(1))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(
            chunks.last(),
            Some(&OutputChunk::Text("Homework is due Friday.".to_string()))
        );

        let history = run.new_messages();
        assert_eq!(history.len(), 4);
        assert!(matches!(&history[0], ModelMessage::Request(r) if r.parts.len() == 2));
        match &history[1] {
            ModelMessage::Response(response) => {
                assert_eq!(
                    response.parts[0],
                    ResponsePart::Text {
                        content: "Let me look that up.".to_string()
                    }
                );
                assert!(matches!(
                    &response.parts[1],
                    ResponsePart::ToolCall { tool_call_id, .. } if tool_call_id == "call_1"
                ));
            }
            other => panic!("expected tool-call response, got {:?}", other),
        }
        assert!(matches!(
            &history[2],
            ModelMessage::Request(r) if matches!(&r.parts[..], [RequestPart::ToolReturn { .. }])
        ));
        match &history[3] {
            ModelMessage::Response(response) => assert_eq!(
                response.parts,
                vec![ResponsePart::Text {
                    content: "Homework is due Friday.".to_string()
                }]
            ),
            other => panic!("expected final response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_without_tools_emits_single_chunk() {
        let mut run = FaqRun::complete(
            first_request(),
            "gpt-4o-mini".to_string(),
            "Homework is due Friday.".to_string(),
        );

        let chunks: Vec<Result<OutputChunk>> =
            run.stream_output(Duration::from_millis(1)).collect().await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].as_ref().unwrap(),
            &OutputChunk::Text("Homework is due Friday.".to_string())
        );
        assert!(run.stream_output(Duration::from_millis(1)).next().await.is_none());

        let history = run.new_messages();
        assert_eq!(history.len(), 2);
        assert!(matches!(
            &history[1],
            ModelMessage::Response(r) if r.parts == vec![ResponsePart::Text {
                content: "Homework is due Friday.".to_string()
            }]
        ));
    }
}
