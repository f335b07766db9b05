use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The agent-side record of an exchange. This is what gets dumped into
/// interaction logs, as opposed to the display-only transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModelMessage {
    Request(ModelRequest),
    Response(ModelResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub parts: Vec<RequestPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub parts: Vec<ResponsePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "part_kind", rename_all = "kebab-case")]
pub enum RequestPart {
    SystemPrompt {
        content: String,
        timestamp: DateTime<Utc>,
    },
    UserPrompt {
        content: String,
        timestamp: DateTime<Utc>,
    },
    ToolReturn {
        tool_name: String,
        content: Value,
        tool_call_id: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "part_kind", rename_all = "kebab-case")]
pub enum ResponsePart {
    Text {
        content: String,
    },
    ToolCall {
        tool_name: String,
        args: Value,
        tool_call_id: String,
    },
}

impl ModelMessage {
    pub fn request(parts: Vec<RequestPart>) -> Self {
        ModelMessage::Request(ModelRequest {
            parts,
            instructions: None,
        })
    }

    pub fn response(parts: Vec<ResponsePart>, model_name: impl Into<String>) -> Self {
        ModelMessage::Response(ModelResponse {
            parts,
            model_name: Some(model_name.into()),
            timestamp: Utc::now(),
        })
    }
}

impl RequestPart {
    pub fn system_prompt(content: impl Into<String>) -> Self {
        RequestPart::SystemPrompt {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user_prompt(content: impl Into<String>) -> Self {
        RequestPart::UserPrompt {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn tool_return(
        tool_name: impl Into<String>,
        content: Value,
        tool_call_id: impl Into<String>,
    ) -> Self {
        RequestPart::ToolReturn {
            tool_name: tool_name.into(),
            content,
            tool_call_id: tool_call_id.into(),
            timestamp: Utc::now(),
        }
    }
}
