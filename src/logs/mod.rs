mod filesystem;
mod sink;

pub use filesystem::FilesystemLogWriter;
pub use sink::InteractionSink;

use crate::agent::AgentIdentity;
use crate::error::{FaqError, Result};
use crate::json::is_truthy;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_SOURCE: &str = "user";
pub const DEFAULT_LOGS_DIRECTORY: &str = "logs";

/// Snapshot of one completed exchange, written once and never read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub agent_name: String,
    pub system_prompt: String,
    pub provider: String,
    pub model: String,
    pub tools: Vec<String>,
    pub messages: Vec<Value>,
    pub source: String,
}

impl LogEntry {
    pub fn new<M: Serialize>(agent: &AgentIdentity, messages: &[M], source: &str) -> Result<Self> {
        let messages = messages
            .iter()
            .map(dump_message)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            agent_name: agent.name.clone(),
            system_prompt: agent.system_prompt.clone(),
            provider: agent.provider.clone(),
            model: agent.model_name.clone(),
            tools: agent.tool_names(),
            messages,
            source: source.to_string(),
        })
    }

    /// Timestamp the file name is derived from.
    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>> {
        to_datetime(extract_timestamp(&self.messages))
    }
}

/// Dump a message into plain JSON. Timestamps come out as ISO-8601 text;
/// anything serde cannot encode is reported with its type name.
pub fn dump_message<M: Serialize>(message: &M) -> Result<Value> {
    serde_json::to_value(message).map_err(|source| FaqError::Unserializable {
        type_name: std::any::type_name::<M>(),
        source,
    })
}

/// Most recent timestamp in a dumped message list. Each message's own
/// `timestamp` wins over its parts; parts are scanned newest first.
pub fn extract_timestamp(messages: &[Value]) -> Option<&Value> {
    for message in messages.iter().rev() {
        if let Some(ts) = message.get("timestamp").filter(|ts| is_truthy(ts)) {
            return Some(ts);
        }

        if let Some(parts) = message.get("parts").and_then(Value::as_array) {
            for part in parts.iter().rev() {
                if let Some(ts) = part.get("timestamp").filter(|ts| is_truthy(ts)) {
                    return Some(ts);
                }
            }
        }
    }

    None
}

/// Coerce a raw timestamp. Strings must be ISO-8601; anything else,
/// including no value at all, means "now".
pub fn to_datetime(raw: Option<&Value>) -> Result<DateTime<FixedOffset>> {
    match raw {
        Some(Value::String(text)) => parse_iso8601(text),
        _ => Ok(Utc::now().fixed_offset()),
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Common ISO-8601 shapes: `T` or space separator, optional seconds and
/// fraction, optional offset, or a bare date taken as midnight.
fn parse_iso8601(text: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts);
    }
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }

    // Offset-less timestamps are taken as UTC
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().fixed_offset())
        .ok_or_else(|| FaqError::InvalidTimestamp(text.to_string()))
}

/// `{agent}_{YYYYMMDD_HHMMSS}_{6 hex}.json`
pub fn log_file_name(agent_name: &str, timestamp: &DateTime<FixedOffset>) -> String {
    format!(
        "{}_{}_{}.json",
        agent_name,
        timestamp.format("%Y%m%d_%H%M%S"),
        random_suffix()
    )
}

fn random_suffix() -> String {
    let bytes: [u8; 3] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
