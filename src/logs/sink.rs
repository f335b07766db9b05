use crate::agent::AgentIdentity;
use crate::error::Result;
use crate::models::ModelMessage;
use std::path::PathBuf;

/// Trait for interaction log backends
pub trait InteractionSink: Send + Sync {
    /// Record one completed exchange and return where it went
    fn log_interaction(
        &self,
        agent: &AgentIdentity,
        messages: &[ModelMessage],
        source: &str,
    ) -> Result<PathBuf>;
}
