use super::sink::InteractionSink;
use super::{log_file_name, LogEntry};
use crate::agent::AgentIdentity;
use crate::error::Result;
use crate::models::ModelMessage;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

const MAX_NAME_ATTEMPTS: usize = 8;

/// Writes every exchange to its own pretty-printed JSON file.
pub struct FilesystemLogWriter {
    dir: PathBuf,
}

impl FilesystemLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Serialize and write one exchange. Not idempotent: each call produces
    /// a new file.
    pub fn write<M: Serialize>(
        &self,
        agent: &AgentIdentity,
        messages: &[M],
        source: &str,
    ) -> Result<PathBuf> {
        let entry = LogEntry::new(agent, messages, source)?;
        let timestamp = entry.timestamp()?;
        let content = serde_json::to_string_pretty(&entry)?;

        fs::create_dir_all(&self.dir)?;

        let mut attempt = 0;
        loop {
            let path = self.dir.join(log_file_name(&agent.name, &timestamp));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    return Ok(path);
                }
                // Same second and same suffix; roll a new suffix
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl InteractionSink for FilesystemLogWriter {
    fn log_interaction(
        &self,
        agent: &AgentIdentity,
        messages: &[ModelMessage],
        source: &str,
    ) -> Result<PathBuf> {
        self.write(agent, messages, source)
    }
}
