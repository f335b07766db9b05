//! Synchronous view over an agent's asynchronous output.
//!
//! Each exchange gets its own producer thread running a current-thread tokio
//! runtime. Increments travel to the caller over a bounded channel; the
//! caller pulls them one at a time, blocking until the next one is ready.
//! The runtime and the agent run are torn down when the exchange ends,
//! fails, or the [`ResponseStream`] is dropped early.

use crate::agent::{Agent, OutputChunk};
use crate::error::{FaqError, Result};
use crate::logs::{InteractionSink, DEFAULT_SOURCE};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(10);
const CHANNEL_CAPACITY: usize = 32;

/// Reconcile one chunk against the text accumulated so far and return the
/// part that has not been shown yet.
///
/// A text chunk that starts with the accumulated text is taken as the
/// cumulative rendering so far, and only its unseen suffix is returned.
/// Anything else is an incremental fragment, returned whole and appended.
/// Empty chunks change nothing. An incremental fragment that happens to
/// start with the accumulated text is indistinguishable from a cumulative
/// one and is treated as cumulative.
pub fn reconcile_chunk(accumulated: &mut String, chunk: &OutputChunk) -> Option<String> {
    if chunk.is_empty() {
        return None;
    }

    let increment = match chunk.as_text() {
        Some(text) if text.starts_with(accumulated.as_str()) => {
            let suffix = text[accumulated.len()..].to_string();
            accumulated.clear();
            accumulated.push_str(text);
            suffix
        }
        _ => {
            let text = chunk.to_text();
            accumulated.push_str(&text);
            text
        }
    };

    if increment.is_empty() {
        None
    } else {
        Some(increment)
    }
}

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub debounce: Duration,
    pub source: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

/// What a completed exchange left behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOutcome {
    pub full_text: String,
    pub log_path: Option<PathBuf>,
    /// Set when the exchange could not be logged. The answer still stands.
    pub log_warning: Option<String>,
}

enum BridgeEvent {
    Increment(String),
    Finished(StreamOutcome),
    Failed(FaqError),
}

/// Connects an agent to the interaction log and hands out one
/// [`ResponseStream`] per prompt.
#[derive(Clone)]
pub struct StreamingBridge {
    agent: Arc<dyn Agent>,
    sink: Arc<dyn InteractionSink>,
    options: BridgeOptions,
}

impl StreamingBridge {
    pub fn new(agent: Arc<dyn Agent>, sink: Arc<dyn InteractionSink>) -> Self {
        Self::with_options(agent, sink, BridgeOptions::default())
    }

    pub fn with_options(
        agent: Arc<dyn Agent>,
        sink: Arc<dyn InteractionSink>,
        options: BridgeOptions,
    ) -> Self {
        Self {
            agent,
            sink,
            options,
        }
    }

    /// Start an exchange for `prompt`. Must not be called from inside a
    /// tokio runtime: the returned iterator blocks the calling thread.
    pub fn stream_response(&self, prompt: &str) -> ResponseStream {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let agent = Arc::clone(&self.agent);
        let sink = Arc::clone(&self.sink);
        let options = self.options.clone();
        let prompt = prompt.to_string();

        let spawned = thread::Builder::new()
            .name("faq-stream".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = tx.blocking_send(BridgeEvent::Failed(e.into()));
                        return;
                    }
                };
                runtime.block_on(produce(agent, sink, prompt, options, tx));
            });

        match spawned {
            Ok(handle) => ResponseStream {
                receiver: Some(rx),
                producer: Some(handle),
                startup_error: None,
                outcome: None,
                finished: false,
            },
            Err(e) => ResponseStream {
                receiver: None,
                producer: None,
                startup_error: Some(e.into()),
                outcome: None,
                finished: false,
            },
        }
    }
}

async fn produce(
    agent: Arc<dyn Agent>,
    sink: Arc<dyn InteractionSink>,
    prompt: String,
    options: BridgeOptions,
    tx: mpsc::Sender<BridgeEvent>,
) {
    let event = tokio::select! {
        result = run_exchange(agent.as_ref(), sink.as_ref(), &prompt, &options, &tx) => {
            match result {
                Ok(Some(outcome)) => BridgeEvent::Finished(outcome),
                Ok(None) => return,
                Err(e) => BridgeEvent::Failed(e),
            }
        }
        // Consumer went away; dropping the exchange future releases the run
        _ = tx.closed() => return,
    };

    let _ = tx.send(event).await;
}

/// Drive one run to completion. `Ok(None)` means the consumer stopped
/// listening and nothing was logged.
async fn run_exchange(
    agent: &dyn Agent,
    sink: &dyn InteractionSink,
    prompt: &str,
    options: &BridgeOptions,
    tx: &mpsc::Sender<BridgeEvent>,
) -> Result<Option<StreamOutcome>> {
    let mut run = agent.run_stream(prompt).await?;
    let mut full_text = String::new();

    {
        let mut output = run.stream_output(options.debounce);
        while let Some(chunk) = output.next().await {
            let chunk = chunk?;
            if let Some(increment) = reconcile_chunk(&mut full_text, &chunk) {
                if tx.send(BridgeEvent::Increment(increment)).await.is_err() {
                    return Ok(None);
                }
            }
        }
    }

    let (log_path, log_warning) =
        match sink.log_interaction(agent.identity(), &run.new_messages(), &options.source) {
            Ok(path) => (Some(path), None),
            Err(e) => (None, Some(format!("Logging failed: {}", e))),
        };

    Ok(Some(StreamOutcome {
        full_text,
        log_path,
        log_warning,
    }))
}

/// Single-pass iterator over the text increments of one exchange.
///
/// Concatenating every `Ok` item gives the full answer. An `Err` item is
/// always the last one. After the iterator returns `None`, [`outcome`]
/// holds the final text and the logging result.
///
/// [`outcome`]: ResponseStream::outcome
pub struct ResponseStream {
    receiver: Option<mpsc::Receiver<BridgeEvent>>,
    producer: Option<JoinHandle<()>>,
    startup_error: Option<FaqError>,
    outcome: Option<StreamOutcome>,
    finished: bool,
}

impl ResponseStream {
    /// Available once the stream has been exhausted without error.
    pub fn outcome(&self) -> Option<&StreamOutcome> {
        self.outcome.as_ref()
    }

    pub fn into_outcome(mut self) -> Option<StreamOutcome> {
        self.outcome.take()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Closing the channel is what tells an unfinished producer to stop
        self.receiver = None;
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }
    }
}

impl Iterator for ResponseStream {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(e) = self.startup_error.take() {
            self.finish();
            return Some(Err(e));
        }

        let event = match self.receiver.as_mut() {
            Some(receiver) => receiver.blocking_recv(),
            None => None,
        };

        match event {
            Some(BridgeEvent::Increment(text)) => Some(Ok(text)),
            Some(BridgeEvent::Finished(outcome)) => {
                self.outcome = Some(outcome);
                self.finish();
                None
            }
            Some(BridgeEvent::Failed(e)) => {
                self.finish();
                Some(Err(e))
            }
            None => {
                self.finish();
                Some(Err(FaqError::Other(
                    "Response stream ended unexpectedly".to_string(),
                )))
            }
        }
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}
