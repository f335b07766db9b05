use crate::api::models::StreamResponse;
use crate::error::{FaqError, Result};
use colored::*;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use tokio::time::{timeout, Duration};

struct SseState<S> {
    bytes: Pin<Box<S>>,
    incomplete_line: Vec<u8>,
    pending: VecDeque<String>,
    finished: bool,
    chunk_timeout: Duration,
    verbose: bool,
}

impl<S> SseState<S> {
    /// Consume every complete line in `incomplete_line`, queueing content deltas.
    /// Lines are decoded only once complete, so a character split across
    /// network reads is never cut in half.
    fn drain_complete_lines(&mut self) {
        while let Some(line_end) = self.incomplete_line.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.incomplete_line.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            self.process_line(line.trim_end_matches(['\n', '\r']));
            if self.finished {
                self.incomplete_line.clear();
                return;
            }
        }
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() || line.starts_with(':') {
            return;
        }

        let Some(colon_pos) = line.find(':') else {
            return;
        };
        let field = line[..colon_pos].trim();
        let value = line[colon_pos + 1..].trim_start();

        match field {
            "data" => {
                if value == "[DONE]" {
                    self.finished = true;
                    return;
                }

                match serde_json::from_str::<StreamResponse>(value) {
                    Ok(parsed) => {
                        for choice in parsed.choices.into_iter().flatten() {
                            if let Some(content) = choice.delta.and_then(|d| d.content) {
                                if !content.is_empty() {
                                    self.pending.push_back(content);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        if self.verbose {
                            eprintln!("{}", format!("[faq] JSON parse error: {}", e).dimmed());
                        }
                    }
                }
            }
            "event" | "id" | "retry" => {
                if self.verbose {
                    eprintln!("{}", format!("[faq] SSE {}: {}", field, value).dimmed());
                }
            }
            _ => {
                if self.verbose {
                    eprintln!("{}", format!("[faq] Unknown SSE field: {}", field).dimmed());
                }
            }
        }
    }
}

/// Content deltas of a chat-completions SSE body. Ends at `data: [DONE]` or
/// when the body ends; fails with `FaqError::Timeout` if no bytes arrive
/// within `chunk_timeout`.
pub fn content_deltas<S, B, E>(
    bytes: S,
    chunk_timeout: Duration,
    verbose: bool,
) -> BoxStream<'static, Result<String>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<FaqError> + Send + 'static,
{
    let state = SseState {
        bytes: Box::pin(bytes),
        incomplete_line: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
        chunk_timeout,
        verbose,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(delta) = state.pending.pop_front() {
                return Some((Ok(delta), state));
            }
            if state.finished {
                return None;
            }

            match timeout(state.chunk_timeout, state.bytes.next()).await {
                Ok(Some(Ok(chunk))) => {
                    state.incomplete_line.extend_from_slice(chunk.as_ref());
                    state.drain_complete_lines();
                }
                Ok(Some(Err(e))) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                Ok(None) => {
                    // Body ended without [DONE]; a trailing line may lack its newline
                    let rest = std::mem::take(&mut state.incomplete_line);
                    let rest = String::from_utf8_lossy(&rest);
                    state.process_line(rest.trim_end_matches('\r'));
                    state.finished = true;
                }
                Err(_) => {
                    if state.verbose {
                        eprintln!(
                            "{}",
                            format!(
                                "[faq] No data received for {} seconds",
                                state.chunk_timeout.as_secs()
                            )
                            .dimmed()
                        );
                    }
                    state.finished = true;
                    return Some((Err(FaqError::Timeout), state));
                }
            }
        }
    })
    .boxed()
}

/// Content deltas of a streaming HTTP response.
pub fn response_deltas(
    response: reqwest::Response,
    timeout_secs: u64,
    verbose: bool,
) -> BoxStream<'static, Result<String>> {
    content_deltas(
        response.bytes_stream(),
        Duration::from_secs(timeout_secs),
        verbose,
    )
}
