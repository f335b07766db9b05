use crate::error::{FaqError, Result};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

struct CoalesceState {
    deltas: BoxStream<'static, Result<String>>,
    text: String,
    error: Option<FaqError>,
    done: bool,
    debounce: Duration,
}

/// Turn a stream of text deltas into cumulative snapshots. After the first
/// delta of a batch arrives, further deltas are absorbed until `debounce`
/// has elapsed, then one snapshot of everything received so far is emitted.
pub fn coalesce_cumulative(
    deltas: BoxStream<'static, Result<String>>,
    debounce: Duration,
) -> BoxStream<'static, Result<String>> {
    let state = CoalesceState {
        deltas,
        text: String::new(),
        error: None,
        done: false,
        debounce,
    };

    stream::unfold(state, |mut state| async move {
        if let Some(e) = state.error.take() {
            state.done = true;
            return Some((Err(e), state));
        }
        if state.done {
            return None;
        }

        match state.deltas.next().await {
            None => return None,
            Some(Err(e)) => {
                state.done = true;
                return Some((Err(e), state));
            }
            Some(Ok(delta)) => state.text.push_str(&delta),
        }

        let deadline = Instant::now() + state.debounce;
        loop {
            match timeout_at(deadline, state.deltas.next()).await {
                Ok(Some(Ok(delta))) => state.text.push_str(&delta),
                Ok(Some(Err(e))) => {
                    // Flush what we have, report the error next
                    state.error = Some(e);
                    break;
                }
                Ok(None) => {
                    state.done = true;
                    break;
                }
                Err(_) => break,
            }
        }

        let snapshot = state.text.clone();
        Some((Ok(snapshot), state))
    })
    .boxed()
}
