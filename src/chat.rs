use crate::bridge::{StreamOutcome, StreamingBridge};
use crate::error::{FaqError, Result};
use crate::models::{Message, Transcript};
use std::io::BufRead;

/// Where a chat session renders itself.
pub trait ChatView {
    fn show_message(&mut self, message: &Message);

    fn begin_response(&mut self);

    fn show_increment(&mut self, text: &str);

    fn end_response(&mut self);

    fn show_warning(&mut self, warning: &str);

    fn show_error(&mut self, error: &FaqError);

    fn show_notice(&mut self, _notice: &str) {}

    fn show_prompt(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Clear,
    Exit,
    Empty,
}

pub fn parse_input(line: &str) -> Command {
    let line = line.trim();
    match line {
        "" => Command::Empty,
        "/clear" => Command::Clear,
        "/exit" | "/quit" => Command::Exit,
        question => Command::Ask(question.to_string()),
    }
}

/// One UI session: owns the transcript and runs one exchange per question.
pub struct ChatSession {
    bridge: StreamingBridge,
    transcript: Transcript,
}

impl ChatSession {
    pub fn new(bridge: StreamingBridge) -> Self {
        Self {
            bridge,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn reset(&mut self) {
        self.transcript.clear();
    }

    pub fn render_history(&self, view: &mut dyn ChatView) {
        for message in self.transcript.messages() {
            view.show_message(message);
        }
    }

    /// Ask one question and stream the answer into `view`.
    ///
    /// Blank input is ignored. On an agent error the error is rendered and
    /// returned; the question stays in the transcript without an answer.
    pub fn submit(&mut self, input: &str, view: &mut dyn ChatView) -> Result<Option<StreamOutcome>> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return Ok(None);
        }

        let question = Message::user(prompt);
        view.show_message(&question);
        self.transcript.push(question);

        view.begin_response();
        let mut stream = self.bridge.stream_response(prompt);
        let mut streamed = String::new();
        for item in &mut stream {
            match item {
                Ok(text) => {
                    view.show_increment(&text);
                    streamed.push_str(&text);
                }
                Err(e) => {
                    view.end_response();
                    view.show_error(&e);
                    return Err(e);
                }
            }
        }
        view.end_response();

        let outcome = stream.into_outcome().unwrap_or_else(|| StreamOutcome {
            full_text: streamed,
            ..StreamOutcome::default()
        });
        if let Some(warning) = &outcome.log_warning {
            view.show_warning(warning);
        }

        self.transcript.push(Message::assistant(outcome.full_text.clone()));
        Ok(Some(outcome))
    }

    /// Read questions line by line until EOF or `/exit`. Failed exchanges
    /// are reported through `view` and do not end the session.
    pub fn run<R: BufRead>(&mut self, input: R, view: &mut dyn ChatView) -> Result<()> {
        let mut lines = input.lines();
        loop {
            view.show_prompt();
            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };

            match parse_input(&line) {
                Command::Empty => continue,
                Command::Exit => break,
                Command::Clear => {
                    self.reset();
                    view.show_notice("Conversation cleared.");
                }
                Command::Ask(question) => {
                    let _ = self.submit(&question, view);
                }
            }
        }

        self.reset();
        Ok(())
    }
}
