mod common;

use common::{text, FailingSink, RecordingSink, ScriptedAgent};
use faq_assistant::bridge::StreamingBridge;
use faq_assistant::chat::{parse_input, ChatSession, ChatView, Command};
use faq_assistant::error::FaqError;
use faq_assistant::models::{Message, Role};
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Message(Role, String),
    Begin,
    Increment(String),
    End,
    Warning(String),
    Error(String),
    Notice(String),
    Prompt,
}

#[derive(Default)]
struct RecordingView {
    events: Vec<Event>,
}

impl RecordingView {
    fn increments(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Increment(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, wanted: fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| wanted(e)).count()
    }
}

impl ChatView for RecordingView {
    fn show_message(&mut self, message: &Message) {
        self.events
            .push(Event::Message(message.role, message.content.clone()));
    }

    fn begin_response(&mut self) {
        self.events.push(Event::Begin);
    }

    fn show_increment(&mut self, text: &str) {
        self.events.push(Event::Increment(text.to_string()));
    }

    fn end_response(&mut self) {
        self.events.push(Event::End);
    }

    fn show_warning(&mut self, warning: &str) {
        self.events.push(Event::Warning(warning.to_string()));
    }

    fn show_error(&mut self, error: &FaqError) {
        self.events.push(Event::Error(error.to_string()));
    }

    fn show_notice(&mut self, notice: &str) {
        self.events.push(Event::Notice(notice.to_string()));
    }

    fn show_prompt(&mut self) {
        self.events.push(Event::Prompt);
    }
}

fn deadline_session(sink: Arc<RecordingSink>) -> ChatSession {
    let agent = Arc::new(ScriptedAgent::new(vec![
        text("The"),
        text("The deadline"),
        text("The deadline is"),
    ]));
    ChatSession::new(StreamingBridge::new(agent, sink))
}

#[test]
fn test_parse_input_commands() {
    assert_eq!(parse_input("   "), Command::Empty);
    assert_eq!(parse_input("/clear"), Command::Clear);
    assert_eq!(parse_input(" /exit "), Command::Exit);
    assert_eq!(parse_input("/quit"), Command::Exit);
    assert_eq!(
        parse_input("  When is the deadline?\n"),
        Command::Ask("When is the deadline?".to_string())
    );
    assert_eq!(
        parse_input("/unknown"),
        Command::Ask("/unknown".to_string())
    );
}

#[test]
fn test_submit_streams_and_records_exchange() {
    let sink = Arc::new(RecordingSink::default());
    let mut session = deadline_session(sink.clone());
    let mut view = RecordingView::default();

    let outcome = session
        .submit("What is the deadline for module 2?", &mut view)
        .unwrap()
        .expect("question was asked");

    assert_eq!(outcome.full_text, "The deadline is");
    assert_eq!(
        view.events,
        vec![
            Event::Message(Role::User, "What is the deadline for module 2?".to_string()),
            Event::Begin,
            Event::Increment("The".to_string()),
            Event::Increment(" deadline".to_string()),
            Event::Increment(" is".to_string()),
            Event::End,
        ]
    );

    let transcript = session.transcript().messages();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[0].content, "What is the deadline for module 2?");
    assert_eq!(transcript[1].role, Role::Assistant);
    assert_eq!(transcript[1].content, "The deadline is");
    assert_eq!(sink.call_count(), 1);
}

#[test]
fn test_blank_submit_does_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let mut session = deadline_session(sink.clone());
    let mut view = RecordingView::default();

    assert!(session.submit("   ", &mut view).unwrap().is_none());
    assert!(view.events.is_empty());
    assert!(session.transcript().is_empty());
    assert_eq!(sink.call_count(), 0);
}

#[test]
fn test_failed_exchange_shows_error_and_keeps_question_only() {
    let sink = Arc::new(RecordingSink::default());
    let agent = Arc::new(ScriptedAgent::failing_on_start());
    let mut session = ChatSession::new(StreamingBridge::new(agent, sink.clone()));
    let mut view = RecordingView::default();

    let result = session.submit("Is there a certificate?", &mut view);

    assert!(matches!(result, Err(FaqError::ApiError { status: 503, .. })));
    assert_eq!(view.count(|e| matches!(e, Event::Error(_))), 1);
    assert!(view.increments().is_empty());
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.transcript().last().unwrap().role, Role::User);
    assert_eq!(sink.call_count(), 0);
}

#[test]
fn test_logging_failure_surfaces_as_warning() {
    let agent = Arc::new(ScriptedAgent::new(vec![text("Yes, there is.")]));
    let mut session = ChatSession::new(StreamingBridge::new(agent, Arc::new(FailingSink)));
    let mut view = RecordingView::default();

    let outcome = session.submit("Certificate?", &mut view).unwrap().unwrap();

    assert_eq!(outcome.full_text, "Yes, there is.");
    let warnings: Vec<&Event> = view
        .events
        .iter()
        .filter(|e| matches!(e, Event::Warning(_)))
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], Event::Warning(w) if w.contains("Logging failed")));
    assert_eq!(session.transcript().len(), 2);
}

#[test]
fn test_render_history_replays_transcript() {
    let mut session = deadline_session(Arc::new(RecordingSink::default()));
    session
        .submit("Deadline?", &mut RecordingView::default())
        .unwrap();

    let mut view = RecordingView::default();
    session.render_history(&mut view);

    assert_eq!(
        view.events,
        vec![
            Event::Message(Role::User, "Deadline?".to_string()),
            Event::Message(Role::Assistant, "The deadline is".to_string()),
        ]
    );
}

#[test]
fn test_run_loop_handles_commands_until_exit() {
    let sink = Arc::new(RecordingSink::default());
    let mut session = deadline_session(sink.clone());
    let mut view = RecordingView::default();
    let input = Cursor::new("First question\n\n/clear\nSecond question\n/exit\nNever asked\n");

    session.run(input, &mut view).unwrap();

    assert_eq!(sink.call_count(), 2);
    assert_eq!(view.count(|e| matches!(e, Event::Begin)), 2);
    assert_eq!(
        view.count(|e| matches!(e, Event::Notice(n) if n == "Conversation cleared.")),
        1
    );
    assert!(!view
        .events
        .iter()
        .any(|e| matches!(e, Event::Message(_, text) if text == "Never asked")));
    // One prompt per line read up to and including /exit
    assert_eq!(view.count(|e| matches!(e, Event::Prompt)), 5);
    assert!(session.transcript().is_empty());
}

#[test]
fn test_run_loop_survives_failed_exchange_and_ends_at_eof() {
    let sink = Arc::new(RecordingSink::default());
    let agent = Arc::new(ScriptedAgent::failing_on_start());
    let mut session = ChatSession::new(StreamingBridge::new(agent.clone(), sink));
    let mut view = RecordingView::default();

    session
        .run(Cursor::new("one\ntwo\n"), &mut view)
        .unwrap();

    assert_eq!(view.count(|e| matches!(e, Event::Error(_))), 2);
    assert_eq!(agent.prompts.lock().unwrap().len(), 2);
}
