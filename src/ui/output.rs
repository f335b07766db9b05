use crate::chat::ChatView;
use crate::error::FaqError;
use crate::models::{Message, Role};
use crate::ui::highlight::CodeBuffer;
use colored::*;
use std::io::{self, Write};
use std::time::{Duration, Instant};

const FLUSH_INTERVAL: Duration = Duration::from_millis(50);

/// Print the application banner
pub fn display_header(caption: &str) {
    println!("{}", "🤖 AI FAQ Assistant".bold());
    println!("{}", caption.dimmed());
    println!(
        "{}",
        "Type a question, /clear to reset the conversation, /exit to quit.".dimmed()
    );
    println!();
}

/// Render markdown content in one go
pub fn display_content(content: &str) {
    let mut code_buffer = CodeBuffer::new();
    let formatted = code_buffer.append(content);
    if !formatted.is_empty() {
        print!("{}", formatted);
    }
    let remaining = code_buffer.flush();
    if !remaining.is_empty() {
        print!("{}", remaining.trim_end());
    }
    println!();
}

/// Chat rendered on stdout, diagnostics on stderr.
pub struct TerminalView {
    code_buffer: CodeBuffer,
    last_flush: Instant,
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            code_buffer: CodeBuffer::new(),
            last_flush: Instant::now(),
        }
    }

    fn role_label(role: Role) -> ColoredString {
        match role {
            Role::User => "You".green().bold(),
            Role::Assistant => "Assistant".cyan().bold(),
        }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for TerminalView {
    fn show_message(&mut self, message: &Message) {
        println!("{}", Self::role_label(message.role));
        match message.role {
            Role::User => println!("{}", message.content),
            Role::Assistant => display_content(&message.content),
        }
        println!();
    }

    fn begin_response(&mut self) {
        println!("{}", Self::role_label(Role::Assistant));
        self.last_flush = Instant::now();
    }

    fn show_increment(&mut self, text: &str) {
        let formatted = self.code_buffer.append(text);
        if !formatted.is_empty() {
            print!("{}", formatted);
            if self.last_flush.elapsed() > FLUSH_INTERVAL {
                let _ = io::stdout().flush();
                self.last_flush = Instant::now();
            }
        }
    }

    fn end_response(&mut self) {
        let remaining = self.code_buffer.flush();
        if !remaining.is_empty() {
            print!("{}", remaining.trim_end());
        }
        println!();
        println!();
        let _ = io::stdout().flush();
    }

    fn show_warning(&mut self, warning: &str) {
        eprintln!("{}", format!("Warning: {}", warning).yellow());
    }

    fn show_error(&mut self, error: &FaqError) {
        eprintln!("{} {}", "Error:".red(), error);
    }

    fn show_notice(&mut self, notice: &str) {
        println!("{}", notice.dimmed());
    }

    fn show_prompt(&mut self) {
        print!("{} ", ">".green().bold());
        let _ = io::stdout().flush();
    }
}
