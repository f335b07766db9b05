use colored::*;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

const FENCE: &str = "```";
const THEME: &str = "Solarized (dark)";
const RULE: &str = "─────────────────────────────────────────────────";
const FOOTER: &str = "└──────────────────────────────────────────────────────────";

struct CodeBlock {
    lang: Option<String>,
    content: String,
    shown_lines: usize,
}

/// Incremental markdown renderer for streamed answers. Plain text passes
/// through; fenced code blocks are framed and syntax highlighted line by
/// line as they complete.
pub struct CodeBuffer {
    pending: String,
    block: Option<CodeBlock>,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self {
            pending: String::new(),
            block: None,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let Some(theme) = self.theme_set.themes.get(THEME) else {
            return code.to_string();
        };

        let syntax = lang
            .and_then(|lang| {
                self.syntax_set
                    .find_syntax_by_token(lang)
                    .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            })
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut output = String::new();

        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => {
                    let ranges: Vec<(Style, &str)> = ranges;
                    output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
                }
                Err(_) => output.push_str(line),
            }
        }

        output
    }

    fn header(lang: Option<&str>) -> String {
        format!(
            "{}[{}]{}\n",
            "┌─".dimmed(),
            lang.unwrap_or("code").cyan(),
            RULE.dimmed()
        )
    }

    fn footer() -> String {
        format!("{}\n", FOOTER.dimmed())
    }

    /// Highlight the lines of the open block not shown yet. With `complete`
    /// false the last (possibly partial) line is held back.
    fn emit_block_lines(&mut self, complete: bool) -> String {
        let Some(block) = self.block.as_ref() else {
            return String::new();
        };

        let lines: Vec<&str> = block.content.lines().collect();
        let end = if complete || block.content.ends_with('\n') {
            lines.len()
        } else {
            lines.len().saturating_sub(1)
        };
        if end <= block.shown_lines {
            return String::new();
        }

        let chunk = lines[block.shown_lines..end].join("\n") + "\n";
        let highlighted = self.highlight_code(&chunk, block.lang.as_deref());

        if let Some(block) = self.block.as_mut() {
            block.shown_lines = end;
        }
        highlighted
    }

    pub fn append(&mut self, content: &str) -> String {
        self.pending.push_str(content);
        let mut output = String::new();

        while !self.pending.is_empty() {
            if self.block.is_none() {
                if let Some(start) = self.pending.find(FENCE) {
                    let after = &self.pending[start + FENCE.len()..];
                    let Some(newline) = after.find('\n') else {
                        // Language line not complete yet
                        output.push_str(&self.pending[..start]);
                        self.pending.drain(..start);
                        break;
                    };

                    let lang = after[..newline].trim();
                    let lang = (!lang.is_empty()).then(|| lang.to_string());
                    output.push_str(&self.pending[..start]);
                    output.push_str(&Self::header(lang.as_deref()));
                    self.pending.drain(..start + FENCE.len() + newline + 1);
                    self.block = Some(CodeBlock {
                        lang,
                        content: String::new(),
                        shown_lines: 0,
                    });
                } else {
                    // A trailing backtick may be the start of a fence
                    let keep = self.pending.len() - self.pending.trim_end_matches('`').len();
                    let emit = self.pending.len() - keep.min(FENCE.len() - 1);
                    output.push_str(&self.pending[..emit]);
                    self.pending.drain(..emit);
                    break;
                }
            } else if let Some(end) = self.pending.find(FENCE) {
                let code: String = self.pending.drain(..end + FENCE.len()).collect();
                if let Some(block) = self.block.as_mut() {
                    block.content.push_str(&code[..end]);
                }
                output.push_str(&self.emit_block_lines(true));
                output.push_str(&Self::footer());
                self.block = None;
            } else {
                // Keep possible partial fence back until more arrives
                let keep = self.pending.len() - self.pending.trim_end_matches('`').len();
                let take = self.pending.len() - keep.min(FENCE.len() - 1);
                let code: String = self.pending.drain(..take).collect();
                if let Some(block) = self.block.as_mut() {
                    block.content.push_str(&code);
                }
                output.push_str(&self.emit_block_lines(false));
                break;
            }
        }

        output
    }

    pub fn flush(&mut self) -> String {
        let mut output = String::new();

        if self.block.is_some() {
            // Unterminated code block
            let rest = std::mem::take(&mut self.pending);
            if let Some(block) = self.block.as_mut() {
                block.content.push_str(&rest);
            }
            output.push_str(&self.emit_block_lines(true));
            output.push_str(&Self::footer());
            self.block = None;
        } else {
            output.push_str(&self.pending);
            self.pending.clear();
        }

        output
    }
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}
