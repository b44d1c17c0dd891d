//! Visible surfaces the widget renders into.

use crate::history::{ChatMessage, Role};
use crate::render::{render_message, RenderOptions};
use colored::Colorize;
use std::fmt::Display;
use std::io::Write;
use tracing::warn;

pub const TRANSCRIPT_CONTAINER_ID: &str = "chat-messages";
pub const HOST_REGION_ID: &str = "ai";

pub trait View: Send + 'static {
    /// Entries of a transcript container the page already shows, if any.
    fn existing_transcript(&self) -> Option<Vec<ChatMessage>>;
    /// Creates the container, seeded with the greeting.
    fn build_transcript(&mut self, greeting: &ChatMessage);
    /// Adds one entry and scrolls to it.
    fn append(&mut self, message: &ChatMessage);
    /// Replaces every entry.
    fn replace(&mut self, messages: &[ChatMessage]);
    /// `Some(status)` while an exchange is pending, `None` once idle.
    fn set_pending(&mut self, status: Option<&str>);
    fn set_examples_visible(&mut self, questions: Option<&[String]>);
}

/// In-memory markup model of the widget's DOM.
#[derive(Debug, Default)]
pub struct HtmlView {
    opts: RenderOptions,
    messages: Option<Vec<ChatMessage>>,
    scroll_top: usize,
    status: Option<String>,
    examples: Option<Vec<String>>,
}

impl HtmlView {
    /// A page without a transcript container; the widget will build one
    /// inside the `ai` host region.
    pub fn new(opts: RenderOptions) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    /// A page that already ships a `chat-messages` container.
    pub fn with_existing_container(opts: RenderOptions, messages: &[ChatMessage]) -> Self {
        Self {
            opts,
            messages: Some(messages.to_vec()),
            scroll_top: messages.len().saturating_sub(1),
            ..Self::default()
        }
    }

    /// Rendered markup of each visible entry.
    pub fn entries(&self) -> Vec<String> {
        self.messages
            .iter()
            .flatten()
            .map(|m| render_message(m, self.opts))
            .collect()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn send_enabled(&self) -> bool {
        self.status.is_none()
    }

    /// Index of the entry scrolled into view.
    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn examples(&self) -> Option<&[String]> {
        self.examples.as_deref()
    }

    /// Markup of the host region with the widget mounted in it.
    pub fn to_html(&self) -> String {
        let mut html = format!(r#"<section id="{HOST_REGION_ID}"><div class="chatbot-container">"#);
        html.push_str(&format!(
            r#"<div class="chat-messages" id="{TRANSCRIPT_CONTAINER_ID}">"#
        ));
        for entry in self.entries() {
            html.push_str(&entry);
        }
        html.push_str("</div>");
        if let Some(status) = &self.status {
            html.push_str(&format!(
                r#"<div class="chat-status" role="status">{}</div>"#,
                crate::render::escape_html(status)
            ));
        }
        html.push_str(&format!(
            r#"<button id="send-button" class="send-button"{}>Send</button>"#,
            if self.send_enabled() { "" } else { " disabled" }
        ));
        if let Some(questions) = &self.examples {
            html.push_str(r#"<div class="example-questions" id="example-questions">"#);
            for q in questions {
                html.push_str(&format!(
                    r#"<button class="question-chip">{}</button>"#,
                    crate::render::escape_html(q)
                ));
            }
            html.push_str("</div>");
        }
        html.push_str("</div></section>");
        html
    }
}

impl View for HtmlView {
    fn existing_transcript(&self) -> Option<Vec<ChatMessage>> {
        self.messages.clone()
    }

    fn build_transcript(&mut self, greeting: &ChatMessage) {
        self.messages = Some(vec![greeting.clone()]);
        self.scroll_top = 0;
    }

    fn append(&mut self, message: &ChatMessage) {
        let messages = self.messages.get_or_insert_with(Vec::new);
        messages.push(message.clone());
        self.scroll_top = messages.len() - 1;
    }

    fn replace(&mut self, messages: &[ChatMessage]) {
        self.scroll_top = messages.len().saturating_sub(1);
        self.messages = Some(messages.to_vec());
    }

    fn set_pending(&mut self, status: Option<&str>) {
        self.status = status.map(str::to_string);
    }

    fn set_examples_visible(&mut self, questions: Option<&[String]>) {
        self.examples = questions.map(<[String]>::to_vec);
    }
}

/// Line-oriented rendering for a terminal.
pub struct TerminalView<W: Write + Send + 'static> {
    out: W,
    shown: Option<Vec<ChatMessage>>,
    status: Option<String>,
    output_failed: bool,
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: None,
            status: None,
            output_failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Set once a write to the terminal has failed.
    pub fn output_failed(&self) -> bool {
        self.output_failed
    }

    // A lost terminal line is not worth failing the exchange over; the
    // first failure is logged and later ones are dropped silently.
    fn emit(&mut self, line: impl Display) {
        let result = writeln!(self.out, "{line}").and_then(|()| self.out.flush());
        if let Err(e) = result {
            if !self.output_failed {
                warn!(error = %e, "Terminal output failed");
            }
            self.output_failed = true;
        }
    }

    fn print(&mut self, message: &ChatMessage) {
        let label = match (message.role, message.error) {
            (Role::User, _) => "You".cyan().bold(),
            (Role::Bot, false) => "Assistant".green().bold(),
            (Role::Bot, true) => "Assistant".red().bold(),
        };
        let mut lines = message.text.lines();
        let first = lines.next().unwrap_or_default();
        self.emit(format_args!("{label}: {first}"));
        for line in lines {
            self.emit(format_args!("    {line}"));
        }
    }
}

impl<W: Write + Send + 'static> View for TerminalView<W> {
    fn existing_transcript(&self) -> Option<Vec<ChatMessage>> {
        self.shown.clone()
    }

    fn build_transcript(&mut self, greeting: &ChatMessage) {
        self.shown = Some(vec![greeting.clone()]);
        self.emit("Accessibility Assistant".bold());
        self.emit("Type a question, or /examples, /clear, /health, /quit.".dimmed());
        self.print(greeting);
    }

    fn append(&mut self, message: &ChatMessage) {
        self.shown.get_or_insert_with(Vec::new).push(message.clone());
        self.print(message);
    }

    fn replace(&mut self, messages: &[ChatMessage]) {
        self.shown = Some(messages.to_vec());
        self.emit(format!("-- showing {} messages --", messages.len()).dimmed());
        for message in messages {
            self.print(message);
        }
    }

    fn set_pending(&mut self, status: Option<&str>) {
        if status == self.status.as_deref() {
            return;
        }
        self.status = status.map(str::to_string);
        if let Some(status) = status {
            self.emit(format!("... {status}").yellow());
        }
    }

    fn set_examples_visible(&mut self, questions: Option<&[String]>) {
        if let Some(questions) = questions {
            self.emit("Try asking (/ask <n>):".bold());
            for (i, q) in questions.iter().enumerate() {
                self.emit(format_args!("  {}. {q}", i + 1));
            }
        }
    }
}
