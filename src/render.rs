//! Markup rendering of message text.

use crate::history::{ChatMessage, Role};

/// Tags that survive escaping in bot text when rich markup is enabled.
const ALLOWED_TAGS: [&str; 5] = ["b", "i", "em", "strong", "code"];

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub rich_bot_markup: bool,
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaped text with newlines turned into `<br>`.
pub fn render_text(message: &ChatMessage, opts: RenderOptions) -> String {
    let mut html = escape_html(&message.text);
    if opts.rich_bot_markup && message.role == Role::Bot {
        html = restore_allowed_tags(&html);
    }
    html.replace("\r\n", "\n").replace('\n', "<br>")
}

/// CSS classes of the message wrapper, e.g. `message bot-message error-message`.
pub fn message_class(message: &ChatMessage) -> String {
    let mut class = format!("message {}-message", message.role.as_str());
    if message.error {
        class.push_str(" error-message");
    }
    class
}

pub fn render_message(message: &ChatMessage, opts: RenderOptions) -> String {
    format!(
        r#"<div class="{}"><div class="message-content">{}</div></div>"#,
        message_class(message),
        render_text(message, opts)
    )
}

// Only exact, attribute-less forms are restored.
fn restore_allowed_tags(escaped: &str) -> String {
    let mut html = escaped.to_string();
    for tag in ALLOWED_TAGS {
        html = html
            .replace(&format!("&lt;{tag}&gt;"), &format!("<{tag}>"))
            .replace(&format!("&lt;/{tag}&gt;"), &format!("</{tag}>"));
    }
    for br in ["&lt;br&gt;", "&lt;br/&gt;", "&lt;br /&gt;"] {
        html = html.replace(br, "<br>");
    }
    html
}
