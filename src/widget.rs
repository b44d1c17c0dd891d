//! The chat widget: transcript, persistence and the single in-flight exchange.

use crate::agent::{ChatClient, ChatRequest, HealthReport};
use crate::config::WidgetConfig;
use crate::error::{ChatError, FailureKind};
use crate::history::{decode_history, encode_history, ChatMessage, Role};
use crate::status::{spawn_ticker, StatusRotation};
use crate::store::KeyValueStore;
use crate::view::View;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Bot line shown for any failed exchange.
pub const CONNECTION_ERROR_TEXT: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Replied,
    Failed(FailureKind),
    /// The chat was cleared while the reply was pending; it was dropped.
    Discarded,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Empty,
    Busy,
    UnknownQuestion,
}

pub fn new_session_id() -> String {
    format!("accessibility-chat-{}", Uuid::new_v4())
}

pub struct ChatWidget<C, S, V> {
    client: C,
    store: S,
    view: Arc<Mutex<V>>,
    backend_url: String,
    history_key: String,
    greeting: ChatMessage,
    status_phrases: Vec<String>,
    status_interval: Duration,
    example_questions: Vec<String>,
    transcript: Mutex<Vec<ChatMessage>>,
    session_id: Mutex<String>,
    busy: AtomicBool,
    examples_visible: AtomicBool,
}

impl<C, S, V> ChatWidget<C, S, V>
where
    C: ChatClient,
    S: KeyValueStore,
    V: View,
{
    /// Mounts into `view`, reusing its transcript container when present,
    /// then restores any saved history.
    ///
    /// A reused container's entries become the transcript, and its first
    /// bot entry becomes the greeting that `clear` returns to.
    pub fn mount(
        config: &WidgetConfig,
        backend_url: impl Into<String>,
        client: C,
        store: S,
        mut view: V,
    ) -> Self {
        let default_greeting = ChatMessage::bot(config.greeting.clone());
        let (greeting, transcript) = match view.existing_transcript() {
            Some(shown) => {
                info!(count = shown.len(), "Reusing existing transcript container");
                let greeting = shown
                    .iter()
                    .find(|m| m.role == Role::Bot && !m.error)
                    .cloned()
                    .unwrap_or(default_greeting);
                (greeting, shown)
            }
            None => {
                info!("Building transcript container");
                view.build_transcript(&default_greeting);
                (default_greeting.clone(), vec![default_greeting])
            }
        };

        let widget = Self {
            client,
            store,
            view: Arc::new(Mutex::new(view)),
            backend_url: backend_url.into(),
            history_key: config.history_key.clone(),
            greeting,
            status_phrases: config.status_phrases.clone(),
            status_interval: config.status_interval(),
            example_questions: config.example_questions.clone(),
            transcript: Mutex::new(transcript),
            session_id: Mutex::new(new_session_id()),
            busy: AtomicBool::new(false),
            examples_visible: AtomicBool::new(false),
        };
        widget.load();
        widget
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn session_id(&self) -> String {
        self.session_id.lock().unwrap().clone()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.lock().unwrap().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn example_questions(&self) -> &[String] {
        &self.example_questions
    }

    /// Runs `f` against the view, e.g. to export its markup.
    pub fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        let view = self.view.lock().unwrap();
        f(&*view)
    }

    fn append(&self, message: ChatMessage) {
        self.view.lock().unwrap().append(&message);
        self.transcript.lock().unwrap().push(message);
    }

    /// Overwrites the stored history with the current transcript.
    pub fn save(&self) {
        let encoded = {
            let transcript = self.transcript.lock().unwrap();
            encode_history(&transcript)
        };
        let result = encoded
            .map_err(Into::into)
            .and_then(|raw| self.store.set(&self.history_key, &raw));
        if let Err(e) = result {
            warn!(error = %e, "Failed to save chat history");
        }
    }

    /// Restores stored history holding more than one entry. Returns whether
    /// anything was restored.
    ///
    /// The stored form has no error flag, so bot entries carrying the
    /// connection error line are flagged again here.
    pub fn load(&self) -> bool {
        let raw = match self.store.get(&self.history_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Failed to read chat history");
                return false;
            }
        };
        let mut messages = match decode_history(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed chat history");
                return false;
            }
        };
        if messages.len() <= 1 {
            return false;
        }

        for message in &mut messages {
            if message.role == Role::Bot && message.text == CONNECTION_ERROR_TEXT {
                message.error = true;
            }
        }

        info!(count = messages.len(), "Restored chat history");
        self.view.lock().unwrap().replace(&messages);
        *self.transcript.lock().unwrap() = messages;
        true
    }

    /// Back to the greeting alone, with a fresh session and no stored history.
    pub fn clear(&self) {
        // Held until the new id is set; `send` checks the id under this lock.
        let mut session = self.session_id.lock().unwrap();
        {
            let mut transcript = self.transcript.lock().unwrap();
            transcript.clear();
            transcript.push(self.greeting.clone());
        }
        self.view
            .lock()
            .unwrap()
            .replace(std::slice::from_ref(&self.greeting));
        if let Err(e) = self.store.remove(&self.history_key) {
            warn!(error = %e, "Failed to delete chat history");
        }
        let session_id = new_session_id();
        info!(%session_id, "Cleared chat");
        *session = session_id;
    }

    /// Forwards `text` to the backend and appends the reply, or the error line.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored(IgnoreReason::Empty);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Send ignored while a reply is pending");
            return SendOutcome::Ignored(IgnoreReason::Busy);
        }

        let pending = Pending {
            busy: &self.busy,
            view: &self.view,
            ticker: None,
        };
        let request = ChatRequest {
            message: text.to_string(),
            conversation_id: self.session_id(),
        };
        self.append(ChatMessage::user(text));
        let pending = pending.start(&self.status_phrases, self.status_interval);

        let result = self.client.chat(&request).await;
        let pending = pending.stop_ticker().await;

        let session = self.session_id.lock().unwrap();
        if *session != request.conversation_id {
            info!(
                conversation_id = %request.conversation_id,
                "Dropping reply for a cleared conversation"
            );
            return SendOutcome::Discarded;
        }
        let outcome = match result {
            Ok(reply) => {
                self.append(ChatMessage::bot(reply));
                SendOutcome::Replied
            }
            Err(e) => {
                warn!(error = %e, "Chat exchange failed");
                self.append(ChatMessage::bot_error(CONNECTION_ERROR_TEXT));
                SendOutcome::Failed(e.kind())
            }
        };
        self.save();
        drop(session);
        drop(pending);
        outcome
    }

    /// Sends the example question at `index`.
    pub async fn ask_question(&self, index: usize) -> SendOutcome {
        match self.example_questions.get(index) {
            Some(question) => self.send(question).await,
            None => SendOutcome::Ignored(IgnoreReason::UnknownQuestion),
        }
    }

    /// Shows or hides the example questions. Returns the new visibility.
    pub fn toggle_examples(&self) -> bool {
        let visible = !self.examples_visible.fetch_xor(true, Ordering::AcqRel);
        let questions = visible.then_some(self.example_questions.as_slice());
        self.view.lock().unwrap().set_examples_visible(questions);
        visible
    }

    pub async fn health(&self) -> Result<HealthReport, ChatError> {
        self.client.health().await
    }
}

/// Pending state of one exchange. Dropping it returns the widget to idle.
struct Pending<'a, V: View> {
    busy: &'a AtomicBool,
    view: &'a Arc<Mutex<V>>,
    ticker: Option<JoinHandle<()>>,
}

impl<'a, V: View> Pending<'a, V> {
    fn start(mut self, phrases: &[String], period: Duration) -> Self {
        self.ticker = Some(spawn_ticker(
            self.view.clone(),
            StatusRotation::new(phrases),
            period,
        ));
        self
    }

    // Waits for the ticker to stop so it cannot overwrite the idle status.
    async fn stop_ticker(mut self) -> Self {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            let _ = ticker.await;
        }
        self
    }
}

impl<V: View> Drop for Pending<'_, V> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Ok(mut view) = self.view.lock() {
            view.set_pending(None);
        }
        self.busy.store(false, Ordering::Release);
    }
}
