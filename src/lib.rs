//! Accessibility assistant chat widget.
//!
//! [`ChatWidget`] keeps the transcript, talks to the chat backend through a
//! [`ChatClient`], persists history in a [`KeyValueStore`] and renders into a
//! [`View`].

pub mod agent;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod history;
pub mod logging;
pub mod render;
pub mod status;
pub mod store;
pub mod view;
pub mod widget;

pub use agent::{ChatClient, ChatRequest, HealthReport, HttpChatClient};
pub use config::WidgetConfig;
pub use endpoint::{resolve_backend_url, Endpoint, EndpointSource};
pub use error::{ChatError, ConfigError, FailureKind, StoreError};
pub use history::{ChatMessage, Role};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use view::{HtmlView, TerminalView, View};
pub use widget::{ChatWidget, IgnoreReason, SendOutcome, CONNECTION_ERROR_TEXT};
