use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "chat_widget=info";

/// Logs go to a daily-rolling file so the terminal transcript stays readable.
/// Keep the returned guard alive for the lifetime of the process.
pub fn configure_logging(log_dir: &Path, json: bool) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "chat-widget.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = Registry::default().with(filter);
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync + 'static> = if json {
        Box::new(
            subscriber.with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false),
            ),
        )
    } else {
        Box::new(
            subscriber.with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(writer)
                    .with_ansi(false),
            ),
        )
    };

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {e}");
    }
    guard
}
