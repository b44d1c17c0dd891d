use anyhow::Context;
use chat_widget::config::{default_config_path, load_or_initialize_config};
use chat_widget::logging::configure_logging;
use chat_widget::render::RenderOptions;
use chat_widget::{
    resolve_backend_url, ChatWidget, FileStore, HtmlView, HttpChatClient, IgnoreReason,
    KeyValueStore, MemoryStore, SendOutcome, TerminalView,
};
use clap::Parser;
use colored::Colorize;
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

type TerminalWidget = ChatWidget<HttpChatClient, Box<dyn KeyValueStore>, TerminalView<Stdout>>;

#[derive(Debug, Parser)]
#[command(name = "chat-widget", version, about = "Accessibility assistant chat in the terminal")]
struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Chat backend base URL; wins over host-based resolution.
    #[arg(long, env = "CHAT_BACKEND_URL")]
    backend_url: Option<String>,
    /// Host name the widget is considered served from.
    #[arg(long)]
    host: Option<String>,
    /// Directory for chat history and logs.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Keep history in memory only.
    #[arg(long)]
    ephemeral: bool,
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Send(String),
    Ask(usize),
    Clear,
    Examples,
    Health,
    Export(PathBuf),
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };
        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map(|(n, a)| (n, a.trim()))
            .unwrap_or((rest, ""));
        match name {
            "quit" | "exit" => Command::Quit,
            "clear" => Command::Clear,
            "examples" => Command::Examples,
            "health" => Command::Health,
            // Numbered from 1 as shown by /examples.
            "ask" => match arg.parse::<usize>() {
                Ok(n) if n > 0 => Command::Ask(n - 1),
                _ => Command::Help,
            },
            "export" if !arg.is_empty() => Command::Export(PathBuf::from(arg)),
            _ => Command::Help,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(FileStore::default_dir)
        .context("no data directory available; pass --data-dir")?;
    let _log_guard = configure_logging(&data_dir.join("logs"), cli.log_json);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = load_or_initialize_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if cli.backend_url.is_some() {
        config.backend_url = cli.backend_url.clone();
    }
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }

    let endpoint = resolve_backend_url(config.backend_url.as_deref(), &config.host);
    let backend_url = endpoint.base_url.clone();
    let client = HttpChatClient::new(endpoint, config.request_timeout())?;
    let store: Box<dyn KeyValueStore> = if cli.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::new(data_dir))
    };
    let render = RenderOptions {
        rich_bot_markup: config.rich_bot_markup,
    };

    let widget = Arc::new(ChatWidget::mount(
        &config,
        backend_url,
        client,
        store,
        TerminalView::stdout(),
    ));
    info!(backend = widget.backend_url(), session = %widget.session_id(), "Chat widget ready");

    run(widget, render).await
}

async fn run(widget: Arc<TerminalWidget>, render: RenderOptions) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Send(text) => dispatch(&widget, Input::Text(text)),
            Command::Ask(index) => dispatch(&widget, Input::Question(index)),
            Command::Clear => {
                widget.clear();
                println!("{}", "Chat cleared.".dimmed());
            }
            Command::Examples => {
                if !widget.toggle_examples() {
                    println!("{}", "Example questions hidden.".dimmed());
                }
            }
            Command::Health => {
                let widget = widget.clone();
                tokio::spawn(async move {
                    match widget.health().await {
                        Ok(report) if report.is_healthy() => println!(
                            "{} {} (api key {})",
                            "Backend healthy:".green(),
                            widget.backend_url(),
                            report.api_key.as_deref().unwrap_or("unknown")
                        ),
                        Ok(report) => println!("{} {}", "Backend status:".yellow(), report.status),
                        Err(e) => println!("{} {e}", "Backend unreachable:".red()),
                    }
                });
            }
            Command::Export(path) => {
                let html = HtmlView::with_existing_container(render, &widget.transcript()).to_html();
                match std::fs::write(&path, html) {
                    Ok(()) => println!("{} {}", "Exported to".dimmed(), path.display()),
                    Err(e) => println!("{} {e}", "Export failed:".red()),
                }
            }
            Command::Help => println!(
                "{}",
                "Commands: /examples, /ask <n>, /clear, /health, /export <file>, /quit".dimmed()
            ),
        }
    }
    Ok(())
}

enum Input {
    Text(String),
    Question(usize),
}

// Runs on its own task so input typed while a reply is pending reaches the busy guard.
fn dispatch(widget: &Arc<TerminalWidget>, input: Input) {
    let widget = widget.clone();
    tokio::spawn(async move {
        let outcome = match input {
            Input::Text(text) => widget.send(&text).await,
            Input::Question(index) => widget.ask_question(index).await,
        };
        match outcome {
            SendOutcome::Ignored(IgnoreReason::Busy) => {
                println!("{}", "Still waiting for the previous reply.".dimmed())
            }
            SendOutcome::Ignored(IgnoreReason::UnknownQuestion) => {
                println!("{}", "No such example question; try /examples.".dimmed())
            }
            _ => {}
        }
    });
}
