use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use course_assistant_core::{logging, Config, Conversation, HttpBackend, ModelChoice, Presets};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser, Debug)]
#[command(name = "course-assistant")]
#[command(version, about = "Terminal chat client for the Brainlox course assistant")]
struct Cli {
    /// Base URL of the assistant API
    #[arg(long, env = "API_URL")]
    api_url: Option<String>,

    /// Model shown in the settings panel (mistral-large-latest, mistral-medium, mistral-small-latest)
    #[arg(short, long)]
    model: Option<String>,

    /// Seconds to wait for the backend before giving up on a request
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Directory for log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; API_URL may come from the real environment
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let (config, config_error) = Config::load_or_default();

    let log_dir = match cli.log_dir.clone() {
        Some(dir) => dir,
        None => config.log_dir()?,
    };
    let _log_guard = logging::init_logging(&log_dir)?;
    if let Some(e) = config_error {
        tracing::warn!("could not load config, using defaults: {:#}", e);
    }

    let selected_model = match cli.model.as_deref() {
        Some(name) => ModelChoice::from_str(name)
            .ok_or_else(|| anyhow!("Unknown model '{}'", name))?,
        None => config.model(),
    };
    let timeout = cli
        .timeout
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.request_timeout());
    let api_url = config.api_url(cli.api_url.as_deref());

    tracing::info!(%api_url, model = selected_model.as_str(), ?timeout, "starting course assistant");

    let backend = Arc::new(HttpBackend::new(&api_url, timeout));
    let conversation = Conversation::new(Presets::from_config(config.sample_questions.as_deref()));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(conversation, backend, api_url, selected_model, events.sender());
    app.persist_model = true;

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        if app.take_redraw() {
            terminal.draw(|frame| ui::render(app, frame))?;
        }

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
