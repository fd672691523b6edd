//! Intake TUI - terminal intake form with adaptive field visibility
//!
//! A Ratatui-based form that loads its fields from a catalog file, shows and
//! hides them as the answers change, autosaves locally and submits to an
//! intake server, keeping submissions locally while the server is away.

mod app;
mod catalog;
mod config;
mod state;
mod storage;
mod submission;
mod ui;
mod visibility;

use anyhow::{Context, Result};
use app::App;
use catalog::Catalog;
use config::Settings;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use storage::{LocalStore, STORE_FILE};
use submission::HttpSubmissionClient;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "intake-tui.log";

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load(std::env::args().nth(1).map(PathBuf::from))?;

    init_logging(&settings.data_dir);
    tracing::info!(
        catalog = %settings.catalog_path.display(),
        server = %settings.server_url,
        "Starting intake-tui"
    );

    // Without a catalog there is nothing to render
    let catalog = Catalog::load(&settings.catalog_path)
        .with_context(|| format!("Cannot load field catalog {}", settings.catalog_path.display()))?;

    let (store, store_error) = match LocalStore::open(settings.data_dir.join(STORE_FILE)) {
        Ok(store) => (store, None),
        Err(e) => {
            tracing::error!(error = %e, "Local store unavailable, answers will not persist");
            (LocalStore::in_memory(), Some(e))
        }
    };
    let client = HttpSubmissionClient::new(&settings.server_url, settings.request_timeout)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&settings, catalog, store.into_shared(), Arc::new(client));
    if let Some(e) = store_error {
        app.push_error(format!("Saved data is unavailable: {e}"));
    }
    app.start_resubmit();
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

/// Log to a file in the data directory; stderr would draw over the form
fn init_logging(data_dir: &Path) {
    let log_file = fs::create_dir_all(data_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join(LOG_FILE))
    });
    let writer = match log_file {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(io::stderr),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_tui=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key)?;
                }
            }
        }

        // Debounced commits, autosave and finished submissions
        app.tick(Instant::now()).await;

        if app.should_quit() {
            return Ok(());
        }
    }
}
