//! `libris`: terminal client for the library service.
//!
//! # Usage
//!
//! ```text
//! libris                                   # interactive TUI
//! libris login --username ann
//! libris books list --search dune
//! libris --json borrows
//! libris --url http://library.local:8000 recommendations --limit 5
//! ```

mod app;
mod commands;
mod fetch;
mod settings;
mod ui;

use std::{fs::File, io, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use app::{App, Msg};
use clap::Parser;
use commands::{Command, Invocation};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use libris_client::{Gateway, LibraryClient};
use libris_core::{
  session::SessionStore,
  token::{MemoryTokenStore, TokenStore},
};
use libris_store_sqlite::SqliteTokenStore;
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::{DEFAULT_CONFIG_PATH, Overrides, Settings};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "libris", version, about = "Terminal client for the library service")]
struct Args {
  /// Path to a TOML config file (api_url, store_path, request_timeout_secs).
  #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
  config: PathBuf,

  /// Base URL of the library API (default: http://localhost:8000).
  #[arg(long)]
  url: Option<String>,

  /// Where to keep the login credential between runs.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  /// Keep the credential in memory only; nothing is written to disk.
  #[arg(long)]
  ephemeral: bool,

  /// Print raw JSON instead of formatted text.
  #[arg(long, global = true)]
  json: bool,

  /// Write logs here while the TUI is running.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  init_tracing(args.command.is_some(), args.log_file.as_ref())?;

  let settings = Settings::load(&args.config, Overrides {
    api_url:    args.url,
    store_path: args.store,
  })?;

  let storage: Arc<dyn TokenStore> = if args.ephemeral {
    Arc::new(MemoryTokenStore::new())
  } else {
    let store = SqliteTokenStore::open(&settings.store_path)
      .with_context(|| format!("failed to open credential store at {:?}", settings.store_path))?;
    Arc::new(store)
  };
  let session = SessionStore::new(storage);
  tracing::debug!(api_url = %settings.api_url, "starting");

  match args.command {
    Some(command) => {
      session.load_from_storage();
      let gateway = Gateway::with_session(settings.gateway_config(), session.clone(), || {
        eprintln!("Your login is no longer valid. Run `libris login` to sign in again.");
      })
      .context("failed to build HTTP client")?;
      let client = LibraryClient::new(gateway);
      commands::run(command, Invocation {
        client:  &client,
        session: &session,
        json:    args.json,
      })
      .await
    }
    None => run_tui(&settings, session).await,
  }
}

/// One-shot commands log to stderr. The TUI owns the terminal, so it only
/// logs when given a file.
fn init_tracing(one_shot: bool, log_file: Option<&PathBuf>) -> Result<()> {
  let filter = || {
    EnvFilter::builder()
      .with_default_directive(LevelFilter::WARN.into())
      .from_env_lossy()
  };

  if one_shot {
    tracing_subscriber::fmt()
      .with_env_filter(filter())
      .with_writer(io::stderr)
      .init();
  } else if let Some(path) = log_file {
    let file = File::create(path)
      .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(filter())
      .with_writer(std::sync::Mutex::new(file))
      .with_ansi(false)
      .init();
  }
  Ok(())
}

// ─── TUI ──────────────────────────────────────────────────────────────────────

async fn run_tui(settings: &Settings, session: SessionStore) -> Result<()> {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let redirect = tx.clone();
  let gateway = Gateway::with_session(settings.gateway_config(), session.clone(), move || {
    let _ = redirect.send(Msg::LoginRequired);
  })
  .context("failed to build HTTP client")?;
  let mut app = App::new(LibraryClient::new(gateway), session, tx);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  app.start();
  let run_result = run_event_loop(&mut terminal, &mut app, &mut rx).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  rx: &mut UnboundedReceiver<Msg>,
) -> Result<()> {
  loop {
    // Apply whatever the spawned calls have delivered since the last frame.
    while let Ok(msg) = rx.try_recv() {
      app.apply(msg);
    }

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key)
    {
      break;
    }
  }

  Ok(())
}
