//! A terminal viewer for briefs and research notes.
//!
//! Run the binary with a Markdown file to open the document pane and its
//! live outline.  Run with `--print-outline` to dump the section list to
//! stdout instead.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::AppState,
};
use crate::config::{AppConfig, ConfigStore};
use crate::core::document::Document;

/// Frame interval while idle; drives scroll animation.
const TICK: Duration = Duration::from_millis(33);

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Terminal viewer for briefs and research notes")]
struct Cli {
    /// Markdown or plain-text document to open.
    path: PathBuf,

    /// Sticky header height in rows for this session (reference line for
    /// the active section).
    #[arg(long)]
    offset: Option<u16>,

    /// Start with the outline hidden.
    #[arg(long)]
    no_outline: bool,

    /// Print `id<TAB>title` for every section and exit.
    #[arg(long)]
    print_outline: bool,
}

fn print_outline(doc: &Document) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for section in &doc.sections {
        let indent = "  ".repeat(usize::from(section.level.saturating_sub(1)));
        writeln!(out, "{}\t{indent}{}", section.id, section.title)?;
    }
    out.flush()
}

// ───────────────────────────────────────── event loop ───────

type Term = Terminal<CrosstermBackend<io::Stderr>>;

fn apply_event(state: &mut AppState, event: AppEvent) {
    match event {
        AppEvent::Key(k) => handler::handle_key(state, k),
        AppEvent::Mouse(m) => handler::handle_mouse(state, m),
        AppEvent::Resize => {}
        AppEvent::Tick => state.surface.tick(),
    }
}

async fn run(terminal: &mut Term, state: &mut AppState, events: &mut UnboundedReceiver<AppEvent>) -> Result<()> {
    loop {
        let size = terminal.size()?;
        state.sync_layout(Rect::new(0, 0, size.width, size.height));
        // One recompute per frame, however many scroll steps happened.
        state.dispatch_scroll();

        terminal.draw(|frame| ui::draw(frame, state))?;

        let Some(event) = events.recv().await else {
            break;
        };
        apply_event(state, event);
        // Drain the backlog so a burst of wheel events costs one redraw.
        while let Ok(event) = events.try_recv() {
            apply_event(state, event);
        }

        if state.should_quit {
            break;
        }
    }
    Ok(())
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (only emits when RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();

    let doc = Document::load(&cli.path).with_context(|| format!("cannot open {}", cli.path.display()))?;
    tracing::debug!(sections = doc.sections.len(), title = %doc.title, "document loaded");

    // ── outline-dump mode ─────────────────────────────────────
    if cli.print_outline {
        print_outline(&doc)?;
        return Ok(());
    }

    let store = ConfigStore::default_location();
    let mut config = AppConfig::load(&store);
    if cli.no_outline {
        config.prefs.set_outline_visible(false);
    }
    let mut state = AppState::new(cli.path.clone(), doc, config, store);
    if let Some(rows) = cli.offset {
        state.apply_header_rows(rows);
    }

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    execute!(stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stderr()))?;

    let mut events = spawn_event_reader(TICK);
    let result = run(&mut terminal, &mut state, &mut events).await;

    // ── teardown (runs on error too) ──────────────────────────
    state.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
