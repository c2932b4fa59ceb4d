//! Terminal event pump.
//!
//! A background task polls crossterm and forwards input over a channel.  When
//! the terminal is idle it emits `Tick`s instead, which drive scroll
//! animations.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

/// High-level events consumed by the main loop.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// The next frame re-reads the terminal size.
    Resize,
    Tick,
}

impl AppEvent {
    fn from_crossterm(ev: CtEvent) -> Option<Self> {
        match ev {
            // Release/repeat events would double every keypress on terminals
            // that report them.
            CtEvent::Key(k) if k.kind == KeyEventKind::Press => Some(Self::Key(k)),
            CtEvent::Mouse(m) => Some(Self::Mouse(m)),
            CtEvent::Resize(..) => Some(Self::Resize),
            _ => None,
        }
    }
}

/// Spawn the reader task.  It stops once the receiver is dropped.
pub fn spawn_event_reader(tick_rate: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || loop {
        let next = match event::poll(tick_rate) {
            Ok(true) => match event::read() {
                Ok(ev) => AppEvent::from_crossterm(ev),
                Err(e) => {
                    tracing::warn!("terminal read failed: {e}");
                    None
                }
            },
            Ok(false) => Some(AppEvent::Tick),
            Err(e) => {
                tracing::warn!("terminal poll failed: {e}");
                break;
            }
        };
        if let Some(ev) = next {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });

    rx
}
