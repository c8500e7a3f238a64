use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug)]
pub enum TermEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
}

/// Forwards crossterm events and a periodic tick over a single channel so the
/// main loop has one thing to await.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<TermEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut stream = event::EventStream::new();
            let mut ticker = tokio::time::interval(tick_rate);
            loop {
                let term_event = tokio::select! {
                    _ = ticker.tick() => Some(TermEvent::Tick),
                    maybe = stream.next() => match maybe {
                        // Key press only; release events would double-fire.
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            Some(TermEvent::Key(key))
                        }
                        Some(Ok(Event::Mouse(mouse))) => Some(TermEvent::Mouse(mouse)),
                        Some(Ok(Event::Resize(_, _))) => Some(TermEvent::Resize),
                        Some(_) => None,
                        None => break,
                    },
                };

                if let Some(term_event) = term_event {
                    if tx.send(term_event).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Option<TermEvent> {
        self.rx.recv().await
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(
        io::stdout(),
        EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(
        io::stdout(),
        crossterm::event::DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
