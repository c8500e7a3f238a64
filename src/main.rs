use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

mod api;
mod app;
mod config;
mod handler;
mod session;
mod speech;
mod tui;
mod ui;

use app::{App, NetOutcome};
use config::Config;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let base_url = config.base_url();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let (net_tx, mut net_rx) = mpsc::unbounded_channel();
    let mut app = App::new(&base_url, speech::system_speaker(), net_tx);
    let mut events = EventHandler::new(Duration::from_millis(300));

    let result = run(&mut terminal, &mut app, &mut events, &mut net_rx).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut EventHandler,
    net_rx: &mut mpsc::UnboundedReceiver<NetOutcome>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event)?,
            Some(outcome) = net_rx.recv() => app.apply_outcome(outcome),
        }
    }
    Ok(())
}
