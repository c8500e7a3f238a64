use std::sync::Arc;

use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::api::{ExecuteReply, InterpretReply, OrchestratorClient};
use crate::session::{Entry, Session};
use crate::speech::Speaker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Transcript,
    QuickActions,
}

/// Preset command offered alongside the input box, mirroring the quick-action
/// buttons of the original web page.
pub struct QuickAction {
    pub label: &'static str,
    pub command: &'static str,
}

pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        label: "Balance",
        command: "What's my balance?",
    },
    QuickAction {
        label: "Account details",
        command: "Show my account details",
    },
    QuickAction {
        label: "Recent activity",
        command: "Show my recent transactions",
    },
    QuickAction {
        label: "Send $50 to Alice",
        command: "Send 50 to Alice",
    },
];

/// Outcome of a request task, delivered back to the event loop. Outcomes
/// arrive in completion order; overlapping requests are not deduplicated.
#[derive(Debug)]
pub enum NetOutcome {
    Interpret(anyhow::Result<InterpretReply>),
    Execute(anyhow::Result<ExecuteReply>),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // Conversation state
    pub session: Session,
    pub in_flight: usize,

    // Transcript viewport
    pub transcript_scroll: u16,
    pub transcript_height: u16,
    pub transcript_width: u16,

    // Quick actions
    pub quick_state: ListState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    client: OrchestratorClient,
    net_tx: mpsc::UnboundedSender<NetOutcome>,
}

impl App {
    pub fn new(
        base_url: &str,
        speaker: Arc<dyn Speaker>,
        net_tx: mpsc::UnboundedSender<NetOutcome>,
    ) -> Self {
        let mut quick_state = ListState::default();
        quick_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            input: String::new(),
            input_cursor: 0,

            session: Session::new(speaker),
            in_flight: 0,

            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,

            quick_state,

            animation_frame: 0,

            client: OrchestratorClient::new(base_url),
            net_tx,
        }
    }

    /// Submits whatever is in the input box and clears it.
    pub fn submit_input(&mut self) {
        let text = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        self.dispatch(&text);
    }

    /// Runs one command through the session and spawns whatever request it
    /// decided on. Input stays live while requests are outstanding.
    pub fn dispatch(&mut self, text: &str) {
        use crate::session::Request;

        match self.session.submit(text) {
            Some(Request::Interpret(text)) => {
                let client = self.client.clone();
                let tx = self.net_tx.clone();
                self.in_flight += 1;
                tokio::spawn(async move {
                    let _ = tx.send(NetOutcome::Interpret(client.interpret(&text).await));
                });
            }
            Some(Request::Execute(pending)) => {
                let client = self.client.clone();
                let tx = self.net_tx.clone();
                self.in_flight += 1;
                tokio::spawn(async move {
                    let _ = tx.send(NetOutcome::Execute(client.execute(&pending).await));
                });
            }
            None => {}
        }

        self.scroll_transcript_to_bottom();
    }

    pub fn apply_outcome(&mut self, outcome: NetOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            NetOutcome::Interpret(result) => self.session.apply_interpret(result),
            NetOutcome::Execute(result) => self.session.apply_execute(result),
        }
        self.scroll_transcript_to_bottom();
    }

    /// Run a preset command as if the user had typed it.
    pub fn run_selected_quick_action(&mut self) {
        if let Some(action) = self
            .quick_state
            .selected()
            .and_then(|i| QUICK_ACTIONS.get(i))
        {
            self.dispatch(action.command);
        }
    }

    pub fn quick_nav_down(&mut self) {
        let len = QUICK_ACTIONS.len();
        if len > 0 {
            let i = self.quick_state.selected().unwrap_or(0);
            self.quick_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn quick_nav_up(&mut self) {
        let i = self.quick_state.selected().unwrap_or(0);
        self.quick_state.select(Some(i.saturating_sub(1)));
    }

    // Transcript scrolling
    pub fn scroll_down(&mut self) {
        let max = self
            .transcript_line_count()
            .saturating_sub(self.transcript_height);
        if self.transcript_scroll < max {
            self.transcript_scroll = self.transcript_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
    }

    pub fn scroll_to_top(&mut self) {
        self.transcript_scroll = 0;
    }

    pub fn scroll_transcript_to_bottom(&mut self) {
        let visible = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };
        self.transcript_scroll = self.transcript_line_count().saturating_sub(visible);
    }

    /// Estimate of rendered transcript lines at the current pane width, for
    /// scroll clamping. Mirrors the wrapping done in `ui::transcript_lines`.
    fn transcript_line_count(&self) -> u16 {
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            60
        };

        let mut total: u16 = 0;
        for entry in self.session.transcript() {
            match entry {
                Entry::Message(msg) => {
                    total += 2; // sender line + trailing blank
                    for line in msg.text.lines() {
                        // Character count, not byte length, for UTF-8 text.
                        let char_count = line.chars().count();
                        if char_count == 0 {
                            total += 1;
                        } else {
                            total += ((char_count.saturating_sub(1) / wrap_width) + 1) as u16;
                        }
                    }
                }
                Entry::Receipt(_) => total += 5, // title + three fields + blank
            }
        }

        if self.in_flight > 0 {
            total += 2; // sender line + "Thinking..."
        }

        total
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.in_flight > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
