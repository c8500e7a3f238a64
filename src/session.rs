use std::sync::Arc;

use serde::Serialize;

use crate::api::{ExecuteReply, InterpretReply};
use crate::speech::Speaker;

pub const TRANSFER_INTENT: &str = "Transfer_Funds";

pub const CANCELLED_TEXT: &str = "Transaction cancelled. You can start a new request.";
pub const INTERPRET_FALLBACK_TEXT: &str = "Error processing request.";
pub const INTERPRET_OFFLINE_TEXT: &str =
    "Sorry, I encountered a network error connecting to the orchestration service.";
pub const EXECUTE_FAILED_TEXT: &str = "Transfer failed due to a banking error.";
pub const EXECUTE_DONE_TEXT: &str = "Transfer completed.";
pub const EXECUTE_OFFLINE_TEXT: &str =
    "Critical error: transaction execution failed while contacting the banking service.";
pub const NO_SPEECH_TEXT: &str =
    "Text-to-speech is unavailable on this system. Voice output is disabled.";

/// Fixed two-decimal dollar rendering, whatever precision the backend sent.
pub fn format_usd(value: f64) -> String {
    format!("${:.2}", value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    System,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

/// Summary card appended to the transcript after a successful transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReceipt {
    pub amount: f64,
    pub recipient: String,
    pub new_balance: f64,
}

#[derive(Debug, Clone)]
pub enum Entry {
    Message(Message),
    Receipt(TransactionReceipt),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingTransaction {
    pub amount: f64,
    pub recipient: String,
}

/// A pending transaction only exists while the session is awaiting
/// confirmation, so it lives inside the state variant.
#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,
    AwaitingConfirmation(PendingTransaction),
}

/// Network request the session wants issued as a result of a submission.
/// The caller owns the actual I/O; the session only decides.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Interpret(String),
    Execute(PendingTransaction),
}

/// The chat session controller: owns the append-only transcript, the alert
/// banner, and the confirm/execute state machine. All mutation happens on the
/// UI event loop; request outcomes are applied when they are delivered back.
pub struct Session {
    transcript: Vec<Entry>,
    alert: Option<String>,
    state: SessionState,
    speaker: Arc<dyn Speaker>,
}

impl Session {
    pub fn new(speaker: Arc<dyn Speaker>) -> Self {
        let mut session = Self {
            transcript: Vec::new(),
            alert: None,
            state: SessionState::Idle,
            speaker,
        };
        if !session.speaker.is_available() {
            session.push(Sender::System, NO_SPEECH_TEXT.to_string(), false);
        }
        session
    }

    pub fn transcript(&self) -> &[Entry] {
        &self.transcript
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        matches!(self.state, SessionState::AwaitingConfirmation(_))
    }

    /// Handles one user submission. Whitespace-only input is a no-op.
    /// Returns the network request to issue, if any.
    pub fn submit(&mut self, raw: &str) -> Option<Request> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        self.push(Sender::User, text.to_string(), false);

        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::AwaitingConfirmation(pending) => {
                let upper = text.to_uppercase();
                if upper.contains("CONFIRM") || upper.contains("YES") {
                    // Stays in the confirmation state until the execute
                    // outcome lands, which resets it unconditionally.
                    self.state = SessionState::AwaitingConfirmation(pending.clone());
                    Some(Request::Execute(pending))
                } else {
                    self.push(Sender::System, CANCELLED_TEXT.to_string(), true);
                    None
                }
            }
            SessionState::Idle => Some(Request::Interpret(text.to_string())),
        }
    }

    /// Applies the outcome of an Interpret request.
    pub fn apply_interpret(&mut self, outcome: anyhow::Result<InterpretReply>) {
        let reply = match outcome {
            Ok(reply) => reply,
            Err(_) => {
                self.push(Sender::System, INTERPRET_OFFLINE_TEXT.to_string(), false);
                return;
            }
        };

        // Every reply replaces the banner; an absent or empty alert clears it.
        self.alert = reply.proactive_alert.filter(|alert| !alert.trim().is_empty());

        if reply.intent.as_deref() == Some(TRANSFER_INTENT) {
            if let (Some(check), Some(amount), Some(recipient)) =
                (reply.security_check, reply.amount, reply.recipient)
            {
                self.state =
                    SessionState::AwaitingConfirmation(PendingTransaction { amount, recipient });
                self.push(Sender::System, check.prompt, true);
                return;
            }
        }

        let text = reply
            .response_text
            .unwrap_or_else(|| INTERPRET_FALLBACK_TEXT.to_string());
        self.push(Sender::System, text, true);
    }

    /// Applies the outcome of an Execute request. Whatever happened, the
    /// pending transaction is consumed and the session returns to idle, so a
    /// failed execution can never strand the user mid-confirmation.
    pub fn apply_execute(&mut self, outcome: anyhow::Result<ExecuteReply>) {
        let previous = std::mem::replace(&mut self.state, SessionState::Idle);
        let pending = match previous {
            SessionState::AwaitingConfirmation(pending) => Some(pending),
            SessionState::Idle => None,
        };

        match outcome {
            Ok(reply) if reply.status == "success" => match (pending, reply.new_balance) {
                (Some(pending), Some(new_balance)) => {
                    let spoken = format!(
                        "Transfer of {} complete. Your new balance is {}.",
                        format_usd(pending.amount),
                        format_usd(new_balance)
                    );
                    self.speaker.speak(&spoken);
                    self.transcript.push(Entry::Receipt(TransactionReceipt {
                        amount: pending.amount,
                        recipient: pending.recipient,
                        new_balance,
                    }));
                }
                _ => {
                    let text = reply
                        .response_text
                        .unwrap_or_else(|| EXECUTE_DONE_TEXT.to_string());
                    self.push(Sender::System, text, true);
                }
            },
            Ok(reply) => {
                let text = reply
                    .response_text
                    .unwrap_or_else(|| EXECUTE_FAILED_TEXT.to_string());
                self.push(Sender::System, text, true);
            }
            Err(_) => {
                self.push(Sender::System, EXECUTE_OFFLINE_TEXT.to_string(), false);
            }
        }
    }

    fn push(&mut self, sender: Sender, text: String, speak: bool) {
        if speak {
            self.speaker.speak(&text);
        }
        self.transcript.push(Entry::Message(Message { sender, text }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SecurityCheck;
    use crate::speech::{NullSpeaker, RecordingSpeaker};
    use anyhow::anyhow;

    fn session() -> (Session, Arc<RecordingSpeaker>) {
        let speaker = RecordingSpeaker::new();
        (Session::new(speaker.clone()), speaker)
    }

    fn transfer_reply(amount: f64, recipient: &str, prompt: &str) -> InterpretReply {
        InterpretReply {
            intent: Some(TRANSFER_INTENT.to_string()),
            security_check: Some(SecurityCheck {
                prompt: prompt.to_string(),
            }),
            amount: Some(amount),
            recipient: Some(recipient.to_string()),
            ..InterpretReply::default()
        }
    }

    fn user_messages(session: &Session) -> Vec<&str> {
        session
            .transcript()
            .iter()
            .filter_map(|entry| match entry {
                Entry::Message(msg) if msg.sender == Sender::User => Some(msg.text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn last_message(session: &Session) -> &Message {
        session
            .transcript()
            .iter()
            .rev()
            .find_map(|entry| match entry {
                Entry::Message(msg) => Some(msg),
                Entry::Receipt(_) => None,
            })
            .expect("transcript has no messages")
    }

    #[test]
    fn idle_submit_appends_one_user_message_and_one_interpret_request() {
        let (mut session, _) = session();

        let request = session.submit("  What's my balance?  ");

        assert_eq!(
            request,
            Some(Request::Interpret("What's my balance?".to_string()))
        );
        assert_eq!(user_messages(&session), vec!["What's my balance?"]);
    }

    #[test]
    fn whitespace_submit_is_a_noop() {
        let (mut session, _) = session();

        assert_eq!(session.submit("   \t "), None);
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn transfer_reply_with_security_check_awaits_confirmation() {
        let (mut session, speaker) = session();
        session.submit("Send 50 to Alice");

        session.apply_interpret(Ok(transfer_reply(50.0, "Alice", "Say CONFIRM to proceed.")));

        match session.state() {
            SessionState::AwaitingConfirmation(pending) => {
                assert_eq!(pending.amount, 50.0);
                assert_eq!(pending.recipient, "Alice");
            }
            SessionState::Idle => panic!("expected awaiting confirmation"),
        }
        assert_eq!(last_message(&session).text, "Say CONFIRM to proceed.");
        assert_eq!(speaker.spoken(), vec!["Say CONFIRM to proceed."]);
    }

    #[test]
    fn confirmation_replies_trigger_execute_case_insensitively() {
        for reply in ["CONFIRM", "confirm transaction", "Yes please", "yES"] {
            let (mut session, _) = session();
            session.submit("Send 50 to Alice");
            session.apply_interpret(Ok(transfer_reply(50.0, "Alice", "Confirm?")));

            let request = session.submit(reply);

            assert_eq!(
                request,
                Some(Request::Execute(PendingTransaction {
                    amount: 50.0,
                    recipient: "Alice".to_string(),
                })),
                "reply {reply:?} should execute"
            );
            assert!(session.is_awaiting_confirmation());
        }
    }

    #[test]
    fn any_other_reply_cancels_and_clears_pending() {
        let (mut session, speaker) = session();
        session.submit("Send 50 to Alice");
        session.apply_interpret(Ok(transfer_reply(50.0, "Alice", "Confirm?")));

        let request = session.submit("no thanks");

        assert_eq!(request, None);
        assert!(!session.is_awaiting_confirmation());
        assert_eq!(last_message(&session).text, CANCELLED_TEXT);
        assert!(speaker.spoken().contains(&CANCELLED_TEXT.to_string()));
    }

    #[test]
    fn interpret_reply_displays_and_speaks_response_text() {
        let (mut session, speaker) = session();
        session.submit("What's my balance?");

        session.apply_interpret(Ok(InterpretReply {
            response_text: Some("Your current account balance is $450.50.".to_string()),
            ..InterpretReply::default()
        }));

        assert_eq!(
            last_message(&session).text,
            "Your current account balance is $450.50."
        );
        assert_eq!(
            speaker.spoken(),
            vec!["Your current account balance is $450.50."]
        );
        assert!(!session.is_awaiting_confirmation());
    }

    #[test]
    fn interpret_reply_without_text_falls_back_to_generic_error() {
        let (mut session, _) = session();
        session.submit("mumble");

        session.apply_interpret(Ok(InterpretReply::default()));

        assert_eq!(last_message(&session).text, INTERPRET_FALLBACK_TEXT);
    }

    #[test]
    fn interpret_network_failure_is_displayed_but_not_spoken() {
        let (mut session, speaker) = session();
        session.submit("What's my balance?");

        session.apply_interpret(Err(anyhow!("connection refused")));

        assert_eq!(last_message(&session).text, INTERPRET_OFFLINE_TEXT);
        assert!(speaker.spoken().is_empty());
        assert!(!session.is_awaiting_confirmation());
    }

    #[test]
    fn alert_banner_is_replaced_each_reply_and_cleared_when_absent() {
        let (mut session, _) = session();

        session.apply_interpret(Ok(InterpretReply {
            proactive_alert: Some("LOW BALANCE: Your balance is only $450.50.".to_string()),
            response_text: Some("ok".to_string()),
            ..InterpretReply::default()
        }));
        assert_eq!(
            session.alert(),
            Some("LOW BALANCE: Your balance is only $450.50.")
        );

        session.apply_interpret(Ok(InterpretReply {
            proactive_alert: Some("New alert".to_string()),
            response_text: Some("ok".to_string()),
            ..InterpretReply::default()
        }));
        assert_eq!(session.alert(), Some("New alert"));

        session.apply_interpret(Ok(InterpretReply {
            response_text: Some("ok".to_string()),
            ..InterpretReply::default()
        }));
        assert_eq!(session.alert(), None);
    }

    #[test]
    fn confirmed_transfer_appends_receipt_and_resets_to_idle() {
        let (mut session, speaker) = session();
        session.submit("Send $50 to Alice");
        session.apply_interpret(Ok(transfer_reply(50.0, "Alice", "Confirm?")));
        session.submit("CONFIRM");

        session.apply_execute(Ok(ExecuteReply {
            status: "success".to_string(),
            new_balance: Some(450.5),
            response_text: None,
        }));

        let receipt = session
            .transcript()
            .iter()
            .find_map(|entry| match entry {
                Entry::Receipt(receipt) => Some(receipt),
                Entry::Message(_) => None,
            })
            .expect("expected a receipt card");
        assert_eq!(format_usd(receipt.amount), "$50.00");
        assert_eq!(receipt.recipient, "Alice");
        assert_eq!(format_usd(receipt.new_balance), "$450.50");
        assert!(!session.is_awaiting_confirmation());
        assert!(speaker
            .spoken()
            .contains(&"Transfer of $50.00 complete. Your new balance is $450.50.".to_string()));
    }

    #[test]
    fn execute_backend_failure_speaks_failure_text_and_resets() {
        let (mut session, speaker) = session();
        session.submit("Send 900 to Bob");
        session.apply_interpret(Ok(transfer_reply(900.0, "Bob", "Confirm?")));
        session.submit("yes");

        session.apply_execute(Ok(ExecuteReply {
            status: "failure".to_string(),
            new_balance: None,
            response_text: Some("Transfer failed: Insufficient funds.".to_string()),
        }));

        assert_eq!(
            last_message(&session).text,
            "Transfer failed: Insufficient funds."
        );
        assert!(speaker
            .spoken()
            .contains(&"Transfer failed: Insufficient funds.".to_string()));
        assert!(!session.is_awaiting_confirmation());
    }

    #[test]
    fn execute_backend_failure_without_text_uses_generic_text() {
        let (mut session, _) = session();
        session.submit("Send 900 to Bob");
        session.apply_interpret(Ok(transfer_reply(900.0, "Bob", "Confirm?")));
        session.submit("yes");

        session.apply_execute(Ok(ExecuteReply {
            status: "error".to_string(),
            new_balance: None,
            response_text: None,
        }));

        assert_eq!(last_message(&session).text, EXECUTE_FAILED_TEXT);
    }

    #[test]
    fn execute_network_failure_is_displayed_unspoken_and_resets() {
        let (mut session, speaker) = session();
        session.submit("Send 50 to Alice");
        session.apply_interpret(Ok(transfer_reply(50.0, "Alice", "Confirm?")));
        let spoken_before = speaker.spoken().len();
        session.submit("confirm");

        session.apply_execute(Err(anyhow!("connection reset")));

        assert_eq!(last_message(&session).text, EXECUTE_OFFLINE_TEXT);
        assert_eq!(speaker.spoken().len(), spoken_before);
        assert!(!session.is_awaiting_confirmation());
    }

    #[test]
    fn missing_speech_capability_shows_one_time_warning() {
        let session = Session::new(Arc::new(NullSpeaker));

        match &session.transcript()[0] {
            Entry::Message(msg) => {
                assert_eq!(msg.sender, Sender::System);
                assert_eq!(msg.text, NO_SPEECH_TEXT);
            }
            Entry::Receipt(_) => panic!("expected warning message"),
        }
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn format_usd_always_renders_two_decimals() {
        assert_eq!(format_usd(50.0), "$50.00");
        assert_eq!(format_usd(450.5), "$450.50");
        assert_eq!(format_usd(0.125), "$0.12");
        assert_eq!(format_usd(1000.0), "$1000.00");
    }
}
