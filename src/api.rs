use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::session::PendingTransaction;

#[derive(Serialize)]
struct InterpretRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityCheck {
    pub prompt: String,
}

/// Reply from the "process voice command" endpoint. Every field is optional;
/// which ones are present depends on the recognized intent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterpretReply {
    pub intent: Option<String>,
    pub security_check: Option<SecurityCheck>,
    pub amount: Option<f64>,
    pub recipient: Option<String>,
    pub proactive_alert: Option<String>,
    pub response_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteReply {
    pub status: String,
    pub new_balance: Option<f64>,
    pub response_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    client: Client,
    base_url: String,
}

impl OrchestratorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends free-form user text to the orchestration service for intent
    /// interpretation. The backend reports failures in the body rather than
    /// the HTTP status, so the body is parsed regardless of the status code;
    /// an unparseable body counts as a network failure.
    pub async fn interpret(&self, text: &str) -> Result<InterpretReply> {
        let url = format!("{}/api/process_voice", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&InterpretRequest { text })
            .send()
            .await?;

        Ok(response.json().await?)
    }

    /// Posts a confirmed transfer for execution.
    pub async fn execute(&self, pending: &PendingTransaction) -> Result<ExecuteReply> {
        let url = format!("{}/api/execute_transaction", self.base_url);

        let response = self.client.post(&url).json(pending).send().await?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn interpret_request_body_matches_wire_format() {
        let body = serde_json::to_value(InterpretRequest {
            text: "Send 50 to Alice",
        })
        .unwrap();
        assert_eq!(body, json!({ "text": "Send 50 to Alice" }));
    }

    #[test]
    fn execute_request_body_matches_wire_format() {
        let pending = PendingTransaction {
            amount: 50.0,
            recipient: "Alice".to_string(),
        };
        let body = serde_json::to_value(&pending).unwrap();
        assert_eq!(body, json!({ "amount": 50.0, "recipient": "Alice" }));
    }

    #[test]
    fn deserializes_transfer_reply_with_security_check() {
        let raw = r#"{
            "intent": "Transfer_Funds",
            "security_check": { "prompt": "Please say 'CONFIRM TRANSACTION' to proceed." },
            "amount": 50,
            "recipient": "Alice",
            "proactive_alert": "Low balance warning"
        }"#;

        let reply: InterpretReply = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.intent.as_deref(), Some("Transfer_Funds"));
        assert_eq!(reply.amount, Some(50.0));
        assert_eq!(reply.recipient.as_deref(), Some("Alice"));
        assert!(reply.security_check.unwrap().prompt.contains("CONFIRM"));
        assert!(reply.response_text.is_none());
    }

    #[test]
    fn deserializes_minimal_interpret_reply() {
        let raw = r#"{ "response_text": "Your current account balance is $450.50." }"#;

        let reply: InterpretReply = serde_json::from_str(raw).unwrap();
        assert_eq!(
            reply.response_text.as_deref(),
            Some("Your current account balance is $450.50.")
        );
        assert!(reply.intent.is_none());
        assert!(reply.security_check.is_none());
        assert!(reply.proactive_alert.is_none());
    }

    #[test]
    fn deserializes_execute_success_reply() {
        let raw = r#"{ "status": "success", "new_balance": 450.5, "response_text": "Transfer complete." }"#;

        let reply: ExecuteReply = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.status, "success");
        assert_eq!(reply.new_balance, Some(450.5));
    }

    #[test]
    fn deserializes_execute_failure_without_balance() {
        let raw = r#"{ "status": "failure", "response_text": "Transfer failed: Insufficient funds for outbound transfer." }"#;

        let reply: ExecuteReply = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.status, "failure");
        assert!(reply.new_balance.is_none());
        assert!(reply.response_text.unwrap().contains("Insufficient funds"));
    }
}
