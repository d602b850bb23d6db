//! Outbound mail transport.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tracing::info;

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// A fully rendered message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Transport acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub id: String,
}

/// Something that can deliver one email. Exactly one attempt per call.
pub trait Dispatcher {
    fn send(&self, api_key: &str, email: &OutgoingEmail) -> Result<DeliveryReceipt>;
}

/// Resend-compatible HTTP transport.
#[derive(Debug, Clone)]
pub struct ResendDispatcher {
    endpoint: String,
}

impl Default for ResendDispatcher {
    fn default() -> Self {
        Self::new(RESEND_ENDPOINT)
    }
}

impl ResendDispatcher {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl Dispatcher for ResendDispatcher {
    fn send(&self, api_key: &str, email: &OutgoingEmail) -> Result<DeliveryReceipt> {
        let body = SendRequest {
            from: &email.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let response = ureq::post(&self.endpoint)
            .set("Authorization", &format!("Bearer {api_key}"))
            .set("User-Agent", "recall-cli")
            .send_json(&body)
            .map_err(|err| anyhow::anyhow!("mail request failed for {}: {err}", self.endpoint))?;

        let receipt = response
            .into_json::<DeliveryReceipt>()
            .context("failed to decode mail API response")?;

        info!(id = %receipt.id, to = %email.to, "review email accepted by transport");
        Ok(receipt)
    }
}

/// Keeps every message instead of sending it. Can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: RefCell<Vec<OutgoingEmail>>,
    fail_with: Option<String>,
}

impl RecordingDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose every send fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent: RefCell::default(),
            fail_with: Some(message.into()),
        }
    }

    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.borrow().clone()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn send(&self, _api_key: &str, email: &OutgoingEmail) -> Result<DeliveryReceipt> {
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{message}");
        }
        let mut sent = self.sent.borrow_mut();
        sent.push(email.clone());
        Ok(DeliveryReceipt {
            id: format!("recorded-{}", sent.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from: "Review <review@example.com>".to_string(),
            to: "me@example.com".to_string(),
            subject: "복습할 시간: A".to_string(),
            html: "<p>A</p>".to_string(),
        }
    }

    #[test]
    fn request_body_wraps_recipient_in_a_list() {
        let email = email();
        let body = SendRequest {
            from: &email.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["to"], serde_json::json!(["me@example.com"]));
        assert_eq!(value["subject"], "복습할 시간: A");
    }

    #[test]
    fn recording_dispatcher_numbers_receipts() {
        let dispatcher = RecordingDispatcher::new();
        let first = dispatcher.send("key", &email()).expect("send");
        let second = dispatcher.send("key", &email()).expect("send");
        assert_eq!(first.id, "recorded-1");
        assert_eq!(second.id, "recorded-2");
        assert_eq!(dispatcher.sent().len(), 2);
    }

    #[test]
    fn failing_dispatcher_records_nothing() {
        let dispatcher = RecordingDispatcher::failing("quota exceeded");
        let err = dispatcher.send("key", &email()).expect_err("fails");
        assert!(err.to_string().contains("quota exceeded"));
        assert!(dispatcher.sent().is_empty());
    }

    #[test]
    fn default_endpoint_is_resend() {
        assert_eq!(ResendDispatcher::default().endpoint, RESEND_ENDPOINT);
    }
}
