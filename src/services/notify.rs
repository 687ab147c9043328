use serde_json::json;

use crate::entities::{order, ticket};

/// Fire-and-forget event delivery to an optional webhook. Callers
/// invoke this after commit only; delivery failures are logged and
/// never affect the business transaction.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub fn order_event(&self, order: &order::Model, event: &str) {
        self.send(json!({
            "kind": "order",
            "event": event,
            "order_number": order.order_number,
            "user_id": order.user_id,
            "status": order.status,
            "total_price": order.total_price,
        }));
    }

    pub fn ticket_event(&self, ticket: &ticket::Model, event: &str) {
        self.send(json!({
            "kind": "ticket",
            "event": event,
            "ticket_number": ticket.ticket_number,
            "order_id": ticket.order_id,
            "status": ticket.status,
        }));
    }

    fn send(&self, payload: serde_json::Value) {
        let Some(url) = self.webhook_url.clone() else {
            tracing::debug!(%payload, "notification webhook not configured, dropping event");
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(status = %response.status(), "notification endpoint rejected event");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "notification delivery failed");
                }
            }
        });
    }
}
