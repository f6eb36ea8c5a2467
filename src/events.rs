use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartLineUpserted { cart_id: String, product_id: Uuid },
    CartLineRemoved { cart_id: String, line_id: Uuid },
    OrderCreated(Uuid),
    CouponApplied { order_id: Uuid, coupon_id: Uuid },
    PaymentConfirmed(Uuid),
    NotificationCreated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    ///
    /// Event delivery is best-effort; a dropped event never fails the request
    /// that produced it.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!("Dropping domain event: {}", err);
        }
    }
}

/// Consumes events from the channel until all senders are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        info!(?event, "Processing event");
    }
    info!("Event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::OrderCreated(Uuid::new_v4()))
            .await
            .expect("send should succeed");

        assert!(matches!(rx.recv().await, Some(Event::OrderCreated(_))));
    }

    #[tokio::test]
    async fn test_send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out
        sender
            .send_or_log(Event::PaymentConfirmed(Uuid::new_v4()))
            .await;
    }
}
