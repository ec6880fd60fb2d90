use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::entities::{ProductId, VariantId};
use crate::errors::CartError;

/// Events emitted by cart and checkout workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    CartLineAdded {
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i32,
    },
    CartLineRemoved {
        product_id: ProductId,
        variant_id: Option<VariantId>,
    },
    CartQuantityUpdated {
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i32,
    },
    CartCleared,
    OrderPlaced {
        order_id: Uuid,
        total: Decimal,
    },
}

/// Hand-off point for events. Delivery failures never fail the mutation that
/// produced the event; `send_or_log` downgrades them to a warning.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Option<mpsc::Sender<Event>>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A sender that discards every event, for hosts that do not consume
    /// them.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Convenience constructor pairing a sender with its receiver.
    pub fn channel() -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, event: Event) -> Result<(), CartError> {
        match &self.sender {
            Some(sender) => sender
                .send(event)
                .map_err(|e| CartError::EventError(format!("failed to send event: {e}"))),
            None => Ok(()),
        }
    }

    pub fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event) {
            warn!("failed to deliver event: {}", e);
        }
    }
}
