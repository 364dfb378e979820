//! In-process domain events emitted after each committed operation.
//!
//! Listeners (notification fan-out, read-cache invalidation) subscribe to
//! the bus; emission is fire-and-forget and can never roll back the
//! transaction that produced the event.

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::DocumentKind;

/// Signals emitted by the lifecycle factory.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    Created {
        kind: DocumentKind,
        document_id: Uuid,
        numero: String,
    },
    Modified {
        kind: DocumentKind,
        document_id: Uuid,
    },
    Converted {
        work_order_id: Uuid,
        invoice_id: Uuid,
    },
    PaymentRecorded {
        kind: DocumentKind,
        document_id: Uuid,
        amount: Decimal,
    },
}

/// Broadcast bus for domain events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DocumentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.sender.subscribe()
    }

    /// Emit an event. A send error only means nobody is listening.
    pub fn emit(&self, event: DocumentEvent) {
        if self.sender.send(event).is_err() {
            debug!("no event subscribers registered");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let id = Uuid::new_v4();
        bus.emit(DocumentEvent::Created {
            kind: DocumentKind::Invoice,
            document_id: id,
            numero: "FAC-2026-0001".to_string(),
        });

        match rx.recv().await.unwrap() {
            DocumentEvent::Created {
                document_id,
                numero,
                ..
            } => {
                assert_eq!(document_id, id);
                assert_eq!(numero, "FAC-2026-0001");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn emitting_without_subscribers_does_not_fail() {
        let bus = EventBus::default();
        bus.emit(DocumentEvent::Modified {
            kind: DocumentKind::WorkOrder,
            document_id: Uuid::new_v4(),
        });
    }
}
