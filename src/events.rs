use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted by the services. Consumers are decoupled from the
/// request path; a lost event never fails the operation that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderCancelled(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    InventoryReserved {
        shoe_model_id: Uuid,
        size: String,
        quantity: i32,
    },
    InventoryReleased {
        shoe_model_id: Uuid,
        size: String,
        quantity: i32,
    },
    InventoryCommitted {
        shoe_model_id: Uuid,
        size: String,
        quantity: i32,
    },
    InventoryRestored {
        shoe_model_id: Uuid,
        size: String,
        quantity: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates the event channel used to wire services to a consumer task.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Stands in for real
/// downstream consumers (notifications, analytics) in this deployment.
pub fn spawn_logging_consumer(mut receiver: mpsc::Receiver<Event>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            info!(event = ?event, "domain event");
        }
    })
}
