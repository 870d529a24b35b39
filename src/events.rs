//! Domain events emitted after committed state transitions.
//!
//! External collaborators (room availability, the laundry pipeline,
//! notifications) consume these; delivery is best-effort and never fails the
//! transition that produced the event.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

use crate::services::inventory::DirtyItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Booking lifecycle
    BookingCreated(Uuid),
    BookingConfirmed(Uuid),
    BookingPaid(Uuid),
    BookingCheckedIn {
        booking_id: Uuid,
        room_id: Uuid,
    },
    BookingCheckedOut {
        booking_id: Uuid,
        room_id: Uuid,
    },
    BookingCancelled {
        booking_id: Uuid,
        credit_issued: Option<Decimal>,
    },

    // Payments
    PaymentRecorded {
        booking_id: Uuid,
        payment_id: Uuid,
        amount: Decimal,
    },

    // Room availability collaborator
    RoomOccupied(Uuid),
    RoomReleased(Uuid),

    // Laundry collaborator: dirty items keyed by room and booking
    DirtyItemsQueued {
        booking_id: Uuid,
        room_id: Uuid,
        items: Vec<DirtyItem>,
    },

    // Shift ledger
    ShiftOpened {
        shift_id: Uuid,
    },
    ShiftClosed {
        shift_id: Uuid,
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

    /// Sends an event; the caller decides whether a failure is worth more
    /// than a warning (it never is for committed transitions).
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background loop draining the event channel. Collaborator integrations
/// hang off this; the default handler logs each event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::DirtyItemsQueued {
                booking_id,
                room_id,
                items,
            } => {
                info!(
                    booking_id = %booking_id,
                    room_id = %room_id,
                    item_count = items.len(),
                    "Queued dirty items for laundry"
                );
            }
            Event::BookingCancelled {
                booking_id,
                credit_issued: Some(amount),
            } => {
                // Paid cancellations are anomalies worth surfacing loudly.
                error!(
                    booking_id = %booking_id,
                    credit = %amount,
                    "Booking cancelled with funds collected; credit note issued"
                );
            }
            other => {
                info!(event = ?other, "Domain event");
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
