#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use tokio::sync::mpsc;
use uuid::Uuid;

use hotelier_api::{
    db::{self, DbConfig},
    entities::payment::{PaymentMethod, PaymentStatus, PaymentType},
    entities::room_item,
    events::{self, EventSender},
    services::{
        bookings::{
            BookingService, CreateBookingRequest, ReadinessUpdate, RecordPaymentRequest,
            TransitionOutcome,
        },
        inventory::InventoryUsageService,
        shifts::ShiftService,
    },
};

/// Test harness backed by a fresh in-memory SQLite database per instance.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub bookings: BookingService,
    pub shifts: ShiftService,
    pub inventory: InventoryUsageService,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations failed");

        let db = Arc::new(pool);
        let (tx, rx) = mpsc::channel(64);
        let event_sender = Arc::new(EventSender::new(tx));
        let event_task = tokio::spawn(events::process_events(rx));

        let shifts = ShiftService::new(db.clone(), Some(event_sender.clone()));
        let inventory = InventoryUsageService::new(db.clone());
        let bookings = BookingService::new(
            db.clone(),
            shifts.clone(),
            inventory.clone(),
            Some(event_sender),
        );

        Self {
            db,
            bookings,
            shifts,
            inventory,
            _event_task: event_task,
        }
    }

    /// A two-night reservation starting today.
    pub fn booking_request(&self, room_id: Uuid, room_amount: Decimal) -> CreateBookingRequest {
        let today = today();
        CreateBookingRequest {
            room_id,
            guest_id: Uuid::new_v4(),
            check_in_date: today,
            check_out_date: today + Duration::days(2),
            guest_count: 2,
            room_amount,
            created_by: Uuid::new_v4(),
        }
    }

    pub async fn seed_room_item(
        &self,
        room_id: Uuid,
        item_type: &str,
        quantity: i32,
    ) -> room_item::Model {
        room_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(room_id),
            item_type: Set(item_type.to_string()),
            quantity: Set(quantity),
        }
        .insert(&*self.db)
        .await
        .expect("failed to seed room item")
    }

    /// Flips every readiness gate on.
    pub async fn make_ready(&self, booking_id: Uuid) {
        self.bookings
            .update_readiness(
                booking_id,
                ReadinessUpdate {
                    room_clean: Some(true),
                    inventory_verified: Some(true),
                    inventory_delivered: Some(true),
                    delivered_by: Some(Uuid::new_v4()),
                    passengers_completed: Some(true),
                },
            )
            .await
            .expect("failed to update readiness");
    }

    pub async fn pay(
        &self,
        booking_id: Uuid,
        amount: Decimal,
        method: PaymentMethod,
        status: PaymentStatus,
        processed_by: Uuid,
    ) -> TransitionOutcome {
        self.bookings
            .record_payment(
                booking_id,
                RecordPaymentRequest {
                    amount,
                    method,
                    status,
                    payment_type: PaymentType::Partial,
                    processed_by,
                },
            )
            .await
            .expect("failed to record payment")
    }

    /// Records a completed cash payment.
    pub async fn pay_cash(&self, booking_id: Uuid, amount: Decimal) -> TransitionOutcome {
        self.pay(
            booking_id,
            amount,
            PaymentMethod::Cash,
            PaymentStatus::Completed,
            Uuid::new_v4(),
        )
        .await
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
