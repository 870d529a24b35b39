//! Shift ledger: one operator's cash-drawer session.
//!
//! The one-open-shift-per-operator invariant is enforced twice: an
//! application-level lookup for a friendly error, and a partial unique index
//! so a concurrent second opener loses with a clean conflict instead of a
//! duplicate row.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::payment::{self, PaymentMethod},
    entities::shift::{self, Entity as ShiftEntity, ShiftStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

pub const OPEN_SHIFT_EXISTS: &str = "OPEN_SHIFT_EXISTS";

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenShiftRequest {
    pub operator_id: Uuid,
    pub opening_cash: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CloseShiftRequest {
    pub closing_cash: Decimal,
    pub notes: Option<String>,
}

/// Service for opening, feeding and closing cash-drawer shifts.
#[derive(Clone)]
pub struct ShiftService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl ShiftService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Opens a new shift for an operator with zeroed counters.
    ///
    /// Fails with `Conflict("OPEN_SHIFT_EXISTS")` when the operator already
    /// has an open drawer, whether caught by the lookup or by the unique
    /// index under a concurrent race.
    #[instrument(skip(self, request), fields(operator_id = %request.operator_id))]
    pub async fn open(&self, request: OpenShiftRequest) -> Result<shift::Model, ServiceError> {
        if request.opening_cash < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Opening cash must not be negative".to_string(),
            ));
        }

        if self.active_shift_for(request.operator_id).await?.is_some() {
            warn!(operator_id = %request.operator_id, "Operator already has an open shift");
            return Err(ServiceError::Conflict(OPEN_SHIFT_EXISTS.to_string()));
        }

        let now = Utc::now();
        let shift_id = Uuid::new_v4();
        let active = shift::ActiveModel {
            id: Set(shift_id),
            operator_id: Set(request.operator_id),
            status: Set(ShiftStatus::Open),
            opened_at: Set(now),
            closed_at: Set(None),
            opening_cash: Set(request.opening_cash),
            closing_cash: Set(None),
            expected_cash: Set(None),
            cash_difference: Set(None),
            total_cash_sales: Set(Decimal::ZERO),
            total_card_sales: Set(Decimal::ZERO),
            total_transfer_sales: Set(Decimal::ZERO),
            total_sales: Set(Decimal::ZERO),
            cash_count: Set(0),
            card_count: Set(0),
            transfer_count: Set(0),
            total_transactions: Set(0),
            check_in_count: Set(0),
            check_out_count: Set(0),
            bookings_created: Set(0),
            opening_notes: Set(request.notes),
            closing_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let model = active.insert(&*self.db).await.map_err(|e| {
            // The partial unique index turns the losing concurrent opener
            // into the same conflict the lookup produces.
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                ServiceError::Conflict(OPEN_SHIFT_EXISTS.to_string())
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        info!(shift_id = %shift_id, operator_id = %request.operator_id, "Shift opened");
        self.emit(Event::ShiftOpened { shift_id }).await;
        Ok(model)
    }

    /// The operator's currently open shift, if any.
    pub async fn active_shift_for(
        &self,
        operator_id: Uuid,
    ) -> Result<Option<shift::Model>, ServiceError> {
        self.active_shift_on(&*self.db, operator_id).await
    }

    /// Transaction-aware variant of [`active_shift_for`], used when a
    /// booking transition attributes activity to the acting operator's
    /// drawer inside its own transaction.
    pub async fn active_shift_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        operator_id: Uuid,
    ) -> Result<Option<shift::Model>, ServiceError> {
        let shift = ShiftEntity::find()
            .filter(shift::Column::OperatorId.eq(operator_id))
            .filter(shift::Column::Status.eq(ShiftStatus::Open))
            .one(conn)
            .await?;
        Ok(shift)
    }

    pub async fn get_shift(&self, shift_id: Uuid) -> Result<shift::Model, ServiceError> {
        ShiftEntity::find_by_id(shift_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shift {} not found", shift_id)))
    }

    /// Attributes an accepted payment to a shift: bumps the matching method
    /// total/count and the transaction counter. Invoked exactly once per
    /// payment, inside the same transaction that persists it.
    pub async fn record_payment<C: ConnectionTrait>(
        &self,
        conn: &C,
        shift_id: Uuid,
        paid: &payment::Model,
    ) -> Result<(), ServiceError> {
        let shift = Self::require_open(conn, shift_id).await?;

        let mut active: shift::ActiveModel = shift.clone().into();
        match paid.method {
            PaymentMethod::Cash => {
                active.total_cash_sales = Set(shift.total_cash_sales + paid.amount);
                active.cash_count = Set(shift.cash_count + 1);
            }
            PaymentMethod::Card => {
                active.total_card_sales = Set(shift.total_card_sales + paid.amount);
                active.card_count = Set(shift.card_count + 1);
            }
            PaymentMethod::Transfer => {
                active.total_transfer_sales = Set(shift.total_transfer_sales + paid.amount);
                active.transfer_count = Set(shift.transfer_count + 1);
            }
        }
        active.total_sales = Set(shift.total_sales + paid.amount);
        active.total_transactions = Set(shift.total_transactions + 1);
        active.updated_at = Set(Some(Utc::now()));
        active.update(conn).await?;
        Ok(())
    }

    pub async fn record_check_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        shift_id: Uuid,
    ) -> Result<(), ServiceError> {
        let shift = Self::require_open(conn, shift_id).await?;
        let mut active: shift::ActiveModel = shift.clone().into();
        active.check_in_count = Set(shift.check_in_count + 1);
        active.updated_at = Set(Some(Utc::now()));
        active.update(conn).await?;
        Ok(())
    }

    pub async fn record_check_out<C: ConnectionTrait>(
        &self,
        conn: &C,
        shift_id: Uuid,
    ) -> Result<(), ServiceError> {
        let shift = Self::require_open(conn, shift_id).await?;
        let mut active: shift::ActiveModel = shift.clone().into();
        active.check_out_count = Set(shift.check_out_count + 1);
        active.updated_at = Set(Some(Utc::now()));
        active.update(conn).await?;
        Ok(())
    }

    pub async fn record_booking_created<C: ConnectionTrait>(
        &self,
        conn: &C,
        shift_id: Uuid,
    ) -> Result<(), ServiceError> {
        let shift = Self::require_open(conn, shift_id).await?;
        let mut active: shift::ActiveModel = shift.clone().into();
        active.bookings_created = Set(shift.bookings_created + 1);
        active.updated_at = Set(Some(Utc::now()));
        active.update(conn).await?;
        Ok(())
    }

    /// Closes a shift and settles the drawer: `expected_cash = opening_cash
    /// + total_cash_sales`, `cash_difference = closing_cash - expected_cash`.
    #[instrument(skip(self, request), fields(shift_id = %shift_id))]
    pub async fn close(
        &self,
        shift_id: Uuid,
        request: CloseShiftRequest,
    ) -> Result<shift::Model, ServiceError> {
        let shift = self.get_shift(shift_id).await?;
        if shift.status == ShiftStatus::Closed {
            return Err(ServiceError::invalid_transition(ShiftStatus::Closed, "close"));
        }

        let model = self
            .close_with_notes(&*self.db, shift, request.closing_cash, request.notes, Utc::now())
            .await?;

        info!(
            shift_id = %shift_id,
            expected_cash = %model.expected_cash.unwrap_or_default(),
            cash_difference = %model.cash_difference.unwrap_or_default(),
            "Shift closed"
        );
        self.emit(Event::ShiftClosed { shift_id }).await;
        Ok(model)
    }

    /// Repair routine for historical duplicate-open-shift data: keeps the
    /// operator's most-recently-opened shift and force-closes the rest with
    /// an explanatory note. Not part of normal flow; the unique index keeps
    /// new duplicates from arising.
    #[instrument(skip(self), fields(operator_id = %operator_id))]
    pub async fn reconcile_duplicates(
        &self,
        operator_id: Uuid,
    ) -> Result<Vec<shift::Model>, ServiceError> {
        let open_shifts = ShiftEntity::find()
            .filter(shift::Column::OperatorId.eq(operator_id))
            .filter(shift::Column::Status.eq(ShiftStatus::Open))
            .order_by_desc(shift::Column::OpenedAt)
            .all(&*self.db)
            .await?;

        let mut closed = Vec::new();
        for stale in open_shifts.into_iter().skip(1) {
            // Settle at the expected amount; the note records why.
            let closing_cash = stale.opening_cash + stale.total_cash_sales;
            let model = self
                .close_with_notes(
                    &*self.db,
                    stale,
                    closing_cash,
                    Some("Force-closed: duplicate open shift kept only the most recent".to_string()),
                    Utc::now(),
                )
                .await?;
            warn!(shift_id = %model.id, "Force-closed duplicate open shift");
            closed.push(model);
        }
        Ok(closed)
    }

    async fn close_with_notes<C: ConnectionTrait>(
        &self,
        conn: &C,
        shift: shift::Model,
        closing_cash: Decimal,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<shift::Model, ServiceError> {
        let expected = shift.opening_cash + shift.total_cash_sales;
        let mut active: shift::ActiveModel = shift.into();
        active.status = Set(ShiftStatus::Closed);
        active.closed_at = Set(Some(now));
        active.closing_cash = Set(Some(closing_cash));
        active.expected_cash = Set(Some(expected));
        active.cash_difference = Set(Some(closing_cash - expected));
        active.closing_notes = Set(notes);
        active.updated_at = Set(Some(now));
        Ok(active.update(conn).await?)
    }

    async fn require_open<C: ConnectionTrait>(
        conn: &C,
        shift_id: Uuid,
    ) -> Result<shift::Model, ServiceError> {
        let shift = ShiftEntity::find_by_id(shift_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Shift {} not found", shift_id)))?;
        if shift.status != ShiftStatus::Open {
            return Err(ServiceError::Conflict(format!(
                "Shift {} is not open",
                shift_id
            )));
        }
        Ok(shift)
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send shift event");
            }
        }
    }
}
