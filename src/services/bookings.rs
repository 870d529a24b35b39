//! Booking lifecycle orchestration.
//!
//! Every transition runs inside one database transaction and re-reads the
//! row it mutates; the write only applies when the status and version still
//! match what was read, so two concurrent attempts at the same transition
//! cannot both succeed. This service is also the single point translating
//! inventory/shift/storage failures into the error taxonomy.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dates,
    entities::booking::{self, BookingStatus, Entity as BookingEntity},
    entities::credit_note,
    entities::extra_charge::{self, Entity as ExtraChargeEntity},
    entities::inventory_usage::UsageStatus,
    entities::payment::{self, Entity as PaymentEntity, PaymentMethod, PaymentStatus, PaymentType},
    entities::room_item::{self, Entity as RoomItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::InventoryUsageService,
    services::lifecycle::{self, PendingStep},
    services::reconciliation::{self, BookingFinancials},
    services::shifts::ShiftService,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub room_id: Uuid,
    pub guest_id: Uuid,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[validate(range(min = 1, message = "Guest count must be at least 1"))]
    pub guest_count: i32,
    pub room_amount: Decimal,
    /// Operator creating the reservation; their open shift (if any) gets the
    /// bookings-created counter.
    pub created_by: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Final status reported by the payment collaborator; the engine never
    /// initiates a charge itself.
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    pub processed_by: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddExtraChargeRequest {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub amount: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

/// Readiness flag updates reported by collaborators (housekeeping, inventory
/// delivery, passenger registration).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReadinessUpdate {
    pub room_clean: Option<bool>,
    pub inventory_verified: Option<bool>,
    pub inventory_delivered: Option<bool>,
    pub delivered_by: Option<Uuid>,
    pub passengers_completed: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub operator_id: Uuid,
    /// Count supplied by the passenger-registration collaborator.
    pub registered_passengers: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckOutRequest {
    pub operator_id: Uuid,
    /// Early/forced check-out: when set, the stay is recomputed against
    /// this date instead of the scheduled one.
    pub override_date: Option<NaiveDate>,
    /// Discount applied to payable before reconciliation runs.
    pub discount: Option<Decimal>,
    pub discount_reason: Option<String>,
    /// Per-usage terminal dispositions; anything unlisted returns clean.
    #[serde(default)]
    pub dispositions: HashMap<Uuid, UsageStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: String,
    pub cancelled_by: Uuid,
    pub notes: Option<String>,
}

/// Structured result of a state-transition operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub success: bool,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending_steps: Vec<PendingStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financials: Option<BookingFinancials>,
    /// Amount credited back when a cancellation found collected funds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_issued: Option<Decimal>,
}

/// A booking surfaced by the check-out view, labeled so staff can tell an
/// in-house guest from a no-show holding the room past its window.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckOutAttention {
    pub booking: booking::Model,
    pub overdue: bool,
}

/// How [`BookingService::repair_legacy_statuses`] reclassifies completed
/// rows that never recorded an actual check-out and are not fully paid.
/// Fully-paid rows always get the missing instant backfilled; the unpaid
/// case is business judgment and stays in the operator's hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyRepairPolicy {
    RevertUnpaidToConfirmed,
    RevertUnpaidToPaid,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RepairReport {
    pub credits_issued: u32,
    pub checkouts_backfilled: u32,
    pub statuses_reverted: u32,
}

/// Service for the booking lifecycle state machine.
#[derive(Clone)]
pub struct BookingService {
    db: Arc<DatabaseConnection>,
    shifts: ShiftService,
    inventory: InventoryUsageService,
    event_sender: Option<Arc<EventSender>>,
}

impl BookingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        shifts: ShiftService,
        inventory: InventoryUsageService,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db,
            shifts,
            inventory,
            event_sender,
        }
    }

    /// Creates a reservation in status `pending`.
    #[instrument(skip(self, request), fields(room_id = %request.room_id, guest_id = %request.guest_id))]
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<booking::Model, ServiceError> {
        request.validate()?;
        if request.room_amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Room amount must be positive".to_string(),
            ));
        }
        let nights = dates::nights_between(request.check_in_date, request.check_out_date)
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "Check-out date must be after check-in date".to_string(),
                )
            })?;

        let now = Utc::now();
        let booking_id = Uuid::new_v4();
        let txn = self.db.begin().await?;

        let active = booking::ActiveModel {
            id: Set(booking_id),
            room_id: Set(request.room_id),
            guest_id: Set(request.guest_id),
            check_in_date: Set(request.check_in_date),
            check_out_date: Set(request.check_out_date),
            nights: Set(nights),
            guest_count: Set(request.guest_count),
            room_amount: Set(request.room_amount),
            status: Set(BookingStatus::Pending),
            room_clean: Set(false),
            inventory_verified: Set(false),
            inventory_verified_at: Set(None),
            inventory_delivered: Set(false),
            inventory_delivered_at: Set(None),
            inventory_delivered_by: Set(None),
            passengers_completed: Set(false),
            passengers_completed_at: Set(None),
            actual_check_in: Set(None),
            actual_check_out: Set(None),
            cancelled_reason: Set(None),
            cancelled_by: Set(None),
            cancelled_at: Set(None),
            cancellation_notes: Set(None),
            is_archived: Set(false),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        };
        let model = active.insert(&txn).await?;

        if let Some(shift) = self
            .shifts
            .active_shift_on(&txn, request.created_by)
            .await?
        {
            self.shifts.record_booking_created(&txn, shift.id).await?;
        }

        txn.commit().await?;
        info!(booking_id = %booking_id, nights = nights, "Booking created");
        self.emit(Event::BookingCreated(booking_id)).await;
        Ok(model)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<booking::Model, ServiceError> {
        BookingEntity::find_by_id(booking_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))
    }

    /// Current financial snapshot, always recomputed from the payment and
    /// extra-charge rows; never cached.
    pub async fn financials(&self, booking_id: Uuid) -> Result<BookingFinancials, ServiceError> {
        let booking = self.get_booking(booking_id).await?;
        self.load_financials(&*self.db, &booking, Decimal::ZERO)
            .await
    }

    /// Records a payment reported by the payment collaborator and advances
    /// the booking as far as the new balance allows: `pending -> confirmed`
    /// on the first counted payment, `confirmed -> paid` once settled.
    /// Failed or pending payments persist but change nothing.
    #[instrument(skip(self, request), fields(booking_id = %booking_id, amount = %request.amount))]
    pub async fn record_payment(
        &self,
        booking_id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<TransitionOutcome, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let booking = Self::require_booking(&txn, booking_id).await?;
        if booking.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Booking {} is {}; payments are no longer accepted",
                booking_id, booking.status
            )));
        }

        let shift = self
            .shifts
            .active_shift_on(&txn, request.processed_by)
            .await?;
        let shift_id = shift.as_ref().map(|s| s.id);

        let now = Utc::now();
        let payment_id = Uuid::new_v4();
        let paid = payment::ActiveModel {
            id: Set(payment_id),
            booking_id: Set(booking_id),
            amount: Set(request.amount),
            method: Set(request.method),
            status: Set(request.status),
            payment_type: Set(request.payment_type),
            processed_by: Set(request.processed_by),
            shift_id: Set(shift_id),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        if paid.status.is_counted() {
            if let Some(shift_id) = shift_id {
                self.shifts.record_payment(&txn, shift_id, &paid).await?;
            }
        }

        let financials = self
            .load_financials(&txn, &booking, Decimal::ZERO)
            .await?;

        let mut booking = booking;
        let mut confirmed = false;
        let mut settled = false;
        if booking.status == BookingStatus::Pending && financials.paid > Decimal::ZERO {
            booking = self
                .apply_transition(&txn, booking, BookingStatus::Confirmed, |_| {})
                .await?;
            confirmed = true;
        }
        if booking.status == BookingStatus::Confirmed && financials.is_fully_paid {
            booking = self
                .apply_transition(&txn, booking, BookingStatus::Paid, |_| {})
                .await?;
            settled = true;
        }

        txn.commit().await?;
        info!(
            booking_id = %booking_id,
            payment_id = %payment_id,
            status = %paid.status,
            new_booking_status = %booking.status,
            "Payment recorded"
        );
        self.emit(Event::PaymentRecorded {
            booking_id,
            payment_id,
            amount: paid.amount,
        })
        .await;
        if confirmed {
            self.emit(Event::BookingConfirmed(booking_id)).await;
        }
        if settled {
            self.emit(Event::BookingPaid(booking_id)).await;
        }

        Ok(TransitionOutcome {
            success: true,
            status: booking.status,
            pending_steps: vec![],
            financials: Some(financials),
            credit_issued: None,
        })
    }

    /// Adds a consumption/service charge. A settled booking whose new
    /// payable exceeds what was paid drops back to `confirmed`.
    #[instrument(skip(self, request), fields(booking_id = %booking_id))]
    pub async fn add_extra_charge(
        &self,
        booking_id: Uuid,
        request: AddExtraChargeRequest,
    ) -> Result<TransitionOutcome, ServiceError> {
        request.validate()?;
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Charge amount must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let booking = Self::require_booking(&txn, booking_id).await?;
        if booking.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Booking {} is {}; charges are no longer accepted",
                booking_id, booking.status
            )));
        }

        let now = Utc::now();
        extra_charge::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            description: Set(request.description),
            amount: Set(request.amount),
            quantity: Set(request.quantity),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        let financials = self
            .load_financials(&txn, &booking, Decimal::ZERO)
            .await?;

        let mut booking = booking;
        if booking.status == BookingStatus::Paid && !financials.is_fully_paid {
            booking = self
                .apply_transition(&txn, booking, BookingStatus::Confirmed, |_| {})
                .await?;
        }

        txn.commit().await?;
        Ok(TransitionOutcome {
            success: true,
            status: booking.status,
            pending_steps: vec![],
            financials: Some(financials),
            credit_issued: None,
        })
    }

    /// Applies readiness flags reported by collaborators, stamping the
    /// corresponding timestamps the first time each flag turns true.
    #[instrument(skip(self, update), fields(booking_id = %booking_id))]
    pub async fn update_readiness(
        &self,
        booking_id: Uuid,
        update: ReadinessUpdate,
    ) -> Result<booking::Model, ServiceError> {
        let booking = self.get_booking(booking_id).await?;
        if booking.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Booking {} is {}; readiness no longer applies",
                booking_id, booking.status
            )));
        }

        let now = Utc::now();
        let mut active: booking::ActiveModel = booking.clone().into();
        if let Some(clean) = update.room_clean {
            active.room_clean = Set(clean);
        }
        if let Some(verified) = update.inventory_verified {
            active.inventory_verified = Set(verified);
            if verified && booking.inventory_verified_at.is_none() {
                active.inventory_verified_at = Set(Some(now));
            }
        }
        if let Some(delivered) = update.inventory_delivered {
            active.inventory_delivered = Set(delivered);
            if delivered && booking.inventory_delivered_at.is_none() {
                active.inventory_delivered_at = Set(Some(now));
                active.inventory_delivered_by = Set(update.delivered_by);
            }
        }
        if let Some(completed) = update.passengers_completed {
            active.passengers_completed = Set(completed);
            if completed && booking.passengers_completed_at.is_none() {
                active.passengers_completed_at = Set(Some(now));
            }
        }
        active.updated_at = Set(Some(now));
        Ok(active.update(&*self.db).await?)
    }

    /// Checks the guest in.
    ///
    /// Requires status `paid` and every readiness gate; any unmet gate
    /// surfaces as `PreconditionsNotMet` carrying the exact remaining steps.
    /// On success: stamps `actual_check_in`, materializes inventory usages
    /// from the room's configured items, and bumps the acting operator's
    /// open-shift check-in counter.
    #[instrument(skip(self, request), fields(booking_id = %booking_id, operator_id = %request.operator_id))]
    pub async fn check_in(
        &self,
        booking_id: Uuid,
        request: CheckInRequest,
    ) -> Result<TransitionOutcome, ServiceError> {
        let txn = self.db.begin().await?;
        let booking = Self::require_booking(&txn, booking_id).await?;
        if !lifecycle::can_transition(booking.status, BookingStatus::CheckedIn) {
            return Err(ServiceError::invalid_transition(
                booking.status,
                BookingStatus::CheckedIn,
            ));
        }

        let financials = self
            .load_financials(&txn, &booking, Decimal::ZERO)
            .await?;
        let steps =
            lifecycle::check_in_pending_steps(&booking, request.registered_passengers, &financials);
        if !steps.is_empty() {
            warn!(booking_id = %booking_id, steps = ?steps, "Check-in blocked by unmet gates");
            return Err(ServiceError::PreconditionsNotMet(steps));
        }

        let now = Utc::now();
        let room_id = booking.room_id;
        let passengers_stamp = booking.passengers_completed_at;
        let booking = self
            .apply_transition(&txn, booking, BookingStatus::CheckedIn, |active| {
                active.actual_check_in = Set(Some(now));
                active.passengers_completed = Set(true);
                if passengers_stamp.is_none() {
                    active.passengers_completed_at = Set(Some(now));
                }
            })
            .await?;

        // One usage row per configured room item
        let items = RoomItemEntity::find()
            .filter(room_item::Column::RoomId.eq(room_id))
            .all(&txn)
            .await?;
        for item in items {
            self.inventory
                .assign_on(&txn, booking_id, item.id, item.quantity)
                .await?;
        }

        if let Some(shift) = self
            .shifts
            .active_shift_on(&txn, request.operator_id)
            .await?
        {
            self.shifts.record_check_in(&txn, shift.id).await?;
        }

        txn.commit().await?;
        info!(booking_id = %booking_id, "Guest checked in");
        self.emit(Event::BookingCheckedIn {
            booking_id,
            room_id,
        })
        .await;
        self.emit(Event::RoomOccupied(room_id)).await;

        Ok(TransitionOutcome {
            success: true,
            status: booking.status,
            pending_steps: vec![],
            financials: Some(financials),
            credit_issued: None,
        })
    }

    /// Checks the guest out and completes the booking.
    ///
    /// Supports an override date earlier than the scheduled check-out (the
    /// stay is recomputed against it) and a discount applied to payable
    /// before reconciliation. Requires a settled balance after extras and
    /// discount; closes out inventory usages and hands the dirty batch to
    /// the laundry pipeline.
    #[instrument(skip(self, request), fields(booking_id = %booking_id, operator_id = %request.operator_id))]
    pub async fn check_out(
        &self,
        booking_id: Uuid,
        request: CheckOutRequest,
    ) -> Result<TransitionOutcome, ServiceError> {
        let discount = request.discount.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Discount must not be negative".to_string(),
            ));
        }
        if discount > Decimal::ZERO
            && request
                .discount_reason
                .as_deref()
                .map_or(true, |r| r.trim().is_empty())
        {
            return Err(ServiceError::ValidationError(
                "A discount requires a reason".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let booking = Self::require_booking(&txn, booking_id).await?;
        if !lifecycle::can_transition(booking.status, BookingStatus::Completed) {
            return Err(ServiceError::invalid_transition(
                booking.status,
                BookingStatus::Completed,
            ));
        }

        // Early/forced check-out recomputes the stay against the override.
        let (check_out_date, nights) = match request.override_date {
            Some(date) => {
                let nights = dates::nights_between(booking.check_in_date, date).ok_or_else(|| {
                    ServiceError::ValidationError(
                        "Override check-out date must be after check-in date".to_string(),
                    )
                })?;
                (date, nights)
            }
            None => (booking.check_out_date, booking.nights),
        };

        let financials = self.load_financials(&txn, &booking, discount).await?;
        if !financials.is_fully_paid {
            warn!(
                booking_id = %booking_id,
                pending = %financials.pending,
                "Check-out blocked by pending balance"
            );
            return Err(ServiceError::PreconditionsNotMet(vec![
                PendingStep::SettleBalance,
            ]));
        }

        let now = Utc::now();
        let room_id = booking.room_id;
        let booking = self
            .apply_transition(&txn, booking, BookingStatus::Completed, |active| {
                active.actual_check_out = Set(Some(now));
                active.check_out_date = Set(check_out_date);
                active.nights = Set(nights);
            })
            .await?;

        let dirty = self
            .inventory
            .close_out_for_booking(&txn, booking_id, &request.dispositions)
            .await?;

        if let Some(shift) = self
            .shifts
            .active_shift_on(&txn, request.operator_id)
            .await?
        {
            self.shifts.record_check_out(&txn, shift.id).await?;
        }

        txn.commit().await?;
        info!(booking_id = %booking_id, nights = nights, "Guest checked out");
        self.emit(Event::BookingCheckedOut {
            booking_id,
            room_id,
        })
        .await;
        self.emit(Event::RoomReleased(room_id)).await;
        if !dirty.is_empty() {
            self.emit(Event::DirtyItemsQueued {
                booking_id,
                room_id,
                items: dirty,
            })
            .await;
        }

        Ok(TransitionOutcome {
            success: true,
            status: booking.status,
            pending_steps: vec![],
            financials: Some(financials),
            credit_issued: None,
        })
    }

    /// Cancels a booking from any non-terminal state.
    ///
    /// When money was already collected, a credit note for the full paid
    /// amount is written in the same transaction; a paid cancellation is
    /// never silently identical to a free one.
    #[instrument(skip(self, request), fields(booking_id = %booking_id))]
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        request: CancelBookingRequest,
    ) -> Result<TransitionOutcome, ServiceError> {
        if request.reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Cancellation reason is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let booking = Self::require_booking(&txn, booking_id).await?;
        if !lifecycle::can_transition(booking.status, BookingStatus::Cancelled) {
            return Err(ServiceError::invalid_transition(
                booking.status,
                BookingStatus::Cancelled,
            ));
        }

        let financials = self
            .load_financials(&txn, &booking, Decimal::ZERO)
            .await?;
        let credit = if financials.paid > Decimal::ZERO {
            credit_note::ActiveModel {
                id: Set(Uuid::new_v4()),
                booking_id: Set(booking_id),
                amount: Set(financials.paid),
                reason: Set(format!("Cancellation: {}", request.reason)),
                issued_by: Set(Some(request.cancelled_by)),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;
            Some(financials.paid)
        } else {
            None
        };

        let now = Utc::now();
        let room_id = booking.room_id;
        let booking = self
            .apply_transition(&txn, booking, BookingStatus::Cancelled, |active| {
                active.cancelled_reason = Set(Some(request.reason.clone()));
                active.cancelled_by = Set(Some(request.cancelled_by));
                active.cancelled_at = Set(Some(now));
                active.cancellation_notes = Set(request.notes.clone());
            })
            .await?;

        txn.commit().await?;
        info!(
            booking_id = %booking_id,
            credit = ?credit,
            "Booking cancelled"
        );
        self.emit(Event::BookingCancelled {
            booking_id,
            credit_issued: credit,
        })
        .await;
        self.emit(Event::RoomReleased(room_id)).await;

        Ok(TransitionOutcome {
            success: true,
            status: booking.status,
            pending_steps: vec![],
            financials: Some(financials),
            credit_issued: credit,
        })
    }

    /// Bookings expected at the front desk on `today`.
    pub async fn list_awaiting_check_in(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<booking::Model>, ServiceError> {
        let candidates = BookingEntity::find()
            .filter(booking::Column::Status.is_in([
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Paid,
            ]))
            .filter(booking::Column::IsArchived.eq(false))
            .order_by_asc(booking::Column::CheckInDate)
            .all(&*self.db)
            .await?;
        Ok(candidates
            .into_iter()
            .filter(|b| lifecycle::is_awaiting_check_in(b, today))
            .collect())
    }

    /// Bookings requiring check-out attention: in-house guests plus overdue
    /// no-shows still holding their room. Both block room reuse, so both
    /// ride the same query path, labeled.
    pub async fn list_awaiting_check_out(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<CheckOutAttention>, ServiceError> {
        let candidates = BookingEntity::find()
            .filter(booking::Column::Status.is_in([
                BookingStatus::Confirmed,
                BookingStatus::Paid,
                BookingStatus::CheckedIn,
            ]))
            .filter(booking::Column::IsArchived.eq(false))
            .order_by_asc(booking::Column::CheckOutDate)
            .all(&*self.db)
            .await?;
        Ok(candidates
            .into_iter()
            .filter(|b| lifecycle::is_awaiting_check_out(b, today))
            .map(|b| {
                let overdue = lifecycle::is_overdue(&b, today);
                CheckOutAttention {
                    booking: b,
                    overdue,
                }
            })
            .collect())
    }

    /// One-time repair for rows written before every transition was guarded.
    ///
    /// Cancelled bookings holding collected funds get their missing credit
    /// notes; completed bookings with no recorded check-out are backfilled
    /// (fully paid) or reverted per `policy` (unpaid). Deliberately bypasses
    /// the transition guards: these rows are already in states the guarded
    /// engine can no longer produce.
    #[instrument(skip(self))]
    pub async fn repair_legacy_statuses(
        &self,
        policy: LegacyRepairPolicy,
        local_offset_minutes: i32,
    ) -> Result<RepairReport, ServiceError> {
        let mut report = RepairReport::default();
        let txn = self.db.begin().await?;

        let cancelled = BookingEntity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Cancelled))
            .all(&txn)
            .await?;
        for booking in cancelled {
            let financials = self
                .load_financials(&txn, &booking, Decimal::ZERO)
                .await?;
            if financials.paid <= Decimal::ZERO {
                continue;
            }
            let existing = credit_note::Entity::find()
                .filter(credit_note::Column::BookingId.eq(booking.id))
                .one(&txn)
                .await?;
            if existing.is_some() {
                continue;
            }
            credit_note::ActiveModel {
                id: Set(Uuid::new_v4()),
                booking_id: Set(booking.id),
                amount: Set(financials.paid),
                reason: Set("Legacy repair: cancelled with funds collected".to_string()),
                issued_by: Set(None),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;
            report.credits_issued += 1;
        }

        let dangling = BookingEntity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Completed))
            .filter(booking::Column::ActualCheckOut.is_null())
            .all(&txn)
            .await?;
        for booking in dangling {
            let financials = self
                .load_financials(&txn, &booking, Decimal::ZERO)
                .await?;
            let mut active: booking::ActiveModel = booking.clone().into();
            if financials.is_fully_paid {
                active.actual_check_out = Set(Some(dates::start_of_local_day(
                    booking.check_out_date,
                    local_offset_minutes,
                )));
                report.checkouts_backfilled += 1;
            } else {
                let target = match policy {
                    LegacyRepairPolicy::RevertUnpaidToConfirmed => BookingStatus::Confirmed,
                    LegacyRepairPolicy::RevertUnpaidToPaid => BookingStatus::Paid,
                };
                active.status = Set(target);
                report.statuses_reverted += 1;
            }
            active.version = Set(booking.version + 1);
            active.updated_at = Set(Some(Utc::now()));
            active.update(&txn).await?;
        }

        txn.commit().await?;
        info!(?report, "Legacy status repair finished");
        Ok(report)
    }

    /// Applies a guarded status transition with the optimistic re-check:
    /// the UPDATE is filtered on the status and version read inside this
    /// transaction, so a concurrent writer that got there first makes this
    /// one fail with `InvalidStateTransition` instead of double-applying.
    async fn apply_transition<C: ConnectionTrait>(
        &self,
        conn: &C,
        booking: booking::Model,
        to: BookingStatus,
        mutate: impl FnOnce(&mut booking::ActiveModel),
    ) -> Result<booking::Model, ServiceError> {
        let from = booking.status;
        if !lifecycle::can_transition(from, to) {
            return Err(ServiceError::invalid_transition(from, to));
        }

        let id = booking.id;
        let version = booking.version;
        let mut active: booking::ActiveModel = booking.into();
        active.status = Set(to);
        active.version = Set(version + 1);
        active.updated_at = Set(Some(Utc::now()));
        mutate(&mut active);

        let result = BookingEntity::update_many()
            .set(active)
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(from))
            .filter(booking::Column::Version.eq(version))
            .exec(conn)
            .await?;
        if result.rows_affected != 1 {
            warn!(booking_id = %id, from = %from, to = %to, "Lost optimistic transition race");
            return Err(ServiceError::invalid_transition(from, to));
        }

        Self::require_booking(conn, id).await
    }

    async fn load_financials<C: ConnectionTrait>(
        &self,
        conn: &C,
        booking: &booking::Model,
        discount: Decimal,
    ) -> Result<BookingFinancials, ServiceError> {
        let payments = PaymentEntity::find()
            .filter(payment::Column::BookingId.eq(booking.id))
            .all(conn)
            .await?;
        let charges = ExtraChargeEntity::find()
            .filter(extra_charge::Column::BookingId.eq(booking.id))
            .all(conn)
            .await?;
        Ok(reconciliation::reconcile(
            booking.room_amount,
            discount,
            &payments,
            &charges,
        ))
    }

    async fn require_booking<C: ConnectionTrait>(
        conn: &C,
        booking_id: Uuid,
    ) -> Result<booking::Model, ServiceError> {
        BookingEntity::find_by_id(booking_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booking {} not found", booking_id)))
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send booking event");
            }
        }
    }
}
