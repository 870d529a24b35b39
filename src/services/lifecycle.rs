//! The booking state machine: transition table, readiness gates and list
//! predicates.
//!
//! Everything here is pure. Transition guards and the list/filter views are
//! driven by the same predicates so they cannot diverge, and every date
//! comparison takes the hotel-local `today` as an explicit parameter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::services::reconciliation::BookingFinancials;

/// A concrete step staff must complete before check-in can proceed.
///
/// Carried inside `ServiceError::PreconditionsNotMet` so a failed check-in
/// reports exactly what remains, never a bare "cannot proceed".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum PendingStep {
    #[strum(serialize = "clean the room")]
    CleanRoom,
    #[strum(serialize = "verify room inventory")]
    VerifyInventory,
    #[strum(serialize = "deliver room inventory")]
    DeliverInventory,
    #[strum(serialize = "register passengers")]
    RegisterPassengers,
    #[strum(serialize = "settle pending balance")]
    SettleBalance,
}

/// Whether `to` is reachable from `from` in one guarded step.
///
/// `pending -> confirmed -> paid -> checked_in -> completed`, with
/// `cancelled` reachable from any non-terminal state and `paid -> confirmed`
/// for the balance reopening when extra charges land on a settled booking.
pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    match (from, to) {
        (Pending, Confirmed) => true,
        (Confirmed, Paid) => true,
        (Paid, CheckedIn) => true,
        (Paid, Confirmed) => true,
        (CheckedIn, Completed) => true,
        (from, Cancelled) => !from.is_terminal(),
        _ => false,
    }
}

/// Evaluates every check-in readiness gate and returns the unmet ones, in
/// the order staff would action them. Empty means the booking may check in.
pub fn check_in_pending_steps(
    booking: &booking::Model,
    registered_passengers: i32,
    financials: &BookingFinancials,
) -> Vec<PendingStep> {
    let mut steps = Vec::new();
    if !booking.room_clean {
        steps.push(PendingStep::CleanRoom);
    }
    if !booking.inventory_verified {
        steps.push(PendingStep::VerifyInventory);
    }
    if !booking.inventory_delivered {
        steps.push(PendingStep::DeliverInventory);
    }
    if registered_passengers < booking.guest_count {
        steps.push(PendingStep::RegisterPassengers);
    }
    if !financials.is_fully_paid {
        steps.push(PendingStep::SettleBalance);
    }
    steps
}

/// A booking expected at the front desk: pre-check-in status with a stay
/// window covering `today`.
pub fn is_awaiting_check_in(booking: &booking::Model, today: NaiveDate) -> bool {
    matches!(
        booking.status,
        BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Paid
    ) && booking.check_in_date <= today
        && booking.check_out_date >= today
}

/// A booking past its scheduled check-out while the guest never checked in.
/// Surfaced alongside check-outs because both block the room until staff
/// act; the engine flags these, it never auto-cancels them.
pub fn is_overdue(booking: &booking::Model, today: NaiveDate) -> bool {
    matches!(
        booking.status,
        BookingStatus::Confirmed | BookingStatus::Paid
    ) && booking.check_out_date < today
}

/// A booking requiring check-out attention: currently in-house, or overdue.
pub fn is_awaiting_check_out(booking: &booking::Model, today: NaiveDate) -> bool {
    booking.status == BookingStatus::CheckedIn || is_overdue(booking, today)
}
