//! Service layer: the booking lifecycle state machine and the ledgers it
//! depends on, plus the pure reconciliation and transition logic they share.

pub mod bookings;
pub mod inventory;
pub mod lifecycle;
pub mod reconciliation;
pub mod shifts;
