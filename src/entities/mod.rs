//! Sea-ORM entity definitions for the booking engine.
//!
//! A booking owns its payments, extra charges, inventory usages and credit
//! notes; shifts are referenced by payments but owned by the operator.

pub mod booking;
pub mod credit_note;
pub mod extra_charge;
pub mod inventory_usage;
pub mod payment;
pub mod room_item;
pub mod shift;
