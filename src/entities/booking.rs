use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a booking.
///
/// Transitions are validated by `services::lifecycle`; nothing else in the
/// crate writes this column directly.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    #[strum(serialize = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    #[strum(serialize = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "paid")]
    #[strum(serialize = "paid")]
    Paid,
    #[sea_orm(string_value = "checked_in")]
    #[strum(serialize = "checked_in")]
    CheckedIn,
    #[sea_orm(string_value = "completed")]
    #[strum(serialize = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

/// The `bookings` table: one guest reservation for a room over a date range.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub room_id: Uuid,
    pub guest_id: Uuid,

    /// Scheduled stay boundaries, hotel-local calendar dates.
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,

    /// Derived from the dates at creation and recomputed on early check-out.
    pub nights: i32,

    pub guest_count: i32,
    pub room_amount: Decimal,
    pub status: BookingStatus,

    // Check-in readiness gates
    pub room_clean: bool,
    pub inventory_verified: bool,
    pub inventory_verified_at: Option<DateTime<Utc>>,
    pub inventory_delivered: bool,
    pub inventory_delivered_at: Option<DateTime<Utc>>,
    pub inventory_delivered_by: Option<Uuid>,
    pub passengers_completed: bool,
    pub passengers_completed_at: Option<DateTime<Utc>>,

    pub actual_check_in: Option<DateTime<Utc>>,
    pub actual_check_out: Option<DateTime<Utc>>,

    // Cancellation metadata
    pub cancelled_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_notes: Option<String>,

    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency token; bumped on every guarded transition.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    #[sea_orm(has_many = "super::extra_charge::Entity")]
    ExtraCharges,
    #[sea_orm(has_many = "super::inventory_usage::Entity")]
    InventoryUsages,
    #[sea_orm(has_many = "super::credit_note::Entity")]
    CreditNotes,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::extra_charge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExtraCharges.def()
    }
}

impl Related<super::inventory_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryUsages.def()
    }
}

impl Related<super::credit_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditNotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
