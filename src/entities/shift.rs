use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ShiftStatus {
    #[sea_orm(string_value = "open")]
    #[strum(serialize = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    #[strum(serialize = "closed")]
    Closed,
}

/// The `shifts` table: one cash-drawer session for one operator.
///
/// At most one row per operator may be `open` at any time; a partial unique
/// index on `(operator_id) WHERE status = 'open'` backs the invariant at the
/// data layer.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub operator_id: Uuid,
    pub status: ShiftStatus,

    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,

    pub opening_cash: Decimal,
    pub closing_cash: Option<Decimal>,

    /// `opening_cash + total_cash_sales`, computed at close.
    pub expected_cash: Option<Decimal>,
    /// `closing_cash - expected_cash`, computed at close.
    pub cash_difference: Option<Decimal>,

    // Running totals, incremented as payments are attributed
    pub total_cash_sales: Decimal,
    pub total_card_sales: Decimal,
    pub total_transfer_sales: Decimal,
    pub total_sales: Decimal,
    pub cash_count: i32,
    pub card_count: i32,
    pub transfer_count: i32,
    pub total_transactions: i32,

    // Activity counters
    pub check_in_count: i32,
    pub check_out_count: i32,
    pub bookings_created: i32,

    pub opening_notes: Option<String>,
    pub closing_notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
