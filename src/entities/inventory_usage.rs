use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of one inventory assignment. The transition graph is strict:
/// `assigned -> {in_use, returned, consumed, damaged}`,
/// `in_use -> {returned, consumed, damaged}`; terminal states have no exits.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UsageStatus {
    #[sea_orm(string_value = "assigned")]
    #[strum(serialize = "assigned")]
    Assigned,
    #[sea_orm(string_value = "in_use")]
    #[strum(serialize = "in_use")]
    InUse,
    #[sea_orm(string_value = "returned")]
    #[strum(serialize = "returned")]
    Returned,
    #[sea_orm(string_value = "consumed")]
    #[strum(serialize = "consumed")]
    Consumed,
    #[sea_orm(string_value = "damaged")]
    #[strum(serialize = "damaged")]
    Damaged,
}

impl UsageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UsageStatus::Returned | UsageStatus::Consumed | UsageStatus::Damaged
        )
    }

    /// Whether `target` is reachable from `self` in one step.
    pub fn can_transition_to(self, target: UsageStatus) -> bool {
        match self {
            UsageStatus::Assigned => target != UsageStatus::Assigned,
            UsageStatus::InUse => target.is_terminal(),
            _ => false,
        }
    }
}

/// The `inventory_usages` table: one assignment of a room item type to a
/// booking, tracked from assignment to a terminal disposition.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_usages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub booking_id: Uuid,
    pub item_id: Uuid,

    pub quantity: i32,
    pub quantity_consumed: i32,
    pub quantity_returned: i32,

    pub status: UsageStatus,

    pub assigned_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
    #[sea_orm(
        belongs_to = "super::room_item::Entity",
        from = "Column::ItemId",
        to = "super::room_item::Column::Id"
    )]
    RoomItem,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl Related<super::room_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoomItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
