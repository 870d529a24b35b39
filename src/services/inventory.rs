//! Inventory usage ledger: per-booking assignment, consumption and return of
//! room items, feeding the laundry pipeline at check-out.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::inventory_usage::{self, Entity as UsageEntity, UsageStatus},
    entities::room_item,
    errors::ServiceError,
};

/// One laundry batch line: a dirty item leaving a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirtyItem {
    pub item_id: Uuid,
    pub item_type: String,
    pub quantity: i32,
}

/// Service for the inventory-usage state machine.
#[derive(Clone)]
pub struct InventoryUsageService {
    db: Arc<DatabaseConnection>,
}

impl InventoryUsageService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Assigns `quantity` of an item type to a booking, in state `assigned`.
    #[instrument(skip(self), fields(booking_id = %booking_id, item_id = %item_id))]
    pub async fn assign(
        &self,
        booking_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<inventory_usage::Model, ServiceError> {
        self.assign_on(&*self.db, booking_id, item_id, quantity)
            .await
    }

    /// Transaction-aware variant of [`assign`]; check-in uses this to create
    /// usage rows inside the same transaction that flips the booking status.
    pub async fn assign_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        booking_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<inventory_usage::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Assigned quantity must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let active = inventory_usage::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            item_id: Set(item_id),
            quantity: Set(quantity),
            quantity_consumed: Set(0),
            quantity_returned: Set(0),
            status: Set(UsageStatus::Assigned),
            assigned_at: Set(now),
            returned_at: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };
        Ok(active.insert(conn).await?)
    }

    /// Moves a usage to `target`, validating against the strict transition
    /// graph. Entering `returned` stamps `returned_at` if unset.
    #[instrument(skip(self), fields(usage_id = %usage_id, target = %target))]
    pub async fn transition(
        &self,
        usage_id: Uuid,
        target: UsageStatus,
    ) -> Result<inventory_usage::Model, ServiceError> {
        let usage = self.require(&*self.db, usage_id).await?;
        Self::transition_row(&*self.db, usage, target).await
    }

    /// Adds to the consumed counter. The consumed and returned counters
    /// together can never exceed the assigned quantity.
    #[instrument(skip(self), fields(usage_id = %usage_id))]
    pub async fn consume(
        &self,
        usage_id: Uuid,
        quantity: i32,
    ) -> Result<inventory_usage::Model, ServiceError> {
        self.bump_counter(usage_id, quantity, true).await
    }

    /// Adds to the returned counter, bounded like [`consume`].
    #[instrument(skip(self), fields(usage_id = %usage_id))]
    pub async fn return_items(
        &self,
        usage_id: Uuid,
        quantity: i32,
    ) -> Result<inventory_usage::Model, ServiceError> {
        self.bump_counter(usage_id, quantity, false).await
    }

    pub async fn usages_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<inventory_usage::Model>, ServiceError> {
        Ok(UsageEntity::find()
            .filter(inventory_usage::Column::BookingId.eq(booking_id))
            .all(&*self.db)
            .await?)
    }

    /// Closes out every non-terminal usage of a booking at check-out.
    ///
    /// Each outstanding row moves to its disposition (default `returned`).
    /// Returns the dirty-item batch for the laundry collaborator: one line
    /// per returned usage with the quantity that came back from the room.
    pub async fn close_out_for_booking<C: ConnectionTrait>(
        &self,
        conn: &C,
        booking_id: Uuid,
        dispositions: &HashMap<Uuid, UsageStatus>,
    ) -> Result<Vec<DirtyItem>, ServiceError> {
        let usages = UsageEntity::find()
            .filter(inventory_usage::Column::BookingId.eq(booking_id))
            .all(conn)
            .await?;

        let mut dirty = Vec::new();
        for usage in usages {
            if usage.status.is_terminal() {
                continue;
            }
            let target = dispositions
                .get(&usage.id)
                .copied()
                .unwrap_or(UsageStatus::Returned);
            if !target.is_terminal() {
                return Err(ServiceError::ValidationError(format!(
                    "Check-out disposition must be terminal, got '{}'",
                    target
                )));
            }
            let updated = Self::transition_row(conn, usage, target).await?;

            if updated.status == UsageStatus::Returned {
                let came_back = updated.quantity - updated.quantity_consumed;
                if came_back > 0 {
                    let item_type = room_item::Entity::find_by_id(updated.item_id)
                        .one(conn)
                        .await?
                        .map(|item| item.item_type)
                        .unwrap_or_else(|| "unknown".to_string());
                    dirty.push(DirtyItem {
                        item_id: updated.item_id,
                        item_type,
                        quantity: came_back,
                    });
                }
            }
        }

        info!(booking_id = %booking_id, dirty_items = dirty.len(), "Inventory closed out");
        Ok(dirty)
    }

    async fn transition_row<C: ConnectionTrait>(
        conn: &C,
        usage: inventory_usage::Model,
        target: UsageStatus,
    ) -> Result<inventory_usage::Model, ServiceError> {
        if !usage.status.can_transition_to(target) {
            return Err(ServiceError::invalid_transition(usage.status, target));
        }

        let now = Utc::now();
        let returned_at = usage.returned_at;
        let quantity = usage.quantity;
        let consumed = usage.quantity_consumed;
        let mut active: inventory_usage::ActiveModel = usage.into();
        active.status = Set(target);
        if target == UsageStatus::Returned {
            if returned_at.is_none() {
                active.returned_at = Set(Some(now));
            }
            // A blanket return accounts for whatever was not consumed.
            active.quantity_returned = Set(quantity - consumed);
        }
        active.updated_at = Set(Some(now));
        Ok(active.update(conn).await?)
    }

    async fn bump_counter(
        &self,
        usage_id: Uuid,
        quantity: i32,
        consumed: bool,
    ) -> Result<inventory_usage::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Quantity must be positive".to_string(),
            ));
        }

        let usage = self.require(&*self.db, usage_id).await?;
        if usage.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Inventory usage {} is already {}",
                usage_id, usage.status
            )));
        }

        let (new_consumed, new_returned) = if consumed {
            (usage.quantity_consumed + quantity, usage.quantity_returned)
        } else {
            (usage.quantity_consumed, usage.quantity_returned + quantity)
        };
        if new_consumed + new_returned > usage.quantity {
            return Err(ServiceError::ValidationError(format!(
                "Consumed ({}) plus returned ({}) would exceed assigned quantity ({})",
                new_consumed, new_returned, usage.quantity
            )));
        }

        let mut active: inventory_usage::ActiveModel = usage.into();
        active.quantity_consumed = Set(new_consumed);
        active.quantity_returned = Set(new_returned);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    async fn require<C: ConnectionTrait>(
        &self,
        conn: &C,
        usage_id: Uuid,
    ) -> Result<inventory_usage::Model, ServiceError> {
        UsageEntity::find_by_id(usage_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory usage {} not found", usage_id))
            })
    }
}
