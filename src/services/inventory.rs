use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::shoe_inventory::{self, Entity as ShoeInventoryEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// The inventory ledger: per (shoe model, size) counters mutated through
/// reserve / release / commit / restore.
///
/// "Reserved but cancellable" and "sold and returnable" are different
/// lifecycle phases with different ledger effects, hence the four distinct
/// mutations. A missing record is reported as a `false`/no-op at this layer;
/// the caller decides whether that is fatal.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    async fn find_record(
        &self,
        shoe_model_id: Uuid,
        size: &str,
    ) -> Result<Option<shoe_inventory::Model>, ServiceError> {
        let record = ShoeInventoryEntity::find()
            .filter(shoe_inventory::Column::ShoeModelId.eq(shoe_model_id))
            .filter(shoe_inventory::Column::Size.eq(size))
            .one(&*self.db)
            .await?;
        Ok(record)
    }

    fn ensure_positive(quantity: i32) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to publish inventory event");
            }
        }
    }

    /// Side-effect-free availability check: the record must exist, have
    /// unreserved stock, and cover the requested quantity.
    #[instrument(skip(self))]
    pub async fn is_available(
        &self,
        shoe_model_id: Uuid,
        size: &str,
        quantity: i32,
    ) -> Result<bool, ServiceError> {
        Self::ensure_positive(quantity)?;

        let record = self.find_record(shoe_model_id, size).await?;
        Ok(match record {
            Some(record) => record.is_sellable() && record.actual_available() >= quantity,
            None => false,
        })
    }

    /// Sellable units for a (model, size) pair; zero when no record exists.
    #[instrument(skip(self))]
    pub async fn available_quantity(
        &self,
        shoe_model_id: Uuid,
        size: &str,
    ) -> Result<i32, ServiceError> {
        let record = self.find_record(shoe_model_id, size).await?;
        Ok(record.map(|r| r.actual_available()).unwrap_or(0))
    }

    /// Earmarks `quantity` units for a pending order.
    ///
    /// Returns `Ok(false)` without mutating when no record exists or the
    /// sellable stock is short. The availability re-check happens at
    /// mutation time, but there is no compare-and-swap: under concurrent
    /// load two callers can both pass it, serialized only by the store.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        shoe_model_id: Uuid,
        size: &str,
        quantity: i32,
    ) -> Result<bool, ServiceError> {
        Self::ensure_positive(quantity)?;

        let Some(record) = self.find_record(shoe_model_id, size).await? else {
            warn!(%shoe_model_id, size, "no inventory record to reserve");
            return Ok(false);
        };

        let available = record.actual_available();
        if available < quantity {
            warn!(
                %shoe_model_id,
                size,
                requested = quantity,
                available,
                "insufficient inventory to reserve"
            );
            return Ok(false);
        }

        let new_reserved = record.quantity_reserved + quantity;
        let mut active: shoe_inventory::ActiveModel = record.into();
        active.quantity_reserved = Set(new_reserved);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        info!(
            %shoe_model_id,
            size,
            quantity,
            reserved_total = new_reserved,
            "reserved inventory"
        );

        self.emit(Event::InventoryReserved {
            shoe_model_id,
            size: size.to_string(),
            quantity,
        })
        .await;

        Ok(true)
    }

    /// Undoes a reservation that never became a sale (pending order
    /// cancelled, or a later line in the same checkout failed). Floors the
    /// reserved counter at zero.
    #[instrument(skip(self))]
    pub async fn release(
        &self,
        shoe_model_id: Uuid,
        size: &str,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        Self::ensure_positive(quantity)?;

        let Some(record) = self.find_record(shoe_model_id, size).await? else {
            warn!(%shoe_model_id, size, "no inventory record to release");
            return Ok(());
        };

        let new_reserved = (record.quantity_reserved - quantity).max(0);
        let mut active: shoe_inventory::ActiveModel = record.into();
        active.quantity_reserved = Set(new_reserved);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        info!(
            %shoe_model_id,
            size,
            quantity,
            reserved_total = new_reserved,
            "released reserved inventory"
        );

        self.emit(Event::InventoryReleased {
            shoe_model_id,
            size: size.to_string(),
            quantity,
        })
        .await;

        Ok(())
    }

    /// Converts a reservation into a sale: the earmarked units leave both
    /// the available pool and the reserved counter. Each side floors at
    /// zero.
    #[instrument(skip(self))]
    pub async fn commit(
        &self,
        shoe_model_id: Uuid,
        size: &str,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        Self::ensure_positive(quantity)?;

        let Some(record) = self.find_record(shoe_model_id, size).await? else {
            warn!(%shoe_model_id, size, "no inventory record to commit");
            return Ok(());
        };

        let new_available = (record.quantity_available - quantity).max(0);
        let new_reserved = (record.quantity_reserved - quantity).max(0);
        let mut active: shoe_inventory::ActiveModel = record.into();
        active.quantity_available = Set(new_available);
        active.quantity_reserved = Set(new_reserved);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        info!(
            %shoe_model_id,
            size,
            quantity,
            available = new_available,
            reserved = new_reserved,
            "committed reserved inventory"
        );

        self.emit(Event::InventoryCommitted {
            shoe_model_id,
            size: size.to_string(),
            quantity,
        })
        .await;

        Ok(())
    }

    /// Returns previously sold units to the available pool, used when a
    /// confirmed or processing order is cancelled.
    #[instrument(skip(self))]
    pub async fn restore(
        &self,
        shoe_model_id: Uuid,
        size: &str,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        Self::ensure_positive(quantity)?;

        let Some(record) = self.find_record(shoe_model_id, size).await? else {
            warn!(%shoe_model_id, size, "no inventory record to restore");
            return Ok(());
        };

        let new_available = record.quantity_available + quantity;
        let mut active: shoe_inventory::ActiveModel = record.into();
        active.quantity_available = Set(new_available);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        info!(
            %shoe_model_id,
            size,
            quantity,
            available = new_available,
            "restored inventory"
        );

        self.emit(Event::InventoryRestored {
            shoe_model_id,
            size: size.to_string(),
            quantity,
        })
        .await;

        Ok(())
    }

    /// Fetches the inventory record for a (model, size) pair.
    #[instrument(skip(self))]
    pub async fn get_inventory(
        &self,
        shoe_model_id: Uuid,
        size: &str,
    ) -> Result<shoe_inventory::Model, ServiceError> {
        self.find_record(shoe_model_id, size).await?.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Inventory for shoe model {} size {} not found",
                shoe_model_id, size
            ))
        })
    }

    /// All inventory records for a model, ordered by size.
    #[instrument(skip(self))]
    pub async fn list_for_model(
        &self,
        shoe_model_id: Uuid,
    ) -> Result<Vec<shoe_inventory::Model>, ServiceError> {
        use sea_orm::QueryOrder;

        let records = ShoeInventoryEntity::find()
            .filter(shoe_inventory::Column::ShoeModelId.eq(shoe_model_id))
            .order_by_asc(shoe_inventory::Column::Size)
            .all(&*self.db)
            .await?;
        Ok(records)
    }

    /// Admin provisioning: sets both counters for a (model, size) pair,
    /// creating the record when it does not exist yet.
    #[instrument(skip(self))]
    pub async fn set_levels(
        &self,
        shoe_model_id: Uuid,
        size: &str,
        quantity_available: i32,
        quantity_reserved: i32,
    ) -> Result<shoe_inventory::Model, ServiceError> {
        if quantity_available < 0 || quantity_reserved < 0 {
            return Err(ServiceError::InvalidInput(
                "Inventory quantities must be non-negative".to_string(),
            ));
        }

        let now = Utc::now();
        let updated = match self.find_record(shoe_model_id, size).await? {
            Some(record) => {
                let mut active: shoe_inventory::ActiveModel = record.into();
                active.quantity_available = Set(quantity_available);
                active.quantity_reserved = Set(quantity_reserved);
                active.updated_at = Set(Some(now));
                active.update(&*self.db).await?
            }
            None => {
                let active = shoe_inventory::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    shoe_model_id: Set(shoe_model_id),
                    size: Set(size.to_string()),
                    quantity_available: Set(quantity_available),
                    quantity_reserved: Set(quantity_reserved),
                    created_at: Set(now),
                    updated_at: Set(Some(now)),
                };
                active.insert(&*self.db).await?
            }
        };

        info!(
            %shoe_model_id,
            size,
            quantity_available,
            quantity_reserved,
            "inventory levels set"
        );

        Ok(updated)
    }

    /// Total available units across every record.
    #[instrument(skip(self))]
    pub async fn total_available_stock(&self) -> Result<i64, ServiceError> {
        let records = ShoeInventoryEntity::find().all(&*self.db).await?;
        Ok(records
            .iter()
            .map(|r| i64::from(r.quantity_available))
            .sum())
    }
}
