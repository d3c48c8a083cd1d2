use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::order_item,
    errors::ServiceError,
    services::catalog::{CatalogService, LoadedModel},
    services::inventory::InventoryService,
};

/// One requested line of a checkout.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    pub shoe_model_id: Uuid,

    #[validate(length(min = 1, max = 10, message = "Size must be 1 to 10 characters"))]
    pub size: String,

    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

/// Builds persisted order items out of requested lines with an
/// all-or-nothing reservation outcome.
#[derive(Clone)]
pub struct OrderItemService {
    db: Arc<DatabaseConnection>,
    inventory: InventoryService,
    catalog: CatalogService,
}

impl OrderItemService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        inventory: InventoryService,
        catalog: CatalogService,
    ) -> Self {
        Self {
            db,
            inventory,
            catalog,
        }
    }

    /// Validates and reserves every requested line in input order, then
    /// materializes the priced items as a batch.
    ///
    /// The first failing line determines the error the caller sees. Any
    /// reservations made before a failure are released again, leaving the
    /// ledger as if the call never happened; a release that itself fails is
    /// logged and swallowed so it cannot mask the original error.
    #[instrument(skip(self, lines), fields(order_id = %order_id, line_count = lines.len()))]
    pub async fn create_order_items(
        &self,
        order_id: Uuid,
        lines: &[OrderItemInput],
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        let models = self.load_models(lines).await?;
        self.validate_lines(lines, &models).await?;

        let mut reserved: Vec<&OrderItemInput> = Vec::new();
        for line in lines {
            let ok = match self
                .inventory
                .reserve(line.shoe_model_id, &line.size, line.quantity)
                .await
            {
                Ok(ok) => ok,
                Err(e) => {
                    self.release_reserved(&reserved).await;
                    return Err(e);
                }
            };

            // Validation passed moments ago, so a refused reservation means
            // another checkout won the stock in between.
            if !ok {
                self.release_reserved(&reserved).await;
                let available = self
                    .inventory
                    .available_quantity(line.shoe_model_id, &line.size)
                    .await
                    .unwrap_or(0);
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient inventory for shoe model {} size {}: requested {}, available {}",
                    line.shoe_model_id, line.size, line.quantity, available
                )));
            }

            reserved.push(line);
        }

        match self.persist_items(order_id, lines, &models).await {
            Ok(items) => {
                info!(count = items.len(), "order items created");
                Ok(items)
            }
            Err(e) => {
                self.release_reserved(&reserved).await;
                Err(e)
            }
        }
    }

    /// Sum of the items' total prices; zero for an empty slice.
    pub fn total_amount(items: &[order_item::Model]) -> Decimal {
        items.iter().map(|item| item.total_price).sum()
    }

    async fn load_models(
        &self,
        lines: &[OrderItemInput],
    ) -> Result<HashMap<Uuid, LoadedModel>, ServiceError> {
        let mut ids: Vec<Uuid> = lines.iter().map(|line| line.shoe_model_id).collect();
        ids.sort_unstable();
        ids.dedup();
        self.catalog.load_models(&ids).await
    }

    async fn validate_lines(
        &self,
        lines: &[OrderItemInput],
        models: &HashMap<Uuid, LoadedModel>,
    ) -> Result<(), ServiceError> {
        for line in lines {
            let loaded = models.get(&line.shoe_model_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Shoe model {} not found", line.shoe_model_id))
            })?;

            if !loaded.is_sellable() {
                return Err(ServiceError::InvalidInput(format!(
                    "Shoe model {} is not available",
                    line.shoe_model_id
                )));
            }

            if line.quantity <= 0 {
                return Err(ServiceError::InvalidInput(
                    "Quantity must be positive".to_string(),
                ));
            }

            if !self
                .inventory
                .is_available(line.shoe_model_id, &line.size, line.quantity)
                .await?
            {
                let available = self
                    .inventory
                    .available_quantity(line.shoe_model_id, &line.size)
                    .await?;
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient inventory for shoe model {} size {}: requested {}, available {}",
                    line.shoe_model_id, line.size, line.quantity, available
                )));
            }
        }
        Ok(())
    }

    async fn persist_items(
        &self,
        order_id: Uuid,
        lines: &[OrderItemInput],
        models: &HashMap<Uuid, LoadedModel>,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        let txn = self.db.begin().await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let loaded = models.get(&line.shoe_model_id).ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Shoe model {} missing from request context",
                    line.shoe_model_id
                ))
            })?;
            let unit_price = loaded.model.price;
            let total_price = unit_price * Decimal::from(line.quantity);

            let active = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                shoe_model_id: Set(line.shoe_model_id),
                size: Set(line.size.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(unit_price),
                total_price: Set(total_price),
                ..Default::default()
            };

            items.push(active.insert(&txn).await?);
        }

        txn.commit().await?;
        Ok(items)
    }

    async fn release_reserved(&self, reserved: &[&OrderItemInput]) {
        for line in reserved {
            if let Err(e) = self
                .inventory
                .release(line.shoe_model_id, &line.size, line.quantity)
                .await
            {
                error!(
                    shoe_model_id = %line.shoe_model_id,
                    size = %line.size,
                    quantity = line.quantity,
                    error = %e,
                    "failed to release reserved inventory during unwind"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn item(unit_price: Decimal, quantity: i32) -> order_item::Model {
        order_item::Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            shoe_model_id: Uuid::new_v4(),
            size: "42".to_string(),
            quantity,
            unit_price,
            total_price: unit_price * Decimal::from(quantity),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn total_amount_sums_line_totals() {
        let items = vec![item(dec!(50.00), 2), item(dec!(25.50), 1)];
        assert_eq!(OrderItemService::total_amount(&items), dec!(125.50));
    }

    #[test]
    fn total_amount_of_no_items_is_zero() {
        assert_eq!(OrderItemService::total_amount(&[]), Decimal::ZERO);
    }

    #[test]
    fn line_input_rejects_non_positive_quantity() {
        let input = OrderItemInput {
            shoe_model_id: Uuid::new_v4(),
            size: "42".to_string(),
            quantity: 0,
        };
        assert!(input.validate().is_err());
    }
}
