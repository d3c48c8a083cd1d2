use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        order::{self, Entity as OrderEntity, OrderStatus},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::addresses::AddressService,
    services::inventory::InventoryService,
    services::order_items::{OrderItemInput, OrderItemService},
    services::order_number::OrderNumberGenerator,
};

/// Checkout request: a cart of lines plus the shipping address to use.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub shipping_address_id: Uuid,

    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderItemInput>,
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub total_orders: u64,
    pub by_status: HashMap<String, u64>,
    /// Sum of total amounts over delivered orders.
    pub total_revenue: Decimal,
}

/// Owns the order aggregate and its status state machine. Every transition
/// keeps the inventory ledger consistent with the order's new state.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    inventory: InventoryService,
    addresses: AddressService,
    order_items: OrderItemService,
    order_numbers: OrderNumberGenerator,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        inventory: InventoryService,
        addresses: AddressService,
        order_items: OrderItemService,
        order_numbers: OrderNumberGenerator,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db,
            inventory,
            addresses,
            order_items,
            order_numbers,
            event_sender,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to publish order event");
            }
        }
    }

    /// Places an order: creates the pending shell, builds and reserves the
    /// line items, then persists the recomputed total.
    ///
    /// If the item build fails the pending shell is left behind without
    /// items and the error propagates; callers retry the whole checkout
    /// rather than patching up a half-placed order.
    #[instrument(skip(self, request), fields(user_id = %user_id, line_count = request.items.len()))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<PlacedOrder, ServiceError> {
        request.validate()?;

        let address = self
            .addresses
            .get_address(user_id, request.shipping_address_id)
            .await?;

        let order_number = self.order_numbers.generate().await?;
        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let shell = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            user_id: Set(user_id),
            status: Set(OrderStatus::Pending.to_string()),
            total_amount: Set(Decimal::ZERO),
            shipping_address_id: Set(address.id),
            order_date: Set(now),
            shipped_date: Set(None),
            delivered_date: Set(None),
            version: Set(1),
            ..Default::default()
        };
        let order = shell.insert(&*self.db).await?;

        let items = self
            .order_items
            .create_order_items(order_id, &request.items)
            .await?;

        let total_amount = OrderItemService::total_amount(&items);
        let mut active: order::ActiveModel = order.into();
        active.total_amount = Set(total_amount);
        active.updated_at = Set(Some(Utc::now()));
        let order = active.update(&*self.db).await?;

        info!(
            order_id = %order_id,
            order_number = %order_number,
            total_amount = %total_amount,
            "order created"
        );

        self.emit(Event::OrderCreated(order_id)).await;

        Ok(PlacedOrder { order, items })
    }

    /// Moves an order through its state machine, applying the matching
    /// ledger effects before the new status is persisted.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<PlacedOrder, ServiceError> {
        let order = self.get_order(order_id).await?;
        let current = order.status().ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Order {} has unrecognized status '{}'",
                order_id, order.status
            ))
        })?;

        if !current.can_transition_to(new_status) {
            return Err(ServiceError::InvalidTransition {
                from: current.to_string(),
                to: new_status.to_string(),
            });
        }

        let items = self.load_items(order_id).await?;
        self.apply_ledger_effects(&order, current, new_status, &items)
            .await?;

        let now = Utc::now();
        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        match new_status {
            OrderStatus::Shipped => active.shipped_date = Set(Some(now)),
            OrderStatus::Delivered => active.delivered_date = Set(Some(now)),
            _ => {}
        }
        let updated = active.update(&*self.db).await?;

        info!(
            order_id = %order_id,
            old_status = %current,
            new_status = %new_status,
            "order status updated"
        );

        self.emit(Event::OrderStatusChanged {
            order_id,
            old_status: current.to_string(),
            new_status: new_status.to_string(),
        })
        .await;
        if new_status == OrderStatus::Cancelled {
            self.emit(Event::OrderCancelled(order_id)).await;
        }

        Ok(PlacedOrder {
            order: updated,
            items,
        })
    }

    /// Cancels an order, releasing or restoring its stock depending on how
    /// far the order had progressed. Cancelling an already-finished order
    /// violates the aggregate invariant rather than the transition table.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<PlacedOrder, ServiceError> {
        let order = self.get_order(order_id).await?;
        if let Some(current) = order.status() {
            if current.is_terminal() {
                return Err(ServiceError::IllegalState(format!(
                    "Order cannot be cancelled in current status: {}",
                    current
                )));
            }
        }

        self.update_order_status(order_id, OrderStatus::Cancelled)
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_order_with_items(&self, order_id: Uuid) -> Result<PlacedOrder, ServiceError> {
        let order = self.get_order(order_id).await?;
        let items = self.load_items(order_id).await?;
        Ok(PlacedOrder { order, items })
    }

    /// A user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_user_orders(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::InvalidInput(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if per_page == 0 || per_page > 100 {
            return Err(ServiceError::InvalidInput(
                "Page size must be between 1 and 100".to_string(),
            ));
        }

        let paginator = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::OrderDate)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        Ok((orders, total))
    }

    /// Counts per status plus revenue over delivered orders.
    #[instrument(skip(self))]
    pub async fn order_statistics(&self) -> Result<OrderStatistics, ServiceError> {
        let total_orders = OrderEntity::find().count(&*self.db).await?;

        let mut by_status = HashMap::new();
        for status in OrderStatus::ALL {
            let count = OrderEntity::find()
                .filter(order::Column::Status.eq(status.to_string()))
                .count(&*self.db)
                .await?;
            by_status.insert(status.to_string(), count);
        }

        let delivered = OrderEntity::find()
            .filter(order::Column::Status.eq(OrderStatus::Delivered.to_string()))
            .all(&*self.db)
            .await?;
        let total_revenue = delivered.iter().map(|o| o.total_amount).sum();

        Ok(OrderStatistics {
            total_orders,
            by_status,
            total_revenue,
        })
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError> {
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    /// Ledger side effects of a transition, applied per line:
    /// confirmation turns reservations into sales; cancellation either
    /// releases still-pending reservations or restores already-sold stock.
    async fn apply_ledger_effects(
        &self,
        order: &order::Model,
        from: OrderStatus,
        to: OrderStatus,
        items: &[order_item::Model],
    ) -> Result<(), ServiceError> {
        match to {
            OrderStatus::Confirmed => {
                for item in items {
                    self.inventory
                        .commit(item.shoe_model_id, &item.size, item.quantity)
                        .await?;
                }
                info!(order_number = %order.order_number, "committed inventory for confirmed order");
            }
            OrderStatus::Cancelled => match from {
                OrderStatus::Pending => {
                    for item in items {
                        self.inventory
                            .release(item.shoe_model_id, &item.size, item.quantity)
                            .await?;
                    }
                    info!(
                        order_number = %order.order_number,
                        "released reserved inventory for cancelled pending order"
                    );
                }
                OrderStatus::Confirmed | OrderStatus::Processing => {
                    for item in items {
                        self.inventory
                            .restore(item.shoe_model_id, &item.size, item.quantity)
                            .await?;
                    }
                    info!(
                        order_number = %order.order_number,
                        "restored inventory for cancelled order"
                    );
                }
                _ => {}
            },
            // Processing, Shipped, Delivered: stock already committed at
            // confirmation time.
            _ => {}
        }
        Ok(())
    }
}
