pub mod inventory;
pub mod orders;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSender;
use crate::services::{
    addresses::AddressService, catalog::CatalogService, inventory::InventoryService,
    order_items::OrderItemService, order_number::OrderNumberGenerator, orders::OrderService,
};

/// Business-logic layer handed to the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub inventory: Arc<InventoryService>,
    pub catalog: Arc<CatalogService>,
    pub addresses: Arc<AddressService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        let event_sender = Arc::new(event_sender);

        let inventory = InventoryService::new(db.clone(), Some(event_sender.clone()));
        let catalog = CatalogService::new(db.clone());
        let addresses = AddressService::new(db.clone());
        let order_items = OrderItemService::new(db.clone(), inventory.clone(), catalog.clone());
        let order_numbers = OrderNumberGenerator::new(db.clone());
        let orders = OrderService::new(
            db,
            inventory.clone(),
            addresses.clone(),
            order_items,
            order_numbers,
            Some(event_sender),
        );

        Self {
            orders: Arc::new(orders),
            inventory: Arc::new(inventory),
            catalog: Arc::new(catalog),
            addresses: Arc::new(addresses),
        }
    }
}
