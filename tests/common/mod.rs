#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use shoestore_api::{
    db,
    entities::{order_item, shoe, shoe_inventory, shoe_model, user_address},
    events,
    handlers::AppServices,
    services::order_items::OrderItemInput,
};

/// Test harness over an in-memory SQLite database. A single pooled
/// connection keeps every query on the same database instance.
pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
}

pub async fn setup() -> TestContext {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Arc::new(
        Database::connect(options)
            .await
            .expect("failed to open in-memory database"),
    );
    db::bootstrap_schema(&db)
        .await
        .expect("failed to bootstrap schema");

    let (event_sender, event_receiver) = events::channel(256);
    let _event_task = events::spawn_logging_consumer(event_receiver);

    let services = AppServices::new(db.clone(), event_sender);
    TestContext { db, services }
}

/// Seeds a shoe and one model under it, returning the model.
pub async fn seed_model(ctx: &TestContext, price: Decimal) -> shoe_model::Model {
    seed_model_with_flags(ctx, price, true, true).await
}

pub async fn seed_model_with_flags(
    ctx: &TestContext,
    price: Decimal,
    model_active: bool,
    shoe_active: bool,
) -> shoe_model::Model {
    let now = Utc::now();
    let shoe_id = Uuid::new_v4();

    let parent = shoe::ActiveModel {
        id: Set(shoe_id),
        name: Set(format!("Runner {}", &shoe_id.to_string()[..8])),
        description: Set(None),
        is_active: Set(shoe_active),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    };
    parent.insert(&*ctx.db).await.expect("failed to seed shoe");

    let model_id = Uuid::new_v4();
    let model = shoe_model::ActiveModel {
        id: Set(model_id),
        shoe_id: Set(shoe_id),
        model_name: Set("Classic".to_string()),
        color: Set("black".to_string()),
        sku: Set(format!("SKU-{}", &model_id.to_string()[..8].to_uppercase())),
        price: Set(price),
        is_active: Set(model_active),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    };
    model
        .insert(&*ctx.db)
        .await
        .expect("failed to seed shoe model")
}

pub async fn seed_inventory(
    ctx: &TestContext,
    shoe_model_id: Uuid,
    size: &str,
    available: i32,
    reserved: i32,
) -> shoe_inventory::Model {
    let now = Utc::now();
    let record = shoe_inventory::ActiveModel {
        id: Set(Uuid::new_v4()),
        shoe_model_id: Set(shoe_model_id),
        size: Set(size.to_string()),
        quantity_available: Set(available),
        quantity_reserved: Set(reserved),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    };
    record
        .insert(&*ctx.db)
        .await
        .expect("failed to seed inventory")
}

pub async fn seed_address(ctx: &TestContext, user_id: Uuid) -> user_address::Model {
    let now = Utc::now();
    let address = user_address::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        label: Set("home".to_string()),
        street: Set("12 Main St".to_string()),
        city: Set("Springfield".to_string()),
        postal_code: Set("12345".to_string()),
        country: Set("US".to_string()),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    };
    address
        .insert(&*ctx.db)
        .await
        .expect("failed to seed address")
}

/// Current inventory counters for a (model, size) pair.
pub async fn inventory_level(
    ctx: &TestContext,
    shoe_model_id: Uuid,
    size: &str,
) -> shoe_inventory::Model {
    shoe_inventory::Entity::find()
        .filter(shoe_inventory::Column::ShoeModelId.eq(shoe_model_id))
        .filter(shoe_inventory::Column::Size.eq(size))
        .one(&*ctx.db)
        .await
        .expect("inventory query failed")
        .expect("inventory record missing")
}

/// Persisted line items of an order.
pub async fn order_items_for(ctx: &TestContext, order_id: Uuid) -> Vec<order_item::Model> {
    order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(&*ctx.db)
        .await
        .expect("order item query failed")
}

pub fn line(shoe_model_id: Uuid, size: &str, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        shoe_model_id,
        size: size.to_string(),
        quantity,
    }
}
