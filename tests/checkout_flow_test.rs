//! Checkout: validation, all-or-nothing reservation, price snapshots, and
//! the total invariant.

mod common;

use common::{
    inventory_level, line, order_items_for, seed_address, seed_inventory, seed_model,
    seed_model_with_flags, setup,
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use shoestore_api::{
    entities::order::OrderStatus, errors::ServiceError,
    services::order_number::is_valid_order_number, services::orders::CreateOrderRequest,
};
use uuid::Uuid;

#[tokio::test]
async fn two_line_checkout_creates_a_pending_order() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;

    let model_a = seed_model(&ctx, dec!(50.00)).await;
    let model_b = seed_model(&ctx, dec!(25.50)).await;
    seed_inventory(&ctx, model_a.id, "42", 10, 0).await;
    seed_inventory(&ctx, model_b.id, "38", 5, 0).await;

    let placed = ctx
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderRequest {
                shipping_address_id: address.id,
                items: vec![line(model_a.id, "42", 2), line(model_b.id, "38", 1)],
            },
        )
        .await
        .unwrap();

    assert_eq!(placed.order.status(), Some(OrderStatus::Pending));
    assert_eq!(placed.order.user_id, user_id);
    assert_eq!(placed.items.len(), 2);
    // 2 * 50.00 + 1 * 25.50
    assert_eq!(placed.order.total_amount, dec!(125.50));
    assert!(is_valid_order_number(&placed.order.order_number));

    // Both lines are reserved, none committed.
    let level_a = inventory_level(&ctx, model_a.id, "42").await;
    assert_eq!(level_a.quantity_available, 10);
    assert_eq!(level_a.quantity_reserved, 2);
    let level_b = inventory_level(&ctx, model_b.id, "38").await;
    assert_eq!(level_b.quantity_reserved, 1);

    let stored = order_items_for(&ctx, placed.order.id).await;
    assert_eq!(stored.len(), 2);
    let total: rust_decimal::Decimal = stored.iter().map(|i| i.total_price).sum();
    assert_eq!(total, placed.order.total_amount);
}

#[tokio::test]
async fn failing_second_line_unwinds_the_first_reservation() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;

    let model_a = seed_model(&ctx, dec!(50.00)).await;
    let model_b = seed_model(&ctx, dec!(75.00)).await;
    seed_inventory(&ctx, model_a.id, "42", 5, 0).await;
    seed_inventory(&ctx, model_b.id, "43", 1, 0).await;

    let result = ctx
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderRequest {
                shipping_address_id: address.id,
                items: vec![line(model_a.id, "42", 2), line(model_b.id, "43", 3)],
            },
        )
        .await;

    match result {
        Err(ServiceError::InsufficientStock(message)) => {
            assert!(message.contains("requested 3"), "message: {message}");
            assert!(message.contains("available 1"), "message: {message}");
        }
        other => panic!("expected InsufficientStock, got {:?}", other.map(|p| p.order)),
    }

    // The ledger looks as if the checkout never happened.
    assert_eq!(inventory_level(&ctx, model_a.id, "42").await.quantity_reserved, 0);
    assert_eq!(inventory_level(&ctx, model_b.id, "43").await.quantity_reserved, 0);
}

#[tokio::test]
async fn lost_reservation_race_is_unwound() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;

    let model_a = seed_model(&ctx, dec!(50.00)).await;
    let model_b = seed_model(&ctx, dec!(75.00)).await;
    seed_inventory(&ctx, model_a.id, "42", 5, 0).await;
    seed_inventory(&ctx, model_b.id, "43", 2, 0).await;

    // A competing checkout grabs model B between this request's validation
    // and its reservation; simulate by pre-reserving the stock.
    assert!(ctx
        .services
        .inventory
        .reserve(model_b.id, "43", 2)
        .await
        .unwrap());

    let result = ctx
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderRequest {
                shipping_address_id: address.id,
                items: vec![line(model_a.id, "42", 1), line(model_b.id, "43", 1)],
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::InsufficientStock(_))));
    // Line A's reservation was rolled back; the competitor's still stands.
    assert_eq!(inventory_level(&ctx, model_a.id, "42").await.quantity_reserved, 0);
    assert_eq!(inventory_level(&ctx, model_b.id, "43").await.quantity_reserved, 2);
}

#[tokio::test]
async fn unknown_model_fails_the_whole_checkout() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;

    let model = seed_model(&ctx, dec!(50.00)).await;
    seed_inventory(&ctx, model.id, "42", 5, 0).await;

    let result = ctx
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderRequest {
                shipping_address_id: address.id,
                items: vec![line(model.id, "42", 1), line(Uuid::new_v4(), "42", 1)],
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    // Validation failed before any reservation was made.
    assert_eq!(inventory_level(&ctx, model.id, "42").await.quantity_reserved, 0);
}

#[tokio::test]
async fn inactive_model_or_parent_is_rejected() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;

    let inactive_model = seed_model_with_flags(&ctx, dec!(50.00), false, true).await;
    seed_inventory(&ctx, inactive_model.id, "42", 5, 0).await;
    let inactive_parent = seed_model_with_flags(&ctx, dec!(50.00), true, false).await;
    seed_inventory(&ctx, inactive_parent.id, "42", 5, 0).await;

    for model_id in [inactive_model.id, inactive_parent.id] {
        let result = ctx
            .services
            .orders
            .create_order(
                user_id,
                CreateOrderRequest {
                    shipping_address_id: address.id,
                    items: vec![line(model_id, "42", 1)],
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}

#[tokio::test]
async fn zero_quantity_line_is_rejected() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;
    let model = seed_model(&ctx, dec!(50.00)).await;
    seed_inventory(&ctx, model.id, "42", 5, 0).await;

    let result = ctx
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderRequest {
                shipping_address_id: address.id,
                items: vec![line(model.id, "42", 0)],
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;

    let result = ctx
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderRequest {
                shipping_address_id: address.id,
                items: vec![],
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn foreign_or_unknown_address_is_rejected() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let other_users_address = seed_address(&ctx, Uuid::new_v4()).await;
    let model = seed_model(&ctx, dec!(50.00)).await;
    seed_inventory(&ctx, model.id, "42", 5, 0).await;

    for address_id in [other_users_address.id, Uuid::new_v4()] {
        let result = ctx
            .services
            .orders
            .create_order(
                user_id,
                CreateOrderRequest {
                    shipping_address_id: address_id,
                    items: vec![line(model.id, "42", 1)],
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}

#[tokio::test]
async fn unit_price_is_a_snapshot_of_order_time() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;
    let model = seed_model(&ctx, dec!(80.00)).await;
    seed_inventory(&ctx, model.id, "42", 5, 0).await;

    let placed = ctx
        .services
        .orders
        .create_order(
            user_id,
            CreateOrderRequest {
                shipping_address_id: address.id,
                items: vec![line(model.id, "42", 1)],
            },
        )
        .await
        .unwrap();

    // Reprice the model after the order was placed.
    let mut active: shoestore_api::entities::shoe_model::ActiveModel = model.into();
    active.price = Set(dec!(120.00));
    active.update(&*ctx.db).await.unwrap();

    let items = order_items_for(&ctx, placed.order.id).await;
    assert_eq!(items[0].unit_price, dec!(80.00));
    assert_eq!(items[0].total_price, dec!(80.00));
}

#[tokio::test]
async fn order_numbers_are_seven_digits_and_unique() {
    let ctx = setup().await;
    let user_id = Uuid::new_v4();
    let address = seed_address(&ctx, user_id).await;
    let model = seed_model(&ctx, dec!(50.00)).await;
    seed_inventory(&ctx, model.id, "42", 50, 0).await;

    let mut seen = std::collections::HashSet::new();
    for _ in 0..5 {
        let placed = ctx
            .services
            .orders
            .create_order(
                user_id,
                CreateOrderRequest {
                    shipping_address_id: address.id,
                    items: vec![line(model.id, "42", 1)],
                },
            )
            .await
            .unwrap();
        assert!(is_valid_order_number(&placed.order.order_number));
        assert!(
            seen.insert(placed.order.order_number.clone()),
            "duplicate order number"
        );
    }
}
