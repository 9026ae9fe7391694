use rust_decimal::Decimal;
use vendora::db::{
    InventoryError, MovementFilter, NewOrder, NewProduct, OrderError, OrderLine, OrderStatus,
    StatusChange, Store,
};
use vendora::entities::products;

async fn store() -> Store {
    Store::new("sqlite::memory:").await.expect("store")
}

async fn seed_product(store: &Store, price: &str, stock: i32) -> products::Model {
    store
        .create_product(NewProduct {
            name: "Test product".to_string(),
            description: None,
            price: price.parse::<Decimal>().unwrap(),
            stock,
            is_active: true,
            category_id: None,
        })
        .await
        .expect("product")
}

fn single_line(product_id: i32, quantity: i32) -> NewOrder {
    NewOrder {
        user_id: None,
        shipping_address_id: None,
        lines: vec![OrderLine {
            product_id,
            variant_id: None,
            quantity,
        }],
        actor_id: None,
        enforce_active: true,
    }
}

#[tokio::test]
async fn test_order_decrements_stock_and_writes_ledger() {
    let store = store().await;
    let product = seed_product(&store, "100.00", 10).await;

    let details = store.create_order(single_line(product.id, 3)).await.unwrap();

    assert_eq!(details.order.status, "pending");
    assert_eq!(details.order.total_amount, "300.00".parse::<Decimal>().unwrap());
    assert_eq!(details.items.len(), 1);
    assert_eq!(details.items[0].quantity, 3);
    assert_eq!(details.items[0].unit_price, "100.00".parse::<Decimal>().unwrap());
    assert_eq!(details.events.len(), 1);
    assert_eq!(details.events[0].event_type, "created");

    let product = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 7);

    let movements = store
        .inventory_movements_for_order(details.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].change, -3);
    assert_eq!(movements[0].reason, "order");
    assert_eq!(movements[0].product_id, Some(product.id));
}

#[tokio::test]
async fn test_insufficient_stock_aborts_without_side_effects() {
    let store = store().await;
    let product = seed_product(&store, "10.00", 2).await;

    let err = store
        .create_order(single_line(product.id, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock { .. }));

    let product = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 2);

    let movements = store
        .list_inventory_movements(MovementFilter::default(), 0, 50)
        .await
        .unwrap();
    assert!(movements.is_empty());

    let orders = store.list_orders(None, 0, 50).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_multi_line_failure_rolls_back_earlier_lines() {
    let store = store().await;
    let first = seed_product(&store, "10.00", 10).await;
    let second = seed_product(&store, "20.00", 1).await;

    let err = store
        .create_order(NewOrder {
            user_id: None,
            shipping_address_id: None,
            lines: vec![
                OrderLine {
                    product_id: first.id,
                    variant_id: None,
                    quantity: 4,
                },
                OrderLine {
                    product_id: second.id,
                    variant_id: None,
                    quantity: 3,
                },
            ],
            actor_id: None,
            enforce_active: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock { .. }));

    // The first line's decrement must not survive the rollback
    let first = store.get_product(first.id).await.unwrap().unwrap();
    assert_eq!(first.stock, 10);
}

#[tokio::test]
async fn test_zero_quantity_is_rejected() {
    let store = store().await;
    let product = seed_product(&store, "10.00", 5).await;

    let err = store
        .create_order(single_line(product.id, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidQuantity(0)));
}

#[tokio::test]
async fn test_empty_order_is_rejected() {
    let store = store().await;

    let err = store
        .create_order(NewOrder {
            user_id: None,
            shipping_address_id: None,
            lines: vec![],
            actor_id: None,
            enforce_active: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::EmptyOrder));
}

#[tokio::test]
async fn test_inactive_product_rejected_unless_privileged() {
    let store = store().await;
    let product = seed_product(&store, "10.00", 5).await;
    store
        .update_product(
            product.id,
            vendora::db::ProductUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = store
        .create_order(single_line(product.id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InactiveProduct(_)));

    let mut privileged = single_line(product.id, 1);
    privileged.enforce_active = false;
    let details = store.create_order(privileged).await.unwrap();
    assert_eq!(details.items.len(), 1);
}

#[tokio::test]
async fn test_variant_price_override_wins() {
    let store = store().await;
    let product = seed_product(&store, "100.00", 10).await;

    let variant = store
        .create_variant(vendora::db::NewVariant {
            product_id: product.id,
            sku: Some("RED-L".to_string()),
            name: "Red / Large".to_string(),
            attributes: None,
            price_override: Some("80.00".parse().unwrap()),
            stock: 4,
            is_active: true,
        })
        .await
        .unwrap();

    let details = store
        .create_order(NewOrder {
            user_id: None,
            shipping_address_id: None,
            lines: vec![OrderLine {
                product_id: product.id,
                variant_id: Some(variant.id),
                quantity: 2,
            }],
            actor_id: None,
            enforce_active: true,
        })
        .await
        .unwrap();

    assert_eq!(details.items[0].unit_price, "80.00".parse::<Decimal>().unwrap());
    assert_eq!(details.order.total_amount, "160.00".parse::<Decimal>().unwrap());

    // Variant stock decremented, product stock untouched
    let variant = store.get_variant(variant.id).await.unwrap().unwrap();
    assert_eq!(variant.stock, 2);
    let product = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 10);

    let movements = store
        .inventory_movements_for_order(details.order.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].variant_id, Some(variant.id));
    assert_eq!(movements[0].change, -2);
}

#[tokio::test]
async fn test_variant_mismatch_is_rejected() {
    let store = store().await;
    let product = seed_product(&store, "10.00", 5).await;
    let other = seed_product(&store, "20.00", 5).await;

    let variant = store
        .create_variant(vendora::db::NewVariant {
            product_id: other.id,
            sku: None,
            name: "Stray".to_string(),
            attributes: None,
            price_override: None,
            stock: 5,
            is_active: true,
        })
        .await
        .unwrap();

    let err = store
        .create_order(NewOrder {
            user_id: None,
            shipping_address_id: None,
            lines: vec![OrderLine {
                product_id: product.id,
                variant_id: Some(variant.id),
                quantity: 1,
            }],
            actor_id: None,
            enforce_active: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::VariantMismatch { .. }));
}

#[tokio::test]
async fn test_status_transition_appends_exactly_one_event() {
    let store = store().await;
    let product = seed_product(&store, "100.00", 10).await;
    let details = store.create_order(single_line(product.id, 1)).await.unwrap();
    let order_id = details.order.id;

    let updated = store
        .update_order_status(
            order_id,
            StatusChange {
                status: OrderStatus::Paid,
                carrier: None,
                tracking_number: None,
                actor_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.order.status, "paid");
    assert_eq!(updated.events.len(), 2);
    assert_eq!(updated.events[1].event_type, "paid");

    // Item prices never change with status
    assert_eq!(
        updated.items[0].unit_price,
        "100.00".parse::<Decimal>().unwrap()
    );

    // Same-status update appends nothing
    let unchanged = store
        .update_order_status(
            order_id,
            StatusChange {
                status: OrderStatus::Paid,
                carrier: None,
                tracking_number: None,
                actor_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.events.len(), 2);
}

#[tokio::test]
async fn test_shipped_and_delivered_stamp_timestamps_once() {
    let store = store().await;
    let product = seed_product(&store, "10.00", 5).await;
    let details = store.create_order(single_line(product.id, 1)).await.unwrap();
    let order_id = details.order.id;

    let shipped = store
        .update_order_status(
            order_id,
            StatusChange {
                status: OrderStatus::Shipped,
                carrier: Some("DHL".to_string()),
                tracking_number: Some("TRACK-1".to_string()),
                actor_id: None,
            },
        )
        .await
        .unwrap();
    let first_stamp = shipped.order.shipped_at.clone().unwrap();
    assert_eq!(shipped.order.carrier.as_deref(), Some("DHL"));

    // Leaving and re-entering "shipped" keeps the original stamp
    store
        .update_order_status(
            order_id,
            StatusChange {
                status: OrderStatus::Delivered,
                carrier: None,
                tracking_number: None,
                actor_id: None,
            },
        )
        .await
        .unwrap();
    let reshipped = store
        .update_order_status(
            order_id,
            StatusChange {
                status: OrderStatus::Shipped,
                carrier: None,
                tracking_number: None,
                actor_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(reshipped.order.shipped_at.as_deref(), Some(first_stamp.as_str()));
    assert!(reshipped.order.delivered_at.is_some());
}

#[tokio::test]
async fn test_price_snapshot_survives_product_price_change() {
    let store = store().await;
    let product = seed_product(&store, "100.00", 10).await;
    let details = store.create_order(single_line(product.id, 2)).await.unwrap();

    store
        .update_product(
            product.id,
            vendora::db::ProductUpdate {
                price: Some("999.00".parse().unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let reloaded = store
        .get_order_details(details.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        reloaded.items[0].unit_price,
        "100.00".parse::<Decimal>().unwrap()
    );
    assert_eq!(
        reloaded.order.total_amount,
        "200.00".parse::<Decimal>().unwrap()
    );
}

#[tokio::test]
async fn test_manual_adjustment_guards_negative_stock() {
    let store = store().await;
    let product = seed_product(&store, "10.00", 3).await;

    let err = store
        .adjust_product_stock(product.id, -5, "damage", None)
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::NegativeStock { .. }));

    // Nothing was written
    let product_row = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(product_row.stock, 3);
    let movements = store
        .list_inventory_movements(MovementFilter::default(), 0, 50)
        .await
        .unwrap();
    assert!(movements.is_empty());

    let movement = store
        .adjust_product_stock(product.id, 5, "restock", Some("weekly delivery"))
        .await
        .unwrap();
    assert_eq!(movement.change, 5);
    assert_eq!(movement.reason, "restock");

    let product_row = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(product_row.stock, 8);
}

#[tokio::test]
async fn test_low_stock_report() {
    let store = store().await;
    seed_product(&store, "10.00", 2).await;
    seed_product(&store, "10.00", 50).await;

    let low = store.low_stock_products(10).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].stock, 2);
}
