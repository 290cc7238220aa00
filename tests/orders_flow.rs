mod common;

use axum_bookstore_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{OrderItemRequest, PlaceOrderRequest},
    },
    error::AppError,
    models::{order_status, payment_status},
    routes::params::{OrderListQuery, Pagination},
    services::{cart_service, order_service},
};

use common::{book_stock, create_book, create_user, setup_state, shipping_address};

fn pagination() -> Pagination {
    Pagination {
        page: None,
        per_page: None,
    }
}

#[tokio::test]
async fn orders_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, "seller", "seller@orders.test").await?;
    let customer = create_user(&state, "customer", "customer@orders.test").await?;

    // --- cart: re-adding a book replaces the line quantity ---

    let guide = create_book(&state, seller.user_id, "The Field Guide", 1999, 10).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            book_id: guide,
            quantity: 2,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            book_id: guide,
            quantity: 5,
        },
    )
    .await?;

    let cart = cart_service::list_cart(&state, &customer, pagination())
        .await?
        .data
        .expect("cart data");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.total_amount, 5 * 1999);

    // --- empty orders list is an empty page, not an error ---

    let orders = order_service::list_my_orders(
        &state,
        &customer,
        OrderListQuery {
            pagination: pagination(),
            status: None,
            sort_order: None,
        },
    )
    .await?
    .data
    .expect("order list");
    assert!(orders.items.is_empty());

    // --- COD checkout consumes the cart ---

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            book_id: guide,
            quantity: 2,
        },
    )
    .await?;

    let placed = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            shipping_address: shipping_address(),
            payment_method: "cod".into(),
            items: vec![],
        },
    )
    .await?
    .data
    .expect("order summary");

    assert_eq!(placed.order.total_amount, 2 * 1999);
    assert_eq!(placed.order.status, order_status::PENDING);
    assert_eq!(placed.order.payment_status, payment_status::COD);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].unit_price, 1999);
    assert_eq!(placed.shipping_address.recipient, "Test Buyer");
    assert_eq!(book_stock(&state, guide).await?, 8);

    let cart = cart_service::list_cart(&state, &customer, pagination())
        .await?
        .data
        .expect("cart data");
    assert!(cart.items.is_empty());

    // --- unit price is a snapshot, later catalog changes do not leak in ---

    sqlx::query("UPDATE books SET price = 9999 WHERE id = $1")
        .bind(guide)
        .execute(&state.pool)
        .await?;

    let fetched = order_service::get_order(&state, &customer, placed.order.id)
        .await?
        .data
        .expect("order with items");
    assert_eq!(fetched.items[0].unit_price, 1999);
    assert_eq!(fetched.order.total_amount, 2 * 1999);

    // --- a multi-line order either fully commits or fully rolls back ---

    let plenty = create_book(&state, seller.user_id, "Plenty in Stock", 1500, 5).await?;
    let scarce = create_book(&state, seller.user_id, "Nearly Gone", 2500, 1).await?;

    let result = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            shipping_address: shipping_address(),
            payment_method: "cod".into(),
            items: vec![
                OrderItemRequest {
                    book_id: plenty,
                    quantity: 1,
                },
                OrderItemRequest {
                    book_id: scarce,
                    quantity: 2,
                },
            ],
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::InsufficientStock(_))));
    assert_eq!(book_stock(&state, plenty).await?, 5);
    assert_eq!(book_stock(&state, scarce).await?, 1);

    // --- ordering with an empty cart and no explicit items is rejected ---

    let result = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            shipping_address: shipping_address(),
            payment_method: "cod".into(),
            items: vec![],
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // --- two buyers racing for the same stock cannot oversell ---

    let contested = create_book(&state, seller.user_id, "Contested Copy", 3000, 5).await?;
    let rival = create_user(&state, "customer", "rival@orders.test").await?;

    let request = |buyer_note: &str| PlaceOrderRequest {
        shipping_address: {
            let mut addr = shipping_address();
            addr.recipient = buyer_note.to_string();
            addr
        },
        payment_method: "cod".into(),
        items: vec![OrderItemRequest {
            book_id: contested,
            quantity: 3,
        }],
    };

    let (first, second) = tokio::join!(
        order_service::place_order(&state, &customer, request("First Buyer")),
        order_service::place_order(&state, &rival, request("Second Buyer")),
    );

    let succeeded = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(succeeded, 1, "exactly one racing order may win");
    let loser = if first.is_err() { first } else { second };
    assert!(matches!(loser, Err(AppError::InsufficientStock(_))));
    assert_eq!(book_stock(&state, contested).await?, 2);

    // --- cancelling a pending order returns stock ---

    let cancelled = order_service::cancel_order(&state, &customer, placed.order.id)
        .await?
        .data
        .expect("cancelled order");
    assert_eq!(cancelled.status, order_status::CANCELLED);
    assert_eq!(book_stock(&state, guide).await?, 10);

    let result = order_service::cancel_order(&state, &customer, placed.order.id).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // --- customers cannot read each other's orders ---

    let result = order_service::get_order(&state, &rival, placed.order.id).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    Ok(())
}
