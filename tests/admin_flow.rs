mod common;

use axum_bookstore_api::{
    dto::orders::{OrderItemRequest, PlaceOrderRequest},
    error::AppError,
    models::{book_status, order_status},
    routes::admin::{InventoryAdjustRequest, LowStockQuery, UpdateOrderStatusRequest},
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, order_service},
};

use common::{book_stock, create_book, create_user, setup_state, shipping_address};

fn pagination() -> Pagination {
    Pagination {
        page: None,
        per_page: None,
    }
}

#[tokio::test]
async fn admin_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = create_user(&state, "admin", "admin@admin.test").await?;
    let seller = create_user(&state, "seller", "seller@admin.test").await?;
    let customer = create_user(&state, "customer", "customer@admin.test").await?;

    let book = create_book(&state, seller.user_id, "Back Office Manual", 3200, 8).await?;

    let order = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            shipping_address: shipping_address(),
            payment_method: "cod".into(),
            items: vec![OrderItemRequest {
                book_id: book,
                quantity: 2,
            }],
        },
    )
    .await?
    .data
    .expect("order summary")
    .order;

    // --- the back office is admin-only ---

    let query = || OrderListQuery {
        pagination: pagination(),
        status: None,
        sort_order: None,
    };
    let result = admin_service::list_all_orders(&state, &customer, query()).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let all = admin_service::list_all_orders(&state, &admin, query())
        .await?
        .data
        .expect("order list");
    assert_eq!(all.items.len(), 1);

    let detail = admin_service::get_order_admin(&state, &admin, order.id)
        .await?
        .data
        .expect("order detail");
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 2);

    // --- fulfilment status moves pending -> shipped -> delivered ---

    let shipped = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: order_status::SHIPPED.into(),
        },
    )
    .await?
    .data
    .expect("updated order");
    assert_eq!(shipped.status, order_status::SHIPPED);

    let result = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "misplaced".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // Cancellation is not a status patch; it has its own endpoint.
    let result = admin_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: order_status::CANCELLED.into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // --- a cancelled order is frozen ---

    let other = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            shipping_address: shipping_address(),
            payment_method: "cod".into(),
            items: vec![OrderItemRequest {
                book_id: book,
                quantity: 1,
            }],
        },
    )
    .await?
    .data
    .expect("order summary")
    .order;
    order_service::cancel_order(&state, &customer, other.id).await?;

    let result = admin_service::update_order_status(
        &state,
        &admin,
        other.id,
        UpdateOrderStatusRequest {
            status: order_status::SHIPPED.into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // --- low stock report and manual restock ---

    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            pagination: pagination(),
            threshold: Some(6),
        },
    )
    .await?
    .data
    .expect("low stock list");
    assert_eq!(low.items.len(), 1);
    assert_eq!(low.items[0].stock, 6);
    assert_eq!(low.items[0].status, book_status::AVAILABLE);

    let restocked = admin_service::adjust_inventory(
        &state,
        &admin,
        book,
        InventoryAdjustRequest { delta: 10 },
    )
    .await?
    .data
    .expect("restocked book");
    assert_eq!(restocked.stock, 16);
    assert_eq!(book_stock(&state, book).await?, 16);

    let result = admin_service::adjust_inventory(
        &state,
        &admin,
        book,
        InventoryAdjustRequest { delta: -100 },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result =
        admin_service::adjust_inventory(&state, &admin, book, InventoryAdjustRequest { delta: 0 })
            .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    Ok(())
}
