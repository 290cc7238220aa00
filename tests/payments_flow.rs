mod common;

use axum_bookstore_api::{
    dto::{
        orders::{OrderItemRequest, PlaceOrderRequest},
        payments::MakePaymentRequest,
    },
    error::AppError,
    models::payment_status,
    services::{order_service, payment_service},
};

use common::{create_book, create_user, setup_state, shipping_address};

#[tokio::test]
async fn payments_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, "seller", "seller@payments.test").await?;
    let customer = create_user(&state, "customer", "customer@payments.test").await?;
    let admin = create_user(&state, "admin", "admin@payments.test").await?;

    let book = create_book(&state, seller.user_id, "Paid in Full", 4500, 10).await?;
    let order = |items: Vec<OrderItemRequest>, method: &str| PlaceOrderRequest {
        shipping_address: shipping_address(),
        payment_method: method.into(),
        items,
    };

    let card_order = order_service::place_order(
        &state,
        &customer,
        order(
            vec![OrderItemRequest {
                book_id: book,
                quantity: 1,
            }],
            "card",
        ),
    )
    .await?
    .data
    .expect("order summary")
    .order;

    // --- card payments must carry a gateway transaction id ---

    let result = payment_service::make_payment(
        &state,
        &customer,
        MakePaymentRequest {
            order_id: card_order.id,
            payment_method: "card".into(),
            transaction_id: None,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::PaymentFailed(_))));

    // The rejected attempt is recorded on the order; a corrected retry
    // below still goes through because no payments row was written.
    let (status,): (String,) =
        sqlx::query_as("SELECT payment_status FROM orders WHERE id = $1")
            .bind(card_order.id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(status, payment_status::FAILED);

    // --- a stranger cannot pay someone else's order ---

    let stranger = create_user(&state, "customer", "stranger@payments.test").await?;
    let result = payment_service::make_payment(
        &state,
        &stranger,
        MakePaymentRequest {
            order_id: card_order.id,
            payment_method: "card".into(),
            transaction_id: Some("txn-0001".into()),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    // --- the happy path records the payment and stamps paid_at ---

    let paid = payment_service::make_payment(
        &state,
        &customer,
        MakePaymentRequest {
            order_id: card_order.id,
            payment_method: "card".into(),
            transaction_id: Some("txn-0001".into()),
        },
    )
    .await?
    .data
    .expect("payment data");
    assert_eq!(paid.payment.payment_status, payment_status::PAID);
    assert_eq!(paid.payment.transaction_id.as_deref(), Some("txn-0001"));
    assert_eq!(paid.order.payment_status, payment_status::PAID);
    assert!(paid.order.paid_at.is_some());

    // --- a second attempt against the same order is rejected ---

    let result = payment_service::make_payment(
        &state,
        &customer,
        MakePaymentRequest {
            order_id: card_order.id,
            payment_method: "card".into(),
            transaction_id: Some("txn-0002".into()),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::PaymentFailed(_))));

    // --- refunds are admin-only ---

    let result = payment_service::process_refund(&state, &customer, card_order.id).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let refunded = payment_service::process_refund(&state, &admin, card_order.id)
        .await?
        .data
        .expect("refund data");
    assert_eq!(refunded.payment.payment_status, payment_status::REFUNDED);
    assert_eq!(refunded.order.payment_status, payment_status::REFUNDED);

    // Already refunded, nothing left to reverse.
    let result = payment_service::process_refund(&state, &admin, card_order.id).await;
    assert!(matches!(result, Err(AppError::PaymentFailed(_))));

    // --- COD settles on delivery and has no electronic reversal ---

    let cod_order = order_service::place_order(
        &state,
        &customer,
        order(
            vec![OrderItemRequest {
                book_id: book,
                quantity: 1,
            }],
            "cod",
        ),
    )
    .await?
    .data
    .expect("order summary")
    .order;
    assert_eq!(cod_order.payment_status, payment_status::COD);

    let cod_paid = payment_service::make_payment(
        &state,
        &customer,
        MakePaymentRequest {
            order_id: cod_order.id,
            payment_method: "cod".into(),
            transaction_id: None,
        },
    )
    .await?
    .data
    .expect("payment data");
    assert_eq!(cod_paid.payment.payment_status, payment_status::COD);
    assert!(cod_paid.order.paid_at.is_none());

    let result = payment_service::process_refund(&state, &admin, cod_order.id).await;
    assert!(matches!(result, Err(AppError::PaymentFailed(_))));

    // --- cancelling a paid order refunds its payment record too ---

    let prepaid = order_service::place_order(
        &state,
        &customer,
        order(
            vec![OrderItemRequest {
                book_id: book,
                quantity: 1,
            }],
            "upi",
        ),
    )
    .await?
    .data
    .expect("order summary")
    .order;
    payment_service::make_payment(
        &state,
        &customer,
        MakePaymentRequest {
            order_id: prepaid.id,
            payment_method: "upi".into(),
            transaction_id: Some("txn-0004".into()),
        },
    )
    .await?;

    let cancelled = order_service::cancel_order(&state, &customer, prepaid.id)
        .await?
        .data
        .expect("cancelled order");
    assert_eq!(cancelled.payment_status, payment_status::REFUNDED);

    let (payment_state,): (String,) =
        sqlx::query_as("SELECT payment_status FROM payments WHERE order_id = $1")
            .bind(prepaid.id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(payment_state, payment_status::REFUNDED);

    // Nothing left for an explicit refund to reverse.
    let result = payment_service::process_refund(&state, &admin, prepaid.id).await;
    assert!(matches!(result, Err(AppError::PaymentFailed(_))));

    // --- cancelled orders are not payable ---

    let doomed = order_service::place_order(
        &state,
        &customer,
        order(
            vec![OrderItemRequest {
                book_id: book,
                quantity: 1,
            }],
            "cod",
        ),
    )
    .await?
    .data
    .expect("order summary")
    .order;
    order_service::cancel_order(&state, &customer, doomed.id).await?;

    let result = payment_service::make_payment(
        &state,
        &customer,
        MakePaymentRequest {
            order_id: doomed.id,
            payment_method: "upi".into(),
            transaction_id: Some("txn-0003".into()),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::PaymentFailed(_))));

    Ok(())
}
