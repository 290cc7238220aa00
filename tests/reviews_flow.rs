mod common;

use axum_bookstore_api::{
    dto::{
        orders::{OrderItemRequest, PlaceOrderRequest},
        reviews::AddReviewRequest,
    },
    error::AppError,
    routes::params::Pagination,
    services::{order_service, review_service},
};
use uuid::Uuid;

use common::{create_book, create_user, setup_state, shipping_address};

#[tokio::test]
async fn reviews_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, "seller", "seller@reviews.test").await?;
    let buyer = create_user(&state, "customer", "buyer@reviews.test").await?;
    let browser = create_user(&state, "customer", "browser@reviews.test").await?;

    let book = create_book(&state, seller.user_id, "Worth Reviewing", 2100, 10).await?;

    // --- no purchase, no review ---

    let result = review_service::add_review(
        &state,
        &browser,
        book,
        AddReviewRequest {
            rating: 5,
            comment: "Looks great on the shelf".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::PurchaseRequired)));

    order_service::place_order(
        &state,
        &buyer,
        PlaceOrderRequest {
            shipping_address: shipping_address(),
            payment_method: "cod".into(),
            items: vec![OrderItemRequest {
                book_id: book,
                quantity: 1,
            }],
        },
    )
    .await?;

    // --- rating and comment bounds ---

    let result = review_service::add_review(
        &state,
        &buyer,
        book,
        AddReviewRequest {
            rating: 0,
            comment: "Too low".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = review_service::add_review(
        &state,
        &buyer,
        book,
        AddReviewRequest {
            rating: 6,
            comment: "Too high".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = review_service::add_review(
        &state,
        &buyer,
        book,
        AddReviewRequest {
            rating: 4,
            comment: "x".repeat(review_service::MAX_COMMENT_LEN + 1),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // --- one review per buyer per book ---

    let review = review_service::add_review(
        &state,
        &buyer,
        book,
        AddReviewRequest {
            rating: 4,
            comment: "Solid chapters, weak index".into(),
        },
    )
    .await?
    .data
    .expect("review");
    assert_eq!(review.rating, 4);

    let result = review_service::add_review(
        &state,
        &buyer,
        book,
        AddReviewRequest {
            rating: 5,
            comment: "Changed my mind".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::DuplicateReview)));

    // --- listing is public and newest-first ---

    let listed = review_service::list_reviews(
        &state,
        book,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?
    .data
    .expect("review list");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].comment, "Solid chapters, weak index");

    // --- reviewing an unknown book 404s ---

    let result = review_service::add_review(
        &state,
        &buyer,
        Uuid::new_v4(),
        AddReviewRequest {
            rating: 3,
            comment: "Ghost book".into(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound)));

    // --- reporting acknowledges the report ---

    review_service::report_review(&state, &browser, review.id).await?;
    let result = review_service::report_review(&state, &browser, Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::NotFound)));

    Ok(())
}
