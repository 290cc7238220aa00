mod common;

use axum_bookstore_api::{
    dto::books::{CreateBookRequest, UpdateBookRequest},
    error::AppError,
    models::book_status,
    services::book_service,
};

use common::{book_stock, create_user, setup_state};

fn no_changes() -> UpdateBookRequest {
    UpdateBookRequest {
        title: None,
        author: None,
        description: None,
        price: None,
        stock: None,
        status: None,
    }
}

#[tokio::test]
async fn books_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, "seller", "seller@books.test").await?;
    let rival_seller = create_user(&state, "seller", "rival@books.test").await?;

    let book = book_service::create_book(
        &state,
        &seller,
        CreateBookRequest {
            title: "Listing Under Test".into(),
            author: "A. Writer".into(),
            description: None,
            price: 2750,
            stock: 3,
        },
    )
    .await?
    .data
    .expect("created book");
    assert_eq!(book.status, book_status::AVAILABLE);

    // --- only the owning seller may edit a listing ---

    let result = book_service::update_book(&state, &rival_seller, book.id, no_changes()).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    // --- restocking goes through the locked update path ---

    let updated = book_service::update_book(
        &state,
        &seller,
        book.id,
        UpdateBookRequest {
            stock: Some(12),
            price: Some(2500),
            ..no_changes()
        },
    )
    .await?
    .data
    .expect("updated book");
    assert_eq!(updated.stock, 12);
    assert_eq!(updated.price, 2500);
    assert_eq!(book_stock(&state, book.id).await?, 12);

    // --- field validation ---

    let result = book_service::update_book(
        &state,
        &seller,
        book.id,
        UpdateBookRequest {
            price: Some(-1),
            ..no_changes()
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = book_service::update_book(
        &state,
        &seller,
        book.id,
        UpdateBookRequest {
            status: Some("remaindered".into()),
            ..no_changes()
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // --- delete is owner-gated too ---

    let result = book_service::delete_book(&state, &rival_seller, book.id).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    book_service::delete_book(&state, &seller, book.id).await?;
    let result = book_service::get_book(&state, book.id).await;
    assert!(matches!(result, Err(AppError::NotFound)));

    Ok(())
}
