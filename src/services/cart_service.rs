use chrono::DateTime;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartDto, CartLineDto},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Operation, authorize},
    models::{Book, CartItem, book_status},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(FromRow)]
struct CartWithBookRow {
    line_id: Uuid,
    quantity: i32,
    book_id: Uuid,
    seller_id: Uuid,
    title: String,
    author: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    status: String,
    created_at: DateTime<chrono::Utc>,
}

pub async fn list_cart(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartDto>> {
    authorize(user, Operation::ManageCart, None)?;
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, CartWithBookRow>(
        r#"
        SELECT ci.id AS line_id, ci.quantity,
               b.id AS book_id, b.seller_id, b.title, b.author, b.description,
               b.price, b.stock, b.status, b.created_at
        FROM cart_items ci
        JOIN books b ON b.id = ci.book_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    // Derived, never stored: the total always reflects current prices.
    let totals: (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(b.price * ci.quantity), 0)::BIGINT
        FROM cart_items ci
        JOIN books b ON b.id = ci.book_id
        WHERE ci.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| CartLineDto {
            id: row.line_id,
            subtotal: row.price * row.quantity as i64,
            book: Book {
                id: row.book_id,
                seller_id: row.seller_id,
                title: row.title,
                author: row.author,
                description: row.description,
                price: row.price,
                stock: row.stock,
                status: row.status,
                created_at: row.created_at,
            },
            quantity: row.quantity,
        })
        .collect();

    let meta = Meta::new(page, limit, totals.0);
    let data = CartDto {
        items,
        total_amount: totals.1,
    };
    Ok(ApiResponse::success("OK", data, Some(meta)))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    authorize(user, Operation::ManageCart, None)?;
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let book: Option<(i32, String)> =
        sqlx::query_as("SELECT stock, status FROM books WHERE id = $1")
            .bind(payload.book_id)
            .fetch_optional(&state.pool)
            .await?;
    let (stock, status) = match book {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };
    if status != book_status::AVAILABLE {
        return Err(AppError::BadRequest("book is not available".to_string()));
    }
    // Soft check only; the ledger re-validates atomically at checkout.
    if payload.quantity > stock {
        return Err(AppError::BadRequest(format!(
            "quantity exceeds available stock ({stock})"
        )));
    }

    // Replace semantics: re-adding a book overwrites the line's quantity.
    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (user_id, book_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, book_id) DO UPDATE SET quantity = EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.book_id)
    .bind(payload.quantity)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "book_id": payload.book_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    book_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    authorize(user, Operation::ManageCart, None)?;
    let result = sqlx::query("DELETE FROM cart_items WHERE book_id = $1 AND user_id = $2")
        .bind(book_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "book_id": book_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
