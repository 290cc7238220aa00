use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::books::{Column as BookCol, Entity as Books},
    error::{AppError, AppResult},
    models::book_status,
};

/// Atomically reserve `quantity` units of a book's stock on the caller's
/// connection (normally a transaction). The check and the decrement are a
/// single conditional UPDATE, so two concurrent reservations can never
/// both succeed past the available stock. Returns the remaining stock.
pub async fn reserve<C: ConnectionTrait>(
    conn: &C,
    book_id: Uuid,
    quantity: i32,
) -> AppResult<i32> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let result = Books::update_many()
        .col_expr(BookCol::Stock, Expr::col(BookCol::Stock).sub(quantity))
        .filter(BookCol::Id.eq(book_id))
        .filter(BookCol::Status.eq(book_status::AVAILABLE))
        .filter(BookCol::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        // Nothing was decremented; find out which precondition failed.
        let book = Books::find_by_id(book_id).one(conn).await?;
        return Err(match book {
            Some(book) if book.status == book_status::AVAILABLE => {
                AppError::InsufficientStock(book.title)
            }
            _ => AppError::NotFound,
        });
    }

    let book = Books::find_by_id(book_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(book.stock)
}

/// Reverse a successful reservation (order cancellation). The caller must
/// call this at most once per reservation.
pub async fn release<C: ConnectionTrait>(
    conn: &C,
    book_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let result = Books::update_many()
        .col_expr(BookCol::Stock, Expr::col(BookCol::Stock).add(quantity))
        .filter(BookCol::Id.eq(book_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(())
}
