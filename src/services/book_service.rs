use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::books::{BookList, CreateBookRequest, UpdateBookRequest},
    entity::books::{ActiveModel, Column, Entity as Books, Model as BookModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Operation, authorize},
    models::{Book, book_status},
    response::{ApiResponse, Meta},
    routes::params::{BookQuery, BookSortBy, SortOrder},
    state::AppState,
};

pub async fn list_books(state: &AppState, query: BookQuery) -> AppResult<ApiResponse<BookList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Author).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(BookSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        BookSortBy::CreatedAt => Column::CreatedAt,
        BookSortBy::Price => Column::Price,
        BookSortBy::Title => Column::Title,
    };

    let mut finder = Books::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(book_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = BookList { items };
    Ok(ApiResponse::success("Books", data, Some(meta)))
}

pub async fn get_book(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Book>> {
    let result = Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(book_from_entity);
    let result = match result {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Book", result, None))
}

pub async fn create_book(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    authorize(user, Operation::ManageBook, None)?;
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        seller_id: Set(user.user_id),
        title: Set(payload.title),
        author: Set(payload.author),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        status: Set(book_status::AVAILABLE.to_string()),
        created_at: NotSet,
    };
    let book = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "book_create",
        Some("books"),
        Some(serde_json::json!({ "book_id": book.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Book created",
        book_from_entity(book),
        Some(Meta::empty()),
    ))
}

pub async fn update_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    // Lock the row so a stock overwrite cannot race a concurrent
    // reservation out of its decrement.
    let txn = state.orm.begin().await?;
    let existing = Books::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };
    // Only the owning seller (or an admin) may touch a listing.
    authorize(user, Operation::ManageBook, Some(existing.seller_id))?;

    if let Some(status) = payload.status.as_deref() {
        validate_book_status(status)?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(author) = payload.author {
        active.author = Set(author);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("stock must not be negative".into()));
        }
        active.stock = Set(stock);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }

    let book = active.update(&txn).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "book_update",
        Some("books"),
        Some(serde_json::json!({ "book_id": book.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        book_from_entity(book),
        Some(Meta::empty()),
    ))
}

pub async fn delete_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Books::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };
    authorize(user, Operation::ManageBook, Some(existing.seller_id))?;

    Books::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "book_delete",
        Some("books"),
        Some(serde_json::json!({ "book_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_book_status(status: &str) -> Result<(), AppError> {
    const VALID: [&str; 2] = [book_status::AVAILABLE, book_status::SOLD];
    if VALID.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid book status".into()))
    }
}

fn book_from_entity(model: BookModel) -> Book {
    Book {
        id: model.id,
        seller_id: model.seller_id,
        title: model.title,
        author: model.author,
        description: model.description,
        price: model.price,
        stock: model.stock,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
