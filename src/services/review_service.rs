use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::reviews::{AddReviewRequest, ReviewList},
    entity::{
        books::Entity as Books,
        order_items,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::Column as OrderCol,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews,
            Model as ReviewModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Operation, authorize},
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub const MAX_COMMENT_LEN: usize = 500;

/// Reviews are gated on proof of purchase: the customer must have at
/// least one order line for the book, and may review each book once.
pub async fn add_review(
    state: &AppState,
    user: &AuthUser,
    book_id: Uuid,
    payload: AddReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    authorize(user, Operation::AddReview, None)?;

    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    if payload.comment.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::BadRequest(format!(
            "comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }

    let book = Books::find_by_id(book_id).one(&state.orm).await?;
    if book.is_none() {
        return Err(AppError::NotFound);
    }

    let purchases = OrderItems::find()
        .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
        .filter(OrderItemCol::BookId.eq(book_id))
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    if purchases == 0 {
        return Err(AppError::PurchaseRequired);
    }

    let existing = Reviews::find()
        .filter(ReviewCol::BookId.eq(book_id))
        .filter(ReviewCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::DuplicateReview);
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        book_id: Set(book_id),
        user_id: Set(user.user_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_added",
        Some("reviews"),
        Some(serde_json::json!({ "book_id": book_id, "rating": review.rating })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review added",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

pub async fn list_reviews(
    state: &AppState,
    book_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let book = Books::find_by_id(book_id).one(&state.orm).await?;
    if book.is_none() {
        return Err(AppError::NotFound);
    }

    let (page, limit, offset) = pagination.normalize();
    let finder = Reviews::find()
        .filter(ReviewCol::BookId.eq(book_id))
        .order_by_desc(ReviewCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Reviews", ReviewList { items }, Some(meta)))
}

/// Placeholder: reports are acknowledged and audit-logged, nothing more.
pub async fn report_review(
    state: &AppState,
    user: &AuthUser,
    review_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let review = Reviews::find_by_id(review_id).one(&state.orm).await?;
    if review.is_none() {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_reported",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review reported",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        book_id: model.book_id,
        user_id: model.user_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
