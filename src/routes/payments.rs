use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::payments::{MakePaymentRequest, PaymentDto},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(make_payment))
        .route("/{order_id}/refund", post(process_refund))
}

#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = MakePaymentRequest,
    responses(
        (status = 200, description = "Record a payment", body = ApiResponse<PaymentDto>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Payment failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn make_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MakePaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentDto>>> {
    let resp = payment_service::make_payment(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/{order_id}/refund",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Refund a paid order", body = ApiResponse<PaymentDto>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Refund not possible"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn process_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentDto>>> {
    let resp = payment_service::process_refund(&state, &user, order_id).await?;
    Ok(Json(resp))
}
