use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{MakePaymentRequest, PaymentDto},
    entity::{
        orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments,
            Model as PaymentModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Operation, authorize},
    models::{Order, Payment, PaymentMethod, order_status, payment_status},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Record a payment for a pending order.
///
/// The order row is locked for the duration of the transaction, so two
/// concurrent attempts serialize: the first inserts the Payment, the
/// second finds it and is rejected as already processed.
pub async fn make_payment(
    state: &AppState,
    user: &AuthUser,
    payload: MakePaymentRequest,
) -> AppResult<ApiResponse<PaymentDto>> {
    let method = PaymentMethod::parse(&payload.payment_method)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    authorize(user, Operation::MakePayment, Some(order.user_id))?;

    if order.status != order_status::PENDING {
        return Err(AppError::PaymentFailed(format!(
            "order is not payable (status: {})",
            order.status
        )));
    }

    let existing = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::PaymentFailed(
            "payment already processed for this order".to_string(),
        ));
    }

    if method.requires_transaction_id() && payload.transaction_id.is_none() {
        // Record the failed attempt on the order; no payments row is
        // written, so a corrected retry can still succeed.
        let mut active: OrderActive = order.into();
        active.payment_status = Set(payment_status::FAILED.to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
        txn.commit().await?;
        return Err(AppError::PaymentFailed(format!(
            "transaction id is required for {}",
            method.as_str()
        )));
    }

    let new_status = match method {
        PaymentMethod::Cod => payment_status::COD,
        _ => payment_status::PAID,
    };

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        payment_method: Set(method.as_str().to_string()),
        payment_status: Set(new_status.to_string()),
        transaction_id: Set(payload.transaction_id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut active: OrderActive = order.into();
    active.payment_status = Set(new_status.to_string());
    if new_status == payment_status::PAID {
        active.paid_at = Set(Some(Utc::now().into()));
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_recorded",
        Some("payments"),
        Some(serde_json::json!({ "order_id": order.id, "method": method.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment recorded",
        PaymentDto {
            payment: payment_from_entity(payment),
            order: order_from_entity(order),
        },
        Some(Meta::empty()),
    ))
}

/// Reverse an electronic payment. COD has no reversal path and must be
/// settled manually.
pub async fn process_refund(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<PaymentDto>> {
    authorize(user, Operation::ProcessRefund, None)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if payment.payment_method == PaymentMethod::Cod.as_str() {
        return Err(AppError::PaymentFailed(
            "manual refund required: cash on delivery has no electronic reversal".to_string(),
        ));
    }
    if order.payment_status != payment_status::PAID {
        return Err(AppError::PaymentFailed(format!(
            "only paid orders can be refunded (payment status: {})",
            order.payment_status
        )));
    }

    let mut payment_active: PaymentActive = payment.into();
    payment_active.payment_status = Set(payment_status::REFUNDED.to_string());
    let payment = payment_active.update(&txn).await?;

    let mut order_active: OrderActive = order.into();
    order_active.payment_status = Set(payment_status::REFUNDED.to_string());
    order_active.updated_at = Set(Utc::now().into());
    let order = order_active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_refunded",
        Some("payments"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Refund processed",
        PaymentDto {
            payment: payment_from_entity(payment),
            order: order_from_entity(order),
        },
        Some(Meta::empty()),
    ))
}

fn payment_from_entity(model: PaymentModel) -> Payment {
    Payment {
        id: model.id,
        order_id: model.order_id,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        transaction_id: model.transaction_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        address_id: model.address_id,
        total_amount: model.total_amount,
        status: model.status,
        payment_status: model.payment_status,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
