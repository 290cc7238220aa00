use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{OrderList, OrderSummary, OrderWithItems, PlaceOrderRequest},
    entity::{
        addresses::{ActiveModel as AddressActive, Model as AddressModel},
        cart_items::{Column as CartCol, Entity as CartItems},
        books::Entity as Books,
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Operation, authorize},
    models::{Address, Order, OrderItem, PaymentMethod, order_status, payment_status},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::inventory_service,
    state::AppState,
};

/// Convert a cart (or an explicit item list) into a persisted order.
///
/// Everything runs in one transaction: the address snapshot, every stock
/// reservation, the order row and its items either all commit or none do.
/// Dropping the transaction on an early error rolls all of it back.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderSummary>> {
    authorize(user, Operation::PlaceOrder, None)?;
    let method = PaymentMethod::parse(&payload.payment_method)?;

    let txn = state.orm.begin().await?;

    let from_cart = payload.items.is_empty();
    let requested: Vec<(Uuid, i32)> = if from_cart {
        CartItems::find()
            .filter(CartCol::UserId.eq(user.user_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|line| (line.book_id, line.quantity))
            .collect()
    } else {
        payload
            .items
            .iter()
            .map(|item| (item.book_id, item.quantity))
            .collect()
    };

    if requested.is_empty() {
        return Err(AppError::BadRequest("No items to order".to_string()));
    }

    let shipping = payload.shipping_address;
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        recipient: Set(shipping.recipient),
        line1: Set(shipping.line1),
        line2: Set(shipping.line2),
        city: Set(shipping.city),
        state: Set(shipping.state),
        postal_code: Set(shipping.postal_code),
        country: Set(shipping.country),
        phone: Set(shipping.phone),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let order_id = Uuid::new_v4();
    let mut total_amount: i64 = 0;
    let mut item_actives: Vec<OrderItemActive> = Vec::with_capacity(requested.len());

    for (book_id, quantity) in &requested {
        let book = Books::find_by_id(*book_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        // Authoritative stock check; fails the whole order on shortage.
        inventory_service::reserve(&txn, book.id, *quantity).await?;

        total_amount += book.price * (*quantity as i64);
        item_actives.push(OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            book_id: Set(book.id),
            seller_id: Set(book.seller_id),
            quantity: Set(*quantity),
            unit_price: Set(book.price),
            created_at: NotSet,
        });
    }

    // COD stays pending on the payment side; prepaid methods are marked
    // paid optimistically and confirmed by the payment endpoint.
    let initial_payment_status = match method {
        PaymentMethod::Cod => payment_status::COD,
        _ => payment_status::PAID,
    };

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        address_id: Set(address.id),
        total_amount: Set(total_amount),
        status: Set(order_status::PENDING.to_string()),
        payment_status: Set(initial_payment_status.to_string()),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(item_actives.len());
    for active in item_actives {
        let item = active.insert(&txn).await?;
        order_items.push(order_item_from_entity(item));
    }

    if from_cart {
        CartItems::delete_many()
            .filter(CartCol::UserId.eq(user.user_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_placed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderSummary {
            order: order_from_entity(order),
            items: order_items,
            shipping_address: address_from_entity(address),
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Operation::ViewOrder, Some(user.user_id))?;
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    // No orders yet is an ordinary empty page, not an error.
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    authorize(user, Operation::ViewOrder, Some(order.user_id))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Cancel a pending order, returning every reserved unit to stock.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    authorize(user, Operation::CancelOrder, Some(order.user_id))?;

    if order.status != order_status::PENDING {
        return Err(AppError::BadRequest(format!(
            "only pending orders can be cancelled (current: {})",
            order.status
        )));
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    for item in &items {
        inventory_service::release(&txn, item.book_id, item.quantity).await?;
    }

    let was_paid = order.payment_status == payment_status::PAID;
    if was_paid {
        // Keep the payment record in step with the order it belongs to.
        if let Some(payment) = Payments::find()
            .filter(PaymentCol::OrderId.eq(order.id))
            .one(&txn)
            .await?
        {
            let mut payment_active: PaymentActive = payment.into();
            payment_active.payment_status = Set(payment_status::REFUNDED.to_string());
            payment_active.update(&txn).await?;
        }
    }
    let mut active: OrderActive = order.into();
    active.status = Set(order_status::CANCELLED.to_string());
    if was_paid {
        active.payment_status = Set(payment_status::REFUNDED.to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_cancelled",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order cancelled",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
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

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        book_id: model.book_id,
        seller_id: model.seller_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn address_from_entity(model: AddressModel) -> Address {
    Address {
        id: model.id,
        user_id: model.user_id,
        recipient: model.recipient,
        line1: model.line1,
        line2: model.line2,
        city: model.city,
        state: model.state,
        postal_code: model.postal_code,
        country: model.country,
        phone: model.phone,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
