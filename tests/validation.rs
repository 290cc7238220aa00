use axum_bookstore_api::{
    error::AppError,
    middleware::auth::{AuthUser, Operation, authorize, ensure_admin},
    models::PaymentMethod,
    routes::params::Pagination,
};
use uuid::Uuid;

fn user(role: &str) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: role.to_string(),
    }
}

#[test]
fn payment_method_parsing() {
    assert_eq!(PaymentMethod::parse("cod").unwrap(), PaymentMethod::Cod);
    assert_eq!(PaymentMethod::parse("UPI").unwrap(), PaymentMethod::Upi);
    assert_eq!(PaymentMethod::parse("Card").unwrap(), PaymentMethod::Card);
    assert_eq!(
        PaymentMethod::parse("net_banking").unwrap(),
        PaymentMethod::NetBanking
    );
    assert!(matches!(
        PaymentMethod::parse("cheque"),
        Err(AppError::BadRequest(_))
    ));
}

#[test]
fn payment_method_transaction_id_requirement() {
    assert!(!PaymentMethod::Cod.requires_transaction_id());
    assert!(PaymentMethod::Upi.requires_transaction_id());
    assert!(PaymentMethod::Card.requires_transaction_id());
    assert!(PaymentMethod::NetBanking.requires_transaction_id());
}

#[test]
fn payment_method_round_trips_as_str() {
    for raw in ["cod", "upi", "card", "net_banking"] {
        assert_eq!(PaymentMethod::parse(raw).unwrap().as_str(), raw);
    }
}

#[test]
fn customer_operations_allowed_for_customer() {
    let customer = user("customer");
    for op in [
        Operation::ManageCart,
        Operation::PlaceOrder,
        Operation::ViewOrder,
        Operation::CancelOrder,
        Operation::MakePayment,
        Operation::AddReview,
    ] {
        assert!(authorize(&customer, op, Some(customer.user_id)).is_ok());
    }
}

#[test]
fn customer_cannot_touch_another_users_resource() {
    let customer = user("customer");
    let result = authorize(&customer, Operation::ViewOrder, Some(Uuid::new_v4()));
    assert!(matches!(result, Err(AppError::Forbidden)));
}

#[test]
fn seller_manages_books_but_not_carts() {
    let seller = user("seller");
    assert!(authorize(&seller, Operation::ManageBook, Some(seller.user_id)).is_ok());
    assert!(matches!(
        authorize(&seller, Operation::ManageCart, Some(seller.user_id)),
        Err(AppError::Forbidden)
    ));
}

#[test]
fn refunds_and_admin_area_are_admin_only() {
    let customer = user("customer");
    let admin = user("admin");

    assert!(matches!(
        authorize(&customer, Operation::ProcessRefund, None),
        Err(AppError::Forbidden)
    ));
    assert!(matches!(ensure_admin(&customer), Err(AppError::Forbidden)));

    assert!(authorize(&admin, Operation::ProcessRefund, None).is_ok());
    assert!(ensure_admin(&admin).is_ok());
}

#[test]
fn admin_bypasses_ownership_checks() {
    let admin = user("admin");
    assert!(authorize(&admin, Operation::ViewOrder, Some(Uuid::new_v4())).is_ok());
}

#[test]
fn pagination_normalization_clamps_inputs() {
    let defaults = Pagination {
        page: None,
        per_page: None,
    };
    assert_eq!(defaults.normalize(), (1, 20, 0));

    let oversized = Pagination {
        page: Some(3),
        per_page: Some(500),
    };
    assert_eq!(oversized.normalize(), (3, 100, 200));

    let negative = Pagination {
        page: Some(-2),
        per_page: Some(0),
    };
    assert_eq!(negative.normalize(), (1, 1, 0));
}
