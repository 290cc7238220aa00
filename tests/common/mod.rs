#![allow(dead_code)]

use axum_bookstore_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::ShippingAddressRequest,
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

/// Returns `None` (test should be skipped) when no database is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 5).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE reviews, payments, order_items, orders, addresses, cart_items, books, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState::new(pool, orm)))
}

pub async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let row: (Uuid,) = sqlx::query_as(
        "INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, 'dummy', $3) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(role)
    .fetch_one(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id: row.0,
        role: role.to_string(),
    })
}

pub async fn create_book(
    state: &AppState,
    seller_id: Uuid,
    title: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO books (id, seller_id, title, author, price, stock)
        VALUES ($1, $2, $3, 'Test Author', $4, $5)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(seller_id)
    .bind(title)
    .bind(price)
    .bind(stock)
    .fetch_one(&state.pool)
    .await?;

    Ok(row.0)
}

pub async fn book_stock(state: &AppState, book_id: Uuid) -> anyhow::Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT stock FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(row.0)
}

pub fn shipping_address() -> ShippingAddressRequest {
    ShippingAddressRequest {
        recipient: "Test Buyer".into(),
        line1: "1 Test Street".into(),
        line2: None,
        city: "Testville".into(),
        state: "TS".into(),
        postal_code: "12345".into(),
        country: "IN".into(),
        phone: "5550100".into(),
    }
}
