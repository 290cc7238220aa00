use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_bookstore_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let seller_id = ensure_user(&pool, "seller@example.com", "seller123", "seller").await?;
    let customer_id = ensure_user(&pool, "customer@example.com", "customer123", "customer").await?;
    seed_books(&pool, seller_id).await?;

    println!(
        "Seed completed. Admin: {admin_id}, Seller: {seller_id}, Customer: {customer_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn seed_books(pool: &sqlx::PgPool, seller_id: Uuid) -> anyhow::Result<()> {
    let books = vec![
        ("The Rust Programming Language", "Klabnik & Nichols", 4599_i64, 40),
        ("Programming Rust", "Blandy, Orendorff & Tindall", 5299, 25),
        ("Rust for Rustaceans", "Jon Gjengset", 3999, 30),
        ("Zero To Production In Rust", "Luca Palmieri", 4499, 15),
    ];

    for (title, author, price, stock) in books {
        sqlx::query(
            r#"
            INSERT INTO books (id, seller_id, title, author, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(title)
        .bind(author)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded books");
    Ok(())
}
