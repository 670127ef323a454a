use uuid::Uuid;

use axum_marketplace_api::{
    config::AppConfig, db::create_pool, services::auth_service::hash_password,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "change-me-admin", "admin").await?;
    let seller_id = ensure_user(&pool, "atelier", "change-me-seller", "brand").await?;
    let buyer_id = ensure_user(&pool, "buyer", "change-me-buyer", "buyer").await?;

    let brand_id = ensure_brand(&pool, seller_id, "Atelier", "Demo brand").await?;
    seed_products(&pool, brand_id).await?;

    println!("Seed completed. Admin: {admin_id}, seller: {seller_id}, buyer: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (username) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch its id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} (role={role})");
    Ok(user_id)
}

async fn ensure_brand(
    pool: &sqlx::PgPool,
    owner_id: Uuid,
    name: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM brands WHERE owner_id = $1 AND name = $2")
            .bind(owner_id)
            .bind(name)
            .fetch_optional(pool)
            .await?;

    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO brands (id, name, description, owner_id) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(owner_id)
        .execute(pool)
        .await?;

    println!("Created brand {name}");
    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool, brand_id: Uuid) -> anyhow::Result<()> {
    let products = vec![
        ("Canvas Tote", "Everyday carry-all", 450000, 25),
        ("Linen Shirt", "Breathable summer wear", 1250000, 12),
        ("Wool Scarf", "Hand-woven, single batch", 780000, 0),
    ];

    for (title, desc, price, quantity) in products {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE brand_id = $1 AND title = $2")
                .bind(brand_id)
                .bind(title)
                .fetch_optional(pool)
                .await?;
        if existing.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, title, description, price, quantity_available, brand_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(desc)
        .bind(price)
        .bind(quantity)
        .bind(brand_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
