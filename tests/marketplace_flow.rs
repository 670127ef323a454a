use uuid::Uuid;

use axum_marketplace_api::{
    db::{create_orm_conn, create_pool},
    dto::auth::{LoginRequest, RegisterRequest},
    dto::cart::AddToCartRequest,
    dto::catalog::{CreateBrandForm, CreateProductForm, UpdateProductForm},
    error::AppError,
    middleware::auth::{AuthUser, lookup_session},
    models::{Brand, Product, Role},
    routes::params::{PriceSort, ProductQuery},
    services::{auth_service, brand_service, cart_service, product_service},
    state::AppState,
    uploads::UploadStore,
};

// Service-level flows against a real database. Set TEST_DATABASE_URL or
// DATABASE_URL to run them; without one each test skips with a notice.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run marketplace flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;
    let uploads =
        UploadStore::open(&std::env::temp_dir().join(format!("marketplace-test-{}", Uuid::new_v4())))
            .await?;

    Ok(Some(AppState { pool, orm, uploads }))
}

async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let username = format!("{}-{}", role, Uuid::new_v4());
    let password_hash = auth_service::hash_password("a strong password")
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, username, password_hash, role) VALUES ($1, $2, $3, $4)")
        .bind(user_id)
        .bind(&username)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(&state.pool)
        .await?;

    Ok(AuthUser {
        user_id,
        username,
        role,
        session_token: Uuid::new_v4(),
    })
}

async fn create_brand(state: &AppState, seller: &AuthUser, name: &str) -> anyhow::Result<Brand> {
    let resp = brand_service::create_brand(
        state,
        seller,
        CreateBrandForm {
            name: name.to_string(),
            description: Some("integration test brand".into()),
            logo: None,
        },
    )
    .await?;
    Ok(resp.data.expect("brand payload"))
}

async fn create_product(
    state: &AppState,
    seller: &AuthUser,
    brand_id: Uuid,
    title: &str,
    price: i64,
    quantity: i32,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        seller,
        CreateProductForm {
            title: title.to_string(),
            description: None,
            price,
            quantity_available: quantity,
            brand_id,
            image: None,
        },
    )
    .await?;
    Ok(resp.data.expect("product payload"))
}

#[tokio::test]
async fn register_login_logout_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let username = format!("user-{}", Uuid::new_v4());

    // Weak password is a validation failure.
    let weak = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: username.clone(),
            password: "short".into(),
        },
    )
    .await;
    assert!(matches!(weak, Err(AppError::BadRequest(_))));

    let registered = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: username.clone(),
            password: "a strong password".into(),
        },
    )
    .await?;
    assert_eq!(registered.data.unwrap().role, Role::Buyer);

    // Duplicate usernames are rejected.
    let duplicate = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: username.clone(),
            password: "another password".into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    // Wrong password fails, right one yields a working session token.
    let wrong = auth_service::login_user(
        &state.pool,
        LoginRequest {
            username: username.clone(),
            password: "not the password".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let login = auth_service::login_user(
        &state.pool,
        LoginRequest {
            username: username.clone(),
            password: "a strong password".into(),
        },
    )
    .await?;
    let token = login.data.unwrap().token;

    let session_user = lookup_session(&state.pool, token).await?;
    assert_eq!(session_user.username, username);
    assert_eq!(session_user.role, Role::Buyer);

    auth_service::logout_user(&state.pool, &session_user).await?;
    let after_logout = lookup_session(&state.pool, token).await;
    assert!(matches!(after_logout, Err(AppError::Unauthorized)));

    Ok(())
}

#[tokio::test]
async fn listing_sinks_out_of_stock_products() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, Role::Brand).await?;
    let brand = create_brand(&state, &seller, &format!("Sorted-{}", Uuid::new_v4())).await?;

    let cheap = create_product(&state, &seller, brand.id, "Cheap", 100, 5).await?;
    let sold_out = create_product(&state, &seller, brand.id, "SoldOut", 50, 0).await?;
    let pricey = create_product(&state, &seller, brand.id, "Pricey", 200, 3).await?;

    let list = |sort_price| {
        product_service::list_products(
            &state,
            ProductQuery {
                brand: Some(brand.id),
                search: None,
                sort_price,
            },
        )
    };

    // Ascending price, yet the sold-out product comes last despite being
    // the cheapest.
    let asc = list(Some(PriceSort::Asc)).await?.data.unwrap().items;
    let asc_ids: Vec<Uuid> = asc.iter().map(|p| p.id).collect();
    assert_eq!(asc_ids, vec![cheap.id, pricey.id, sold_out.id]);

    let desc = list(Some(PriceSort::Desc)).await?.data.unwrap().items;
    let desc_ids: Vec<Uuid> = desc.iter().map(|p| p.id).collect();
    assert_eq!(desc_ids, vec![pricey.id, cheap.id, sold_out.id]);

    // No price sort: in-stock products still precede the sold-out one.
    let plain = list(None).await?.data.unwrap().items;
    assert_eq!(plain.len(), 3);
    assert_eq!(plain.last().unwrap().id, sold_out.id);

    // Title search composes with the brand filter.
    let searched = product_service::list_products(
        &state,
        ProductQuery {
            brand: Some(brand.id),
            search: Some("price".into()),
            sort_price: None,
        },
    )
    .await?
    .data
    .unwrap()
    .items;
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, pricey.id);

    Ok(())
}

#[tokio::test]
async fn inactive_products_are_not_listed() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, Role::Brand).await?;
    let brand = create_brand(&state, &seller, &format!("Active-{}", Uuid::new_v4())).await?;
    let product = create_product(&state, &seller, brand.id, "Hidden soon", 100, 5).await?;

    product_service::update_product(
        &state,
        &seller,
        product.id,
        UpdateProductForm {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;

    let items = product_service::list_products(
        &state,
        ProductQuery {
            brand: Some(brand.id),
            search: None,
            sort_price: None,
        },
    )
    .await?
    .data
    .unwrap()
    .items;
    assert!(items.is_empty());

    // Still reachable by id, as on the original product page.
    let fetched = product_service::get_product(&state, product.id).await?;
    assert!(!fetched.data.unwrap().is_active);

    Ok(())
}

#[tokio::test]
async fn cart_add_merges_and_clamps_to_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, Role::Brand).await?;
    let buyer = create_user(&state, Role::Buyer).await?;
    let brand = create_brand(&state, &seller, &format!("Cart-{}", Uuid::new_v4())).await?;
    let product = create_product(&state, &seller, brand.id, "Limited", 300, 5).await?;

    // Requests outside [1, stock] are rejected outright.
    let zero = cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 0,
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));

    let too_many = cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 6,
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    // Sellers have no cart.
    let as_seller = cart_service::add_to_cart(
        &state,
        &seller,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(as_seller, Err(AppError::Forbidden)));

    // 3 of 5, then 4 more: merged into one row and clamped to 5, not 7.
    let first = cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?;
    assert_eq!(first.data.unwrap().quantity, 3);

    let second = cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 4,
        },
    )
    .await?;
    assert_eq!(second.data.unwrap().quantity, 5);

    let cart = cart_service::list_cart(&state, &buyer).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.total, 300 * 5);

    // Removal is scoped to the owning user; anyone else sees a missing row.
    let other_buyer = create_user(&state, Role::Buyer).await?;
    let foreign_remove =
        cart_service::remove_from_cart(&state, &other_buyer, cart.items[0].id).await;
    assert!(matches!(foreign_remove, Err(AppError::NotFound)));

    cart_service::remove_from_cart(&state, &buyer, cart.items[0].id).await?;
    let emptied = cart_service::list_cart(&state, &buyer).await?.data.unwrap();
    assert!(emptied.items.is_empty());
    assert_eq!(emptied.total, 0);

    Ok(())
}

#[tokio::test]
async fn ownership_gates_brand_and_product_mutation() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let owner = create_user(&state, Role::Brand).await?;
    let rival = create_user(&state, Role::Brand).await?;
    let admin = create_user(&state, Role::Admin).await?;
    let brand = create_brand(&state, &owner, &format!("Owned-{}", Uuid::new_v4())).await?;
    let product = create_product(&state, &owner, brand.id, "Guarded", 100, 5).await?;

    // A non-owning seller is rejected however valid the payload.
    let foreign_edit = product_service::update_product(
        &state,
        &rival,
        product.id,
        UpdateProductForm {
            title: Some("Hijacked".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(foreign_edit, Err(AppError::Forbidden)));

    // The guard fires before payload validation: an invalid price from a
    // non-owner is still a plain 403, not a 400.
    let foreign_bad_payload = product_service::update_product(
        &state,
        &rival,
        product.id,
        UpdateProductForm {
            price: Some(-1),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(foreign_bad_payload, Err(AppError::Forbidden)));

    let foreign_delete = brand_service::delete_brand(&state, &rival, brand.id).await;
    assert!(matches!(foreign_delete, Err(AppError::Forbidden)));

    let unchanged = product_service::get_product(&state, product.id).await?;
    assert_eq!(unchanged.data.unwrap().title, "Guarded");

    // A rival cannot post products into someone else's brand either.
    let foreign_create =
        create_product(&state, &rival, brand.id, "Squatter", 10, 1).await;
    assert!(foreign_create.is_err());

    // Admin bypasses ownership on mutation.
    let admin_edit = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductForm {
            title: Some("Renamed by admin".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(admin_edit.data.unwrap().title, "Renamed by admin");

    // Brand creation is seller-only: buyers and admins are both turned away.
    let buyer = create_user(&state, Role::Buyer).await?;
    for outsider in [&buyer, &admin] {
        assert!(matches!(
            brand_service::create_brand(
                &state,
                outsider,
                CreateBrandForm {
                    name: "Nope".into(),
                    description: None,
                    logo: None,
                },
            )
            .await,
            Err(AppError::Forbidden)
        ));
    }

    Ok(())
}

#[tokio::test]
async fn deleting_a_brand_cascades_to_its_products() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, Role::Brand).await?;
    let brand = create_brand(&state, &seller, &format!("Doomed-{}", Uuid::new_v4())).await?;
    let first = create_product(&state, &seller, brand.id, "First", 100, 5).await?;
    let second = create_product(&state, &seller, brand.id, "Second", 200, 5).await?;

    brand_service::delete_brand(&state, &seller, brand.id).await?;

    for id in [first.id, second.id] {
        let gone = product_service::get_product(&state, id).await;
        assert!(matches!(gone, Err(AppError::NotFound)));
    }

    let listed = product_service::list_products(
        &state,
        ProductQuery {
            brand: Some(brand.id),
            search: None,
            sort_price: None,
        },
    )
    .await?
    .data
    .unwrap()
    .items;
    assert!(listed.is_empty());

    Ok(())
}

#[tokio::test]
async fn deleting_a_product_leaves_cart_rows_dangling_but_hidden() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = create_user(&state, Role::Brand).await?;
    let buyer = create_user(&state, Role::Buyer).await?;
    let brand = create_brand(&state, &seller, &format!("Dangling-{}", Uuid::new_v4())).await?;
    let product = create_product(&state, &seller, brand.id, "Ephemeral", 150, 5).await?;

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;

    product_service::delete_product(&state, &seller, product.id).await?;

    // The stale row no longer shows up in the cart, nor in its total.
    let cart = cart_service::list_cart(&state, &buyer).await?.data.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, 0);

    Ok(())
}
