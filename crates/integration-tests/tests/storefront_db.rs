//! Storefront repositories against Postgres: checkout rejections, retried
//! submissions, order numbers, the default address and cart quantities.
//!
//! Needs `DATABASE_URL`; pending migrations are applied first.
//!
//! Run with: `cargo test -p dukkan-integration-tests -- --ignored`

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use dukkan_core::{
    AddressId, FullName, OrderNumber, PaymentMethod, PhoneNumber, ProductId, ShiftId, UserId,
};
use dukkan_storefront::db::{
    AddOutcome, AddressRepository, CartRepository, OrderRepository, PlaceOrderError,
};
use dukkan_storefront::models::{AddressInput, NewOrder};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| panic!("DATABASE_URL is not set"));
    let pool = PgPool::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("connect: {e}"));
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .unwrap_or_else(|e| panic!("migrate: {e}"));
    pool
}

async fn customer(pool: &PgPool) -> UserId {
    sqlx::query_scalar(
        "INSERT INTO dukkan.users (email, password_hash, full_name)
         VALUES ($1, 'not-a-hash', 'عميل تجريبي')
         RETURNING id",
    )
    .bind(format!("{}@test.dukkan.sa", Uuid::new_v4()))
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert user: {e}"))
}

async fn product(pool: &PgPool, stock: i32) -> ProductId {
    let slug = Uuid::new_v4().to_string();
    let category_id: i32 = sqlx::query_scalar(
        "INSERT INTO dukkan.categories (slug, name) VALUES ($1, 'تمور') RETURNING id",
    )
    .bind(&slug)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert category: {e}"));

    sqlx::query_scalar(
        "INSERT INTO dukkan.products (category_id, slug, name, price, stock)
         VALUES ($1, $2, 'تمر سكري', 45.50, $3)
         RETURNING id",
    )
    .bind(category_id)
    .bind(&slug)
    .bind(stock)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert product: {e}"))
}

async fn shift(pool: &PgPool) -> ShiftId {
    sqlx::query_scalar(
        "INSERT INTO dukkan.shifts (name, start_time, end_time)
         VALUES ('صباحي', TIME '09:00', TIME '12:00')
         RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert shift: {e}"))
}

async fn address(pool: &PgPool, user_id: UserId, building: &str) -> AddressId {
    let input = AddressInput {
        label: None,
        district: "النرجس".to_string(),
        street: "طريق أنس بن مالك".to_string(),
        building: building.to_string(),
        floor: None,
        apartment: None,
        landmark: None,
        instructions: None,
        location: None,
    };
    AddressRepository::new(pool)
        .create(user_id, &input)
        .await
        .unwrap_or_else(|e| panic!("create address: {e}"))
        .id
}

async fn defaults(pool: &PgPool, user_id: UserId) -> Vec<AddressId> {
    AddressRepository::new(pool)
        .list(user_id)
        .await
        .unwrap_or_else(|e| panic!("list addresses: {e}"))
        .into_iter()
        .filter(|a| a.is_default)
        .map(|a| a.id)
        .collect()
}

fn new_order(customer_id: UserId, address_id: AddressId, shift_id: ShiftId) -> NewOrder {
    NewOrder {
        idempotency_key: Uuid::new_v4(),
        order_number: OrderNumber::generate(Utc::now()),
        customer_id,
        address_id,
        shift_id,
        payment_method: PaymentMethod::CashOnDelivery,
        recipient_name: FullName::parse("نورة القحطاني").unwrap_or_else(|e| panic!("{e}")),
        recipient_phone: PhoneNumber::parse("0551234567").unwrap_or_else(|e| panic!("{e}")),
    }
}

/// A customer with one address and `quantity` units of a fresh product in the cart.
async fn ready_to_checkout(pool: &PgPool, quantity: u32) -> (NewOrder, ProductId) {
    let user_id = customer(pool).await;
    let address_id = address(pool, user_id, "4521").await;
    let product_id = product(pool, 10).await;
    let outcome = CartRepository::new(pool)
        .add(user_id, product_id, quantity)
        .await
        .unwrap_or_else(|e| panic!("add to cart: {e}"));
    assert_eq!(outcome, AddOutcome::Added(quantity));
    (new_order(user_id, address_id, shift(pool).await), product_id)
}

async fn stock(pool: &PgPool, product_id: ProductId) -> i32 {
    sqlx::query_scalar("SELECT stock FROM dukkan.products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("read stock: {e}"))
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_empty_cart_is_rejected() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let order = new_order(user_id, address(&pool, user_id, "1").await, shift(&pool).await);

    let result = OrderRepository::new(&pool).place(&order).await;
    assert!(matches!(result, Err(PlaceOrderError::EmptyCart)), "{result:?}");
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_someone_elses_address_is_rejected() {
    let pool = pool().await;
    let (mut order, product_id) = ready_to_checkout(&pool, 2).await;
    let stranger = customer(&pool).await;
    order.address_id = address(&pool, stranger, "77").await;

    let result = OrderRepository::new(&pool).place(&order).await;
    assert!(matches!(result, Err(PlaceOrderError::AddressNotFound)), "{result:?}");

    let cart = CartRepository::new(&pool)
        .get(order.customer_id)
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(cart.item_count(), 2);
    assert_eq!(stock(&pool, product_id).await, 10);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_retried_submission_returns_the_same_order() {
    let pool = pool().await;
    let (order, product_id) = ready_to_checkout(&pool, 3).await;
    let orders = OrderRepository::new(&pool);

    let first = orders.place(&order).await.unwrap_or_else(|e| panic!("{e}"));
    assert!(!first.replayed);

    let retry = orders.place(&order).await.unwrap_or_else(|e| panic!("{e}"));
    assert!(retry.replayed);
    assert_eq!(retry.id, first.id);
    assert_eq!(retry.order_number, first.order_number);
    assert_eq!(retry.item_count, 3);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM dukkan.orders WHERE idempotency_key = $1",
    )
    .bind(order.idempotency_key)
    .fetch_one(&pool)
    .await
    .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(rows, 1);
    assert_eq!(stock(&pool, product_id).await, 7);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_same_millisecond_checkouts_both_succeed() {
    let pool = pool().await;
    let (first, _) = ready_to_checkout(&pool, 1).await;
    let (mut second, _) = ready_to_checkout(&pool, 1).await;
    second.order_number = first.order_number.clone();

    let orders = OrderRepository::new(&pool);
    let a = orders.place(&first).await.unwrap_or_else(|e| panic!("{e}"));
    let b = orders.place(&second).await.unwrap_or_else(|e| panic!("{e}"));

    assert_ne!(a.order_number, b.order_number);
    assert!(OrderNumber::parse(b.order_number.as_str()).is_ok());
}

// =============================================================================
// Default address
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_set_default_leaves_exactly_one() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let first = address(&pool, user_id, "1").await;
    let second = address(&pool, user_id, "2").await;
    let third = address(&pool, user_id, "3").await;
    assert_eq!(defaults(&pool, user_id).await, vec![first]);

    let addresses = AddressRepository::new(&pool);
    addresses
        .set_default(user_id, third)
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(defaults(&pool, user_id).await, vec![third]);

    for _ in 0..20 {
        let (a, b) = tokio::join!(
            addresses.set_default(user_id, first),
            addresses.set_default(user_id, second),
        );
        a.unwrap_or_else(|e| panic!("{e}"));
        b.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(defaults(&pool, user_id).await.len(), 1);
    }
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_deleting_the_default_promotes_the_newest() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let first = address(&pool, user_id, "1").await;
    let second = address(&pool, user_id, "2").await;
    let third = address(&pool, user_id, "3").await;

    let addresses = AddressRepository::new(&pool);
    addresses
        .delete(user_id, first)
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(defaults(&pool, user_id).await, vec![third]);

    addresses
        .delete(user_id, second)
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(defaults(&pool, user_id).await, vec![third]);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_set_quantity_is_capped_by_stock() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let product_id = product(&pool, 3).await;
    let carts = CartRepository::new(&pool);

    carts
        .add(user_id, product_id, 1)
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    carts
        .set_quantity(user_id, product_id, 10)
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    let cart = carts.get(user_id).await.unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, 3);
}
