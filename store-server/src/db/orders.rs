//! Order store
//!
//! The order aggregate (order row + items) is the system of record and the
//! only resource requiring mutual exclusion. Status transitions are
//! conditional UPDATEs keyed on the previously observed status, so two
//! conflicting concurrent transitions cannot both succeed: the loser sees
//! zero affected rows and surfaces `ConcurrentModification`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use shared::error::{AppError, ErrorCode};
use shared::models::{Address, OrderNote, OrderStatus, PaymentMethod, PaymentStatus};

use crate::error::ServiceResult;
use crate::orders::number;

/// Attempts at order-number generation before giving up
const MAX_NUMBER_ATTEMPTS: u32 = 3;

/// Persisted order row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub gateway_order_ref: Option<String>,
    pub gateway_payment_ref: Option<String>,
    pub shipping_address: Json<Address>,
    pub billing_address: Option<Json<Address>>,
    pub notes: Json<Vec<OrderNote>>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Email the notification dispatcher should target.
    ///
    /// User-owned orders carry the registered user's email snapshotted at
    /// creation; guest orders carry the guest email. May be absent.
    pub fn recipient_email(&self) -> Option<&str> {
        if self.user_id.is_some() {
            self.user_email.as_deref()
        } else {
            self.guest_email.as_deref()
        }
    }

    /// Customer display name for notification templates
    pub fn customer_name(&self) -> &str {
        self.guest_name.as_deref().unwrap_or("Customer")
    }
}

/// Persisted order item row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub total: Decimal,
    pub product_snapshot: Value,
}

/// New order payload (items carried separately)
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub initial_note: Option<String>,
}

/// New order item with frozen pricing and product snapshot
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub total: Decimal,
    pub product_snapshot: Value,
}

/// Create an order with its items in a single transaction.
///
/// Order numbers are derived from today's greatest existing number; the
/// read-then-write race is resolved by the UNIQUE constraint plus retry.
pub async fn create_order(
    pool: &PgPool,
    new: &NewOrder,
    items: &[NewOrderItem],
) -> ServiceResult<Order> {
    for attempt in 1..=MAX_NUMBER_ATTEMPTS {
        let today = Utc::now().date_naive();
        let last = last_number_for_prefix(pool, &number::date_prefix(today)).await?;
        let Some(seq) = number::sequence_after(last.as_deref()) else {
            return Err(AppError::new(ErrorCode::SequenceExhausted).into());
        };
        let order_number = number::format(today, seq);

        match insert_order(pool, &order_number, new, items).await {
            Ok(order) => return Ok(order),
            Err(e) if is_order_number_conflict(&e) => {
                tracing::warn!(
                    order_number = %order_number,
                    attempt,
                    "Order number collision, retrying"
                );
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::new(ErrorCode::SequenceExhausted).into())
}

async fn last_number_for_prefix(
    pool: &PgPool,
    prefix: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT order_number FROM orders
         WHERE order_number LIKE $1
         ORDER BY order_number DESC
         LIMIT 1",
    )
    .bind(format!("{prefix}%"))
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.0))
}

fn is_order_number_conflict(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.constraint() == Some("orders_order_number_key")
    )
}

async fn insert_order(
    pool: &PgPool,
    order_number: &str,
    new: &NewOrder,
    items: &[NewOrderItem],
) -> Result<Order, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let notes: Vec<OrderNote> = new
        .initial_note
        .iter()
        .map(|body| OrderNote {
            body: body.clone(),
            created_at: Utc::now(),
        })
        .collect();

    let order: Order = sqlx::query_as(
        "INSERT INTO orders (
            order_number, user_id, user_email, guest_name, guest_email,
            subtotal, tax, shipping, discount, total,
            payment_method, shipping_address, billing_address, notes
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         RETURNING *",
    )
    .bind(order_number)
    .bind(&new.user_id)
    .bind(&new.user_email)
    .bind(&new.guest_name)
    .bind(&new.guest_email)
    .bind(new.subtotal)
    .bind(new.tax)
    .bind(new.shipping)
    .bind(new.discount)
    .bind(new.total)
    .bind(new.payment_method)
    .bind(Json(&new.shipping_address))
    .bind(new.billing_address.as_ref().map(Json))
    .bind(Json(&notes))
    .fetch_one(&mut *tx)
    .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, name, price, quantity, total, product_snapshot)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order.id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(item.total)
        .bind(&item.product_snapshot)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(order)
}

/// Find order by id
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Find order by its human-readable order number
pub async fn find_by_number(
    pool: &PgPool,
    order_number: &str,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number)
        .fetch_optional(pool)
        .await
}

/// List orders, newest first
pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

/// Fetch the items belonging to an order
pub async fn items_for_order(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

/// Conditionally transition the order status.
///
/// The WHERE clause is keyed on the previously observed status, so a
/// concurrent conflicting transition loses: zero affected rows maps to
/// `ConcurrentModification`. SHIPPED sets the tracking number and
/// `shipped_at` atomically in the same update; DELIVERED stamps
/// `delivered_at`.
pub async fn transition_status(
    pool: &PgPool,
    id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
    tracking_number: Option<&str>,
) -> ServiceResult<Order> {
    let updated: Option<Order> = match to {
        OrderStatus::Shipped => {
            sqlx::query_as(
                "UPDATE orders
                 SET status = $3, tracking_number = $4, shipped_at = now(), updated_at = now()
                 WHERE id = $1 AND status = $2
                 RETURNING *",
            )
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(tracking_number)
            .fetch_optional(pool)
            .await?
        }
        OrderStatus::Delivered => {
            sqlx::query_as(
                "UPDATE orders
                 SET status = $3, delivered_at = now(), updated_at = now()
                 WHERE id = $1 AND status = $2
                 RETURNING *",
            )
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(pool)
            .await?
        }
        _ => {
            sqlx::query_as(
                "UPDATE orders
                 SET status = $3, updated_at = now()
                 WHERE id = $1 AND status = $2
                 RETURNING *",
            )
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(pool)
            .await?
        }
    };

    updated.ok_or_else(|| AppError::concurrent_modification(format!("Order {id}")).into())
}

/// Conditionally transition the payment status (operator path)
pub async fn transition_payment_status(
    pool: &PgPool,
    id: Uuid,
    from: PaymentStatus,
    to: PaymentStatus,
) -> ServiceResult<Order> {
    let updated: Option<Order> = sqlx::query_as(
        "UPDATE orders
         SET payment_status = $3, updated_at = now()
         WHERE id = $1 AND payment_status = $2
         RETURNING *",
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .fetch_optional(pool)
    .await?;

    updated.ok_or_else(|| AppError::concurrent_modification(format!("Order {id}")).into())
}

/// Atomically complete a verified gateway payment: payment goes COMPLETED,
/// order goes PENDING -> CONFIRMED, and the captured payment ref is stored.
/// Returns None when the order is not in a completable state.
pub async fn complete_gateway_payment(
    pool: &PgPool,
    id: Uuid,
    payment_ref: &str,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders
         SET payment_status = 'COMPLETED', status = 'CONFIRMED',
             gateway_payment_ref = $2, updated_at = now()
         WHERE id = $1 AND status = 'PENDING'
           AND payment_status IN ('PENDING', 'PROCESSING')
         RETURNING *",
    )
    .bind(id)
    .bind(payment_ref)
    .fetch_optional(pool)
    .await
}

/// Store the gateway intent id, but only when none is present yet.
/// Guards against double intent creation for the same order.
pub async fn set_gateway_order_ref(
    pool: &PgPool,
    id: Uuid,
    gateway_ref: &str,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE orders SET gateway_order_ref = $2, updated_at = now()
         WHERE id = $1 AND gateway_order_ref IS NULL",
    )
    .bind(id)
    .bind(gateway_ref)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Best-effort mark of a failed gateway interaction during creation
pub async fn mark_payment_failed(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET payment_status = 'FAILED', updated_at = now()
         WHERE id = $1 AND payment_status = 'PENDING'",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Append a timestamped note to the order's note log
pub async fn append_note(pool: &PgPool, id: Uuid, note: &OrderNote) -> ServiceResult<Order> {
    let updated: Option<Order> = sqlx::query_as(
        "UPDATE orders SET notes = notes || $2::jsonb, updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(Json(note))
    .fetch_optional(pool)
    .await?;

    updated.ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).into())
}
