use {
    crate::domain::error::CheckoutError,
    crate::domain::id::{OrderId, ProductId, ProviderRef, UserId},
    crate::domain::money::{Currency, MoneyAmount},
    crate::domain::order::{NewOrder, Order, OrderItem, OrderStatus},
    chrono::{DateTime, Utc},
    futures::{TryStreamExt, stream::BoxStream},
    sqlx::{PgPool, Postgres, Transaction},
    std::collections::HashMap,
};

#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub tax_amount: i64,
    pub total: i64,
    pub currency: String,
    pub payment_ref: Option<String>,
    pub shipping_address_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItem>) -> Result<Order, CheckoutError> {
        let shipping_address = serde_json::from_value(self.shipping_address_json)?;
        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            status: OrderStatus::try_from(self.status.as_str())?,
            subtotal: MoneyAmount::new(self.subtotal)?,
            shipping_fee: MoneyAmount::new(self.shipping_fee)?,
            tax_amount: MoneyAmount::new(self.tax_amount)?,
            total: MoneyAmount::new(self.total)?,
            currency: Currency::try_from(self.currency.as_str())?,
            payment_ref: self.payment_ref,
            shipping_address,
            created_at: self.created_at,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    qty: i32,
    price_each: i64,
}

impl TryFrom<ItemRow> for OrderItem {
    type Error = CheckoutError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            id: row.id,
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            qty: row.qty,
            price_each: MoneyAmount::new(row.price_each)?,
        })
    }
}

/// Ownership-checked view used by the payment paths.
#[derive(Debug, Clone)]
pub struct OrderHeader {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: MoneyAmount,
    pub currency: Currency,
}

/// Insert the order row (status `pending`) and one item per priced line.
pub async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order: &NewOrder,
) -> Result<OrderId, CheckoutError> {
    let address = serde_json::to_value(&order.shipping_address)?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO orders
            (user_id, status, subtotal, shipping_fee, tax_amount, total, currency, shipping_address_json)
        VALUES ($1, 'pending', $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(order.user_id.get())
    .bind(order.totals.subtotal.minor_units())
    .bind(order.totals.shipping_fee.minor_units())
    .bind(order.totals.tax_amount.minor_units())
    .bind(order.totals.total.minor_units())
    .bind(order.currency.as_str())
    .bind(&address)
    .fetch_one(&mut **tx)
    .await?;

    for line in &order.lines {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, qty, price_each) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(line.product_id.get())
        .bind(line.qty)
        .bind(line.unit_price.minor_units())
        .execute(&mut **tx)
        .await?;
    }

    Ok(OrderId::new(id))
}

pub async fn find_header_for_user(
    pool: &PgPool,
    order_id: OrderId,
    user_id: UserId,
) -> Result<Option<OrderHeader>, CheckoutError> {
    let row: Option<(String, i64, String)> = sqlx::query_as(
        "SELECT status, total, currency FROM orders WHERE id = $1 AND user_id = $2",
    )
    .bind(order_id.get())
    .bind(user_id.get())
    .fetch_optional(pool)
    .await?;

    row.map(|(status, total, currency)| {
        Ok(OrderHeader {
            id: order_id,
            status: OrderStatus::try_from(status.as_str())?,
            total: MoneyAmount::new(total)?,
            currency: Currency::try_from(currency.as_str())?,
        })
    })
    .transpose()
}

pub async fn find_status(pool: &PgPool, order_id: OrderId) -> Result<Option<OrderStatus>, CheckoutError> {
    let status: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order_id.get())
        .fetch_optional(pool)
        .await?;
    status.map(|s| OrderStatus::try_from(s.as_str())).transpose()
}

/// Items in insertion order. Aborts on the first row that fails to decode.
pub async fn items_for_order(pool: &PgPool, order_id: OrderId) -> Result<Vec<OrderItem>, CheckoutError> {
    let mut rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, order_id, product_id, qty, price_each FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id.get())
    .fetch(pool);

    let mut items = Vec::new();
    while let Some(row) = rows.try_next().await? {
        items.push(OrderItem::try_from(row)?);
    }
    Ok(items)
}

/// Items for a batch of orders in one round trip, grouped by order and kept
/// in insertion order.
pub async fn items_for_orders(
    pool: &PgPool,
    order_ids: &[OrderId],
) -> Result<HashMap<OrderId, Vec<OrderItem>>, CheckoutError> {
    let ids: Vec<i64> = order_ids.iter().map(OrderId::get).collect();
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, order_id, product_id, qty, price_each FROM order_items \
         WHERE order_id = ANY($1) ORDER BY order_id, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        let item = OrderItem::try_from(row)?;
        grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
}

pub async fn get_for_user(
    pool: &PgPool,
    order_id: OrderId,
    user_id: UserId,
) -> Result<Option<Order>, CheckoutError> {
    let row: Option<OrderRow> = sqlx::query_as(
        "SELECT id, user_id, status, subtotal, shipping_fee, tax_amount, total, \
         currency, payment_ref, shipping_address_json, created_at \
         FROM orders WHERE id = $1 AND user_id = $2",
    )
    .bind(order_id.get())
    .bind(user_id.get())
    .fetch_optional(pool)
    .await?;

    match row {
        None => Ok(None),
        Some(row) => {
            let items = items_for_order(pool, order_id).await?;
            row.into_order(items).map(Some)
        }
    }
}

pub async fn count_for_user(pool: &PgPool, user_id: UserId) -> Result<i64, CheckoutError> {
    let n = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id.get())
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Lazy page of a user's orders, newest first. The caller picks the error
/// policy per row.
pub fn stream_for_user(
    pool: &PgPool,
    user_id: UserId,
    limit: i64,
    offset: i64,
) -> BoxStream<'_, Result<OrderRow, sqlx::Error>> {
    sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, status, subtotal, shipping_fee, tax_amount, total, \
         currency, payment_ref, shipping_address_json, created_at \
         FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id.get())
    .bind(limit)
    .bind(offset)
    .fetch(pool)
}

/// Set `paid` and record the payment reference (if given), returning the
/// status the order had before. `None` when the order does not exist.
pub async fn set_paid(
    pool: &PgPool,
    order_id: OrderId,
    payment_ref: Option<&ProviderRef>,
) -> Result<Option<OrderStatus>, CheckoutError> {
    let previous: Option<String> = sqlx::query_scalar(
        r#"
        WITH prev AS (SELECT id, status FROM orders WHERE id = $1 FOR UPDATE)
        UPDATE orders o
        SET status = 'paid', payment_ref = COALESCE($2, o.payment_ref), updated_at = now()
        FROM prev
        WHERE o.id = prev.id
        RETURNING prev.status
        "#,
    )
    .bind(order_id.get())
    .bind(payment_ref.map(ProviderRef::as_str))
    .fetch_optional(pool)
    .await?;

    previous.map(|s| OrderStatus::try_from(s.as_str())).transpose()
}

/// `payment_failed`, but only from `pending`. Returns whether the row moved.
pub async fn set_payment_failed_if_pending(pool: &PgPool, order_id: OrderId) -> Result<bool, CheckoutError> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'payment_failed', updated_at = now() WHERE id = $1 AND status = 'pending'",
    )
    .bind(order_id.get())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
