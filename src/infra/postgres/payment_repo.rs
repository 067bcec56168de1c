use {
    crate::domain::error::CheckoutError,
    crate::domain::id::{OrderId, ProviderRef},
    crate::domain::money::MoneyAmount,
    crate::domain::payment::{NewPayment, Payment, PaymentStatus},
    chrono::{DateTime, Utc},
    sqlx::PgPool,
};

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    order_id: i64,
    provider: String,
    provider_ref: String,
    status: String,
    amount: i64,
    currency: String,
    raw_payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = CheckoutError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            order_id: OrderId::new(row.order_id),
            provider: row.provider,
            provider_ref: row.provider_ref,
            status: PaymentStatus::try_from(row.status.as_str())?,
            amount: MoneyAmount::new(row.amount)?,
            currency: row.currency,
            raw_payload: row.raw_payload,
            created_at: row.created_at,
        })
    }
}

/// Insert or overwrite the row for `(provider, provider_ref)`.
///
/// On conflict the latest status, currency and payload win, except that a
/// lower-ranked status (`processing`) never replaces a resolved one. A `None`
/// amount keeps the stored amount. `order_id` is fixed by the first writer.
pub async fn upsert_payment(pool: &PgPool, payment: &NewPayment) -> Result<i64, CheckoutError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO payments
            (order_id, provider, provider_ref, status, amount, currency, raw_payload)
        VALUES ($1, $2, $3, $4, COALESCE($5, 0), $6, $7)
        ON CONFLICT (provider, provider_ref) DO UPDATE SET
            status = CASE
                WHEN $8 < (CASE payments.status WHEN 'processing' THEN 0 ELSE 1 END)
                THEN payments.status
                ELSE EXCLUDED.status
            END,
            amount = COALESCE($5, payments.amount),
            currency = EXCLUDED.currency,
            raw_payload = EXCLUDED.raw_payload,
            updated_at = now()
        RETURNING id
        "#,
    )
    .bind(payment.order_id().get())
    .bind(payment.provider())
    .bind(payment.provider_ref().as_str())
    .bind(payment.status().as_str())
    .bind(payment.amount().map(|a| a.minor_units()))
    .bind(payment.currency().as_str())
    .bind(payment.raw_payload())
    .bind(i32::from(payment.status().rank()))
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Reverse lookup used as the last rule of webhook order resolution.
pub async fn find_order_id(
    pool: &PgPool,
    provider: &str,
    provider_ref: &ProviderRef,
) -> Result<Option<OrderId>, CheckoutError> {
    let id: Option<i64> =
        sqlx::query_scalar("SELECT order_id FROM payments WHERE provider = $1 AND provider_ref = $2")
            .bind(provider)
            .bind(provider_ref.as_str())
            .fetch_optional(pool)
            .await?;
    Ok(id.map(OrderId::new))
}

pub async fn find_by_ref(
    pool: &PgPool,
    provider: &str,
    provider_ref: &ProviderRef,
) -> Result<Option<Payment>, CheckoutError> {
    let row: Option<PaymentRow> = sqlx::query_as(
        "SELECT id, order_id, provider, provider_ref, status, amount, currency, raw_payload, created_at \
         FROM payments WHERE provider = $1 AND provider_ref = $2",
    )
    .bind(provider)
    .bind(provider_ref.as_str())
    .fetch_optional(pool)
    .await?;
    row.map(Payment::try_from).transpose()
}

/// Most recently touched payment for an order.
pub async fn latest_for_order(pool: &PgPool, order_id: OrderId) -> Result<Option<Payment>, CheckoutError> {
    let row: Option<PaymentRow> = sqlx::query_as(
        "SELECT id, order_id, provider, provider_ref, status, amount, currency, raw_payload, created_at \
         FROM payments WHERE order_id = $1 ORDER BY updated_at DESC, id DESC LIMIT 1",
    )
    .bind(order_id.get())
    .fetch_optional(pool)
    .await?;
    row.map(Payment::try_from).transpose()
}
