use {
    crate::domain::error::CheckoutError,
    crate::domain::id::ProductId,
    crate::domain::money::MoneyAmount,
    crate::domain::order::{OrderLine, PricedLine},
    sqlx::{Postgres, Transaction},
    std::collections::HashMap,
};

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: i64,
    price: i64,
    stock_qty: i32,
}

/// Lock every product the order touches (in id order, so concurrent orders
/// over overlapping products cannot deadlock), then check each line against
/// the locked stock and capture its current price.
///
/// Nothing is written here; any error leaves the caller's transaction free
/// to roll back with no side effects.
pub async fn reserve(
    tx: &mut Transaction<'_, Postgres>,
    lines: &[OrderLine],
) -> Result<Vec<PricedLine>, CheckoutError> {
    let mut ids: Vec<i64> = lines.iter().map(|l| l.product_id.get()).collect();
    ids.sort_unstable();
    ids.dedup();

    let rows: Vec<StockRow> = sqlx::query_as(
        "SELECT id, price, stock_qty FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;

    let stock: HashMap<i64, StockRow> = rows.into_iter().map(|r| (r.id, r)).collect();

    // Repeated lines for the same product draw on the same stock.
    let mut requested: HashMap<i64, i64> = HashMap::new();
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        let row = stock
            .get(&line.product_id.get())
            .ok_or(CheckoutError::ProductNotFound {
                product_id: line.product_id,
            })?;

        let wanted = requested.entry(row.id).or_insert(0);
        *wanted += i64::from(line.qty);
        if *wanted > i64::from(row.stock_qty) {
            return Err(CheckoutError::InsufficientStock {
                product_id: line.product_id,
                available: row.stock_qty,
            });
        }

        priced.push(PricedLine {
            product_id: line.product_id,
            qty: line.qty,
            unit_price: MoneyAmount::new(row.price)?,
        });
    }

    Ok(priced)
}

/// Decrement stock for lines previously returned by [`reserve`] in the same
/// transaction.
pub async fn commit_reservation(
    tx: &mut Transaction<'_, Postgres>,
    lines: &[PricedLine],
) -> Result<(), CheckoutError> {
    for line in lines {
        let result = sqlx::query(
            "UPDATE products SET stock_qty = stock_qty - $1 WHERE id = $2 AND stock_qty >= $1",
        )
        .bind(line.qty)
        .bind(line.product_id.get())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(CheckoutError::Conflict(format!(
                "stock for product {} changed during reservation",
                line.product_id
            )));
        }
    }
    Ok(())
}

pub async fn stock_of(pool: &sqlx::PgPool, product_id: ProductId) -> Result<Option<i32>, CheckoutError> {
    let qty = sqlx::query_scalar("SELECT stock_qty FROM products WHERE id = $1")
        .bind(product_id.get())
        .fetch_optional(pool)
        .await?;
    Ok(qty)
}
