use {
    super::ReconciliationEngine,
    crate::domain::error::CheckoutError,
    crate::domain::id::{OrderId, UserId},
    crate::domain::money::{Currency, MoneyAmount},
    crate::domain::order::{NewOrder, Order, OrderRequest, OrderTotals},
    crate::domain::payment::Payment,
    crate::infra::postgres::{inventory_repo, order_repo, payment_repo},
    futures::StreamExt,
    serde::Serialize,
};

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 50;

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: MoneyAmount,
    pub currency: Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Out-of-range values fall back to the defaults rather than erroring.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit
            .filter(|l| (1..=MAX_PAGE_LIMIT).contains(l))
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub payment: Option<Payment>,
}

impl ReconciliationEngine {
    /// Reserve stock, price the order and persist it as `pending`, all in one
    /// transaction. Any error drops the transaction, which rolls it back.
    #[tracing::instrument(skip_all, fields(user_id = %user_id, lines = request.items.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        request: OrderRequest,
    ) -> Result<PlacedOrder, CheckoutError> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let priced = inventory_repo::reserve(&mut tx, &request.items).await?;
        let totals = OrderTotals::compute(&priced, &self.pricing)?;

        let new_order = NewOrder {
            user_id,
            totals,
            currency: self.pricing.currency,
            shipping_address: request.shipping_address,
            lines: priced,
        };
        let order_id = order_repo::insert_order(&mut tx, &new_order).await?;
        inventory_repo::commit_reservation(&mut tx, &new_order.lines).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            subtotal = %totals.subtotal,
            shipping_fee = %totals.shipping_fee,
            tax = %totals.tax_amount,
            total = %totals.total,
            "order created"
        );

        Ok(PlacedOrder {
            order_id,
            total: totals.total,
            currency: new_order.currency,
        })
    }

    /// Caller's orders, newest first. A row that fails to decode is skipped
    /// and logged; the page still returns.
    pub async fn list_orders(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<OrderPage, CheckoutError> {
        let total = order_repo::count_for_user(&self.pool, user_id).await?;

        // Drain the page before asking the pool for anything else: the stream
        // pins a connection until it ends.
        let rows: Vec<_> = order_repo::stream_for_user(&self.pool, user_id, page.limit, page.offset())
            .filter_map(|row| async move {
                row.map_err(|err| {
                    tracing::warn!(user_id = %user_id, "skipping unreadable order row: {err}");
                })
                .ok()
            })
            .collect()
            .await;

        let ids: Vec<OrderId> = rows.iter().map(|row| OrderId::new(row.id)).collect();
        let mut items = order_repo::items_for_orders(&self.pool, &ids).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id = OrderId::new(row.id);
            let lines = items.remove(&order_id).unwrap_or_default();
            match row.into_order(lines) {
                Ok(order) => orders.push(order),
                Err(err) => {
                    tracing::warn!(order_id = %order_id, "skipping undecodable order: {err}");
                }
            }
        }

        Ok(OrderPage {
            orders,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    pub async fn get_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderDetail, CheckoutError> {
        let order = order_repo::get_for_user(&self.pool, order_id, user_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(format!("order {order_id}")))?;
        let payment = payment_repo::latest_for_order(&self.pool, order_id).await?;
        Ok(OrderDetail { order, payment })
    }
}
