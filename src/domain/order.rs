use {
    super::error::CheckoutError,
    super::id::{OrderId, ProductId, UserId},
    super::money::{Currency, MoneyAmount},
    super::payment::PaymentStatus,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    PaymentFailed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::PaymentFailed => "payment_failed",
        }
    }

    /// Ratchet: where a payment outcome moves this order, or `None` if it
    /// must not move. `Succeeded` always lands on `Paid`; `Failed` only
    /// applies to a still-pending order; `Processing` never moves anything.
    pub fn after_payment(&self, outcome: PaymentStatus) -> Option<OrderStatus> {
        match (self, outcome) {
            (Self::Paid, _) => None,
            (_, PaymentStatus::Succeeded) => Some(Self::Paid),
            (Self::Pending, PaymentStatus::Failed) => Some(Self::PaymentFailed),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "payment_failed" => Ok(Self::PaymentFailed),
            other => Err(CheckoutError::Validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(alias = "pincode")]
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address1", &self.address1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        match required.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((field, _)) => Err(CheckoutError::Validation(format!(
                "shipping address field `{field}` is required"
            ))),
            None => Ok(()),
        }
    }
}

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub qty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
}

impl OrderRequest {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.items.is_empty() {
            return Err(CheckoutError::Validation(
                "order must contain at least one item".into(),
            ));
        }
        if let Some(line) = self.items.iter().find(|l| l.qty < 1) {
            return Err(CheckoutError::Validation(format!(
                "quantity for product {} must be at least 1, got {}",
                line.product_id, line.qty
            )));
        }
        self.shipping_address.validate()
    }
}

/// A line with the unit price captured from the catalog inside the
/// order-creation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub qty: i32,
    pub unit_price: MoneyAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    pub shipping_fee: MoneyAmount,
    /// Shipping is waived when the subtotal is strictly above this.
    pub free_shipping_above: MoneyAmount,
    pub tax_rate_bps: u32,
    pub currency: Currency,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            shipping_fee: MoneyAmount::from_unsigned(5_000),
            free_shipping_above: MoneyAmount::from_unsigned(50_000),
            tax_rate_bps: 1_800,
            currency: Currency::Inr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: MoneyAmount,
    pub shipping_fee: MoneyAmount,
    pub tax_amount: MoneyAmount,
    pub total: MoneyAmount,
}

impl OrderTotals {
    pub fn compute(lines: &[PricedLine], rules: &PricingRules) -> Result<Self, CheckoutError> {
        let overflow = || CheckoutError::Validation("order amount overflow".into());

        let subtotal = lines.iter().try_fold(MoneyAmount::ZERO, |acc, line| {
            line.unit_price
                .checked_mul(i64::from(line.qty))
                .and_then(|line_total| acc.checked_add(line_total))
                .ok_or_else(overflow)
        })?;

        let shipping_fee = if subtotal > rules.free_shipping_above {
            MoneyAmount::ZERO
        } else {
            rules.shipping_fee
        };
        let tax_amount = subtotal.percent_bps(rules.tax_rate_bps).ok_or_else(overflow)?;
        let total = subtotal
            .checked_add(shipping_fee)
            .and_then(|t| t.checked_add(tax_amount))
            .ok_or_else(overflow)?;

        Ok(Self {
            subtotal,
            shipping_fee,
            tax_amount,
            total,
        })
    }
}

/// Ready for INSERT, built inside the order-creation transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub totals: OrderTotals,
    pub currency: Currency,
    pub shipping_address: ShippingAddress,
    pub lines: Vec<PricedLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub qty: i32,
    pub price_each: MoneyAmount,
}

/// Full order record from DB (for reads).
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal: MoneyAmount,
    pub shipping_fee: MoneyAmount,
    pub tax_amount: MoneyAmount,
    pub total: MoneyAmount,
    pub currency: Currency,
    pub payment_ref: Option<String>,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// What an order-status write actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTransition {
    MarkedPaid,
    MarkedPaymentFailed,
    Unchanged,
}
