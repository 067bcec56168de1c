use {
    super::error::CheckoutError,
    super::id::{OrderId, ProviderRef},
    super::money::{Currency, MoneyAmount},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

pub const RAZORPAY: &str = "razorpay";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Processing,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Lifecycle rank; higher means further along. A provisional
    /// `processing` event never regresses a resolved row.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Processing => 0,
            Self::Succeeded | Self::Failed => 1,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = CheckoutError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "processing" => Ok(Self::Processing),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            other => Err(CheckoutError::Validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// Full payment record from DB (for reads).
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub provider: String,
    pub provider_ref: String,
    pub status: PaymentStatus,
    pub amount: MoneyAmount,
    pub currency: String,
    pub raw_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Upsert input, keyed by `(provider, provider_ref)`.
#[derive(Debug, Clone)]
pub struct NewPayment {
    order_id: OrderId,
    provider: &'static str,
    provider_ref: ProviderRef,
    status: PaymentStatus,
    amount: Option<MoneyAmount>,
    currency: Currency,
    raw_payload: serde_json::Value,
}

pub struct NewPaymentParams {
    pub order_id: OrderId,
    pub provider_ref: ProviderRef,
    pub status: PaymentStatus,
    /// `None` keeps whatever amount an existing row already carries.
    pub amount: Option<MoneyAmount>,
    pub currency: Currency,
    pub raw_payload: serde_json::Value,
}

impl NewPayment {
    pub fn new(p: NewPaymentParams) -> Self {
        Self {
            order_id: p.order_id,
            provider: RAZORPAY,
            provider_ref: p.provider_ref,
            status: p.status,
            amount: p.amount,
            currency: p.currency,
            raw_payload: p.raw_payload,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn provider(&self) -> &str {
        self.provider
    }

    pub fn provider_ref(&self) -> &ProviderRef {
        &self.provider_ref
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn amount(&self) -> Option<MoneyAmount> {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn raw_payload(&self) -> &serde_json::Value {
        &self.raw_payload
    }
}
