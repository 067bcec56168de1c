use {
    super::error::CheckoutError,
    derive_more::{Display, From},
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

/// Gateway-side identifier of a single payment attempt (`pay_xxx`).
/// The natural idempotency key for ingesting external events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderRef(String);

impl ProviderRef {
    pub fn new(id: impl Into<String>) -> Result<Self, CheckoutError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "provider reference cannot be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Receipt embedded in a remote intent so gateway events can be mapped back
/// to a local order without relying on gateway-side metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptToken(OrderId);

const PREFIX: &str = "order_";

impl fmt::Display for ReceiptToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.0)
    }
}

impl ReceiptToken {
    pub fn for_order(id: OrderId) -> Self {
        Self(id)
    }

    /// Inverse of `Display`. Anything not matching `order_<positive id>`
    /// exactly (no sign, no leading zeros) is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix(PREFIX)?;
        if digits.starts_with('0') || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let id: i64 = digits.parse().ok()?;
        (id > 0).then(|| Self(OrderId(id)))
    }

    pub fn order_id(&self) -> OrderId {
        self.0
    }
}
