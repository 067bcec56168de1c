use {
    super::error::CheckoutError,
    super::id::{OrderId, ProviderRef, ReceiptToken},
    super::money::MoneyAmount,
    super::order::OrderTransition,
    super::payment::PaymentStatus,
    serde::Serialize,
    serde_json::Value,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PaymentCaptured,
    OrderPaid,
    PaymentFailed,
    OrderPaymentFailed,
    /// Anything else (`payment.authorized`, `refund.created`, ...). No-op
    /// beyond a provisional `processing` payment row.
    Other(String),
}

impl EventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "payment.captured" => Self::PaymentCaptured,
            "order.paid" => Self::OrderPaid,
            "payment.failed" => Self::PaymentFailed,
            "order.payment_failed" => Self::OrderPaymentFailed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            Self::PaymentCaptured | Self::OrderPaid => PaymentStatus::Succeeded,
            Self::PaymentFailed | Self::OrderPaymentFailed => PaymentStatus::Failed,
            Self::Other(_) => PaymentStatus::Processing,
        }
    }
}

/// `payload.payment.entity`, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentEntity {
    pub id: Option<String>,
    pub order_id: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub notes_order_id: Option<OrderId>,
}

/// `payload.order.entity`, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderEntity {
    pub id: Option<String>,
    pub receipt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    Metadata,
    Receipt,
    ExistingPayment,
}

/// A verified gateway event, decoded defensively: a field of the wrong type
/// is treated as absent instead of failing the whole event.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    pub name: String,
    pub kind: EventKind,
    pub payment: Option<PaymentEntity>,
    pub order: Option<OrderEntity>,
    pub raw: Value,
}

fn entity<'a>(payload: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    payload?.get(key)?.get("entity").filter(|v| v.is_object())
}

fn string_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_negative_int(value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|v| *v >= 0)
}

fn notes_order_id(payment: &Value) -> Option<OrderId> {
    let raw = payment.get("notes")?.get("order_id")?;
    non_negative_int(raw).filter(|id| *id > 0).map(OrderId::new)
}

impl GatewayEvent {
    /// Fails only when the body is not a JSON object at all.
    pub fn from_slice(body: &[u8]) -> Result<Self, CheckoutError> {
        let raw: Value = serde_json::from_slice(body)?;
        if !raw.is_object() {
            return Err(CheckoutError::Validation(
                "webhook body is not a JSON object".into(),
            ));
        }

        let name = string_field(&raw, "event").unwrap_or_else(|| "unknown".to_string());
        let kind = EventKind::parse(&name);
        let payload = raw.get("payload");

        let payment = entity(payload, "payment").map(|p| PaymentEntity {
            id: string_field(p, "id"),
            order_id: string_field(p, "order_id"),
            amount: p.get("amount").and_then(non_negative_int),
            currency: string_field(p, "currency"),
            notes_order_id: notes_order_id(p),
        });

        let order = entity(payload, "order").map(|o| OrderEntity {
            id: string_field(o, "id"),
            receipt: string_field(o, "receipt"),
        });

        Ok(Self {
            name,
            kind,
            payment,
            order,
            raw,
        })
    }

    pub fn provider_ref(&self) -> Option<ProviderRef> {
        self.payment
            .as_ref()
            .and_then(|p| p.id.as_deref())
            .and_then(|id| ProviderRef::new(id).ok())
    }

    /// Remote intent id: from the payment entity, else the order entity.
    pub fn remote_intent_id(&self) -> Option<&str> {
        self.payment
            .as_ref()
            .and_then(|p| p.order_id.as_deref())
            .or_else(|| self.order.as_ref().and_then(|o| o.id.as_deref()))
    }

    pub fn amount(&self) -> Option<MoneyAmount> {
        self.payment
            .as_ref()
            .and_then(|p| p.amount)
            .and_then(|a| MoneyAmount::new(a).ok())
    }

    pub fn currency(&self) -> Option<&str> {
        self.payment.as_ref().and_then(|p| p.currency.as_deref())
    }

    /// First two rules of the resolution chain: merchant metadata, then the
    /// receipt token. The third (existing payment row) needs the store.
    pub fn direct_order_id(&self) -> Option<(OrderId, ResolvedBy)> {
        if let Some(id) = self.payment.as_ref().and_then(|p| p.notes_order_id) {
            return Some((id, ResolvedBy::Metadata));
        }
        self.order
            .as_ref()
            .and_then(|o| o.receipt.as_deref())
            .and_then(ReceiptToken::parse)
            .map(|token| (token.order_id(), ResolvedBy::Receipt))
    }
}

/// What reconciling one webhook did. Every variant is acknowledged with
/// HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Signature was fine but the body was not a JSON object.
    Ignored,
    /// No rule mapped the event to a local order.
    Unresolved,
    /// The payment upsert failed; logged for replay, order left untouched.
    PaymentNotRecorded { order_id: OrderId },
    Applied {
        order_id: OrderId,
        resolved_by: ResolvedBy,
        payment_status: PaymentStatus,
        payment_recorded: bool,
        transition: OrderTransition,
    },
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored_invalid_payload",
            Self::Unresolved => "unresolved",
            Self::PaymentNotRecorded { .. } => "payment_not_recorded",
            Self::Applied { .. } => "applied",
        }
    }
}
