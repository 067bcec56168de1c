use {
    super::error::CheckoutError,
    super::id::{OrderId, ReceiptToken, UserId},
    super::money::Money,
    std::{future::Future, pin::Pin},
};

/// What the engine asks the gateway to create for a pending order.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub money: Money,
    pub receipt: ReceiptToken,
    /// Capture automatically once the customer authorises the payment.
    pub capture_on_success: bool,
}

/// What the gateway hands back after creating the remote intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIntent {
    pub id: String,
    pub amount_minor: i64,
    pub currency: String,
}

pub trait PaymentGateway: Send + Sync {
    fn create_intent(
        &self,
        request: &IntentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteIntent, CheckoutError>> + Send + '_>>;
}
