pub mod checkout;
pub mod payments;
pub mod reconciliation;

use {
    crate::config::RazorpayConfig,
    crate::domain::error::CheckoutError,
    crate::domain::gateway::PaymentGateway,
    crate::domain::order::PricingRules,
    sqlx::PgPool,
    std::sync::Arc,
};

/// Owns every write to orders, stock and payments. The three channels that
/// can move an order (checkout, client verification, gateway webhook) all go
/// through here and synchronise only through the database.
#[derive(Clone)]
pub struct ReconciliationEngine {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    razorpay: RazorpayConfig,
    pricing: PricingRules,
}

impl ReconciliationEngine {
    pub fn new(
        pool: PgPool,
        gateway: Arc<dyn PaymentGateway>,
        razorpay: RazorpayConfig,
        pricing: PricingRules,
    ) -> Self {
        Self {
            pool,
            gateway,
            razorpay,
            pricing,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn key_id(&self) -> Result<&str, CheckoutError> {
        self.razorpay
            .key_id
            .as_deref()
            .ok_or_else(|| CheckoutError::Configuration("RAZORPAY_KEY_ID is not configured".into()))
    }

    fn key_secret(&self) -> Result<&str, CheckoutError> {
        self.razorpay
            .key_secret
            .as_ref()
            .map(|s| s.reveal())
            .ok_or_else(|| {
                CheckoutError::Configuration("RAZORPAY_KEY_SECRET is not configured".into())
            })
    }

    fn webhook_secret(&self) -> Result<&str, CheckoutError> {
        self.razorpay
            .webhook_secret
            .as_ref()
            .map(|s| s.reveal())
            .ok_or_else(|| {
                CheckoutError::Configuration("RAZORPAY_WEBHOOK_SECRET is not configured".into())
            })
    }
}
