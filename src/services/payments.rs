use {
    super::ReconciliationEngine,
    crate::domain::error::CheckoutError,
    crate::domain::gateway::IntentRequest,
    crate::domain::id::{OrderId, ProviderRef, ReceiptToken, UserId},
    crate::domain::money::Money,
    crate::domain::order::{OrderStatus, OrderTransition},
    crate::domain::payment::{NewPayment, NewPaymentParams, PaymentStatus},
    crate::domain::signature::verify_payment_signature,
    crate::infra::postgres::{order_repo, order_repo::OrderHeader, payment_repo},
    serde::Serialize,
    serde_json::json,
};

/// What the client needs to open the gateway checkout. Never carries a secret.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedIntent {
    pub order_id: OrderId,
    pub remote_intent_id: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub public_key: String,
}

/// Values the gateway checkout hands back to the client after payment.
#[derive(Debug, Clone)]
pub struct PaymentProof {
    pub order_id: OrderId,
    pub intent_id: String,
    pub payment_id: String,
    pub signature: String,
}

impl ReconciliationEngine {
    async fn pending_order_for(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderHeader, CheckoutError> {
        let header = order_repo::find_header_for_user(&self.pool, order_id, user_id)
            .await?
            .ok_or_else(|| CheckoutError::NotFound(format!("order {order_id}")))?;

        if header.status != OrderStatus::Pending {
            return Err(CheckoutError::Conflict(format!(
                "order {order_id} is {}, expected pending",
                header.status
            )));
        }
        Ok(header)
    }

    #[tracing::instrument(skip_all, fields(order_id = %order_id, user_id = %user_id))]
    pub async fn create_payment_intent(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<IssuedIntent, CheckoutError> {
        let public_key = self.key_id()?.to_string();
        self.key_secret()?;

        let header = self.pending_order_for(user_id, order_id).await?;

        let request = IntentRequest {
            order_id,
            user_id,
            money: Money::new(header.total, header.currency),
            receipt: ReceiptToken::for_order(order_id),
            capture_on_success: true,
        };
        let intent = self.gateway.create_intent(&request).await?;

        tracing::info!(
            remote_intent_id = %intent.id,
            amount_minor = intent.amount_minor,
            "payment intent created"
        );

        Ok(IssuedIntent {
            order_id,
            remote_intent_id: intent.id,
            amount_minor_units: intent.amount_minor,
            currency: intent.currency,
            public_key,
        })
    }

    /// Client-channel confirmation. The signature is the only proof accepted;
    /// once it checks out and the payment row is stored, a failure to flip
    /// the order is logged and left for the webhook to converge.
    #[tracing::instrument(skip_all, fields(order_id = %proof.order_id, user_id = %user_id))]
    pub async fn verify_payment(
        &self,
        user_id: UserId,
        proof: PaymentProof,
    ) -> Result<OrderTransition, CheckoutError> {
        let secret = self.key_secret()?;
        let header = self.pending_order_for(user_id, proof.order_id).await?;

        if let Err(err) =
            verify_payment_signature(&proof.intent_id, &proof.payment_id, &proof.signature, secret)
        {
            tracing::warn!(
                remote_intent_id = %proof.intent_id,
                provider_ref = %proof.payment_id,
                "payment signature rejected: {err}"
            );
            return Err(err);
        }

        let provider_ref = ProviderRef::new(proof.payment_id.as_str())?;
        let payment = NewPayment::new(NewPaymentParams {
            order_id: header.id,
            provider_ref: provider_ref.clone(),
            status: PaymentStatus::Succeeded,
            amount: Some(header.total),
            currency: header.currency,
            raw_payload: json!({
                "razorpay_order_id": proof.intent_id,
                "razorpay_payment_id": proof.payment_id,
            }),
        });
        payment_repo::upsert_payment(&self.pool, &payment).await?;

        match order_repo::set_paid(&self.pool, header.id, Some(&provider_ref)).await {
            Ok(Some(previous)) if previous != OrderStatus::Paid => {
                tracing::info!(provider_ref = %provider_ref, from = %previous, "order marked paid");
                Ok(OrderTransition::MarkedPaid)
            }
            Ok(_) => Ok(OrderTransition::Unchanged),
            Err(err) => {
                tracing::error!(
                    provider_ref = %provider_ref,
                    "payment recorded but order update failed: {err}"
                );
                Ok(OrderTransition::Unchanged)
            }
        }
    }
}
