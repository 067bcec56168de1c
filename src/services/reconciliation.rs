use {
    super::ReconciliationEngine,
    crate::domain::error::CheckoutError,
    crate::domain::id::{OrderId, ProviderRef},
    crate::domain::money::Currency,
    crate::domain::order::OrderTransition,
    crate::domain::payment::{NewPayment, NewPaymentParams, PaymentStatus, RAZORPAY},
    crate::domain::signature::verify_webhook_signature,
    crate::domain::webhook::{GatewayEvent, ResolvedBy, WebhookOutcome},
    crate::infra::postgres::{order_repo, payment_repo},
};

impl ReconciliationEngine {
    /// Verify, decode and apply one gateway webhook.
    ///
    /// Only a signature problem (or a missing webhook secret) is an error.
    /// Every other path returns an outcome the caller acknowledges with 200,
    /// including bodies we cannot parse and events we cannot map to an order.
    #[tracing::instrument(
        name = "webhook",
        skip_all,
        fields(event = tracing::field::Empty, provider_ref = tracing::field::Empty)
    )]
    pub async fn process_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, CheckoutError> {
        let secret = self.webhook_secret()?;
        let signature = signature
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CheckoutError::SignatureInvalid("missing signature header".into()));

        if let Err(err) = signature.and_then(|sig| verify_webhook_signature(raw_body, sig, secret)) {
            tracing::warn!("webhook signature rejected: {err}");
            return Err(err);
        }

        let event = match GatewayEvent::from_slice(raw_body) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("acknowledging unparseable webhook body: {err}");
                return Ok(WebhookOutcome::Ignored);
            }
        };

        let provider_ref = event.provider_ref();
        let span = tracing::Span::current();
        span.record("event", tracing::field::display(&event.name));
        if let Some(r) = &provider_ref {
            span.record("provider_ref", tracing::field::display(r));
        }

        let Some((order_id, resolved_by)) = self.resolve_order(&event, provider_ref.as_ref()).await
        else {
            tracing::warn!(
                remote_intent_id = event.remote_intent_id().unwrap_or(""),
                "could not resolve local order for webhook"
            );
            return Ok(WebhookOutcome::Unresolved);
        };

        let payment_status = event.kind.payment_status();

        let payment_recorded = match &provider_ref {
            Some(provider_ref) => {
                let payment = NewPayment::new(NewPaymentParams {
                    order_id,
                    provider_ref: provider_ref.clone(),
                    status: payment_status,
                    amount: event.amount(),
                    currency: self.event_currency(&event),
                    raw_payload: event.raw.clone(),
                });
                if let Err(err) = payment_repo::upsert_payment(&self.pool, &payment).await {
                    tracing::error!(
                        order_id = %order_id,
                        status = %payment_status,
                        "failed to record webhook payment, acknowledging anyway: {err}"
                    );
                    return Ok(WebhookOutcome::PaymentNotRecorded { order_id });
                }
                true
            }
            None => false,
        };

        let transition = self
            .apply_outcome(order_id, payment_status, provider_ref.as_ref())
            .await;

        tracing::info!(
            order_id = %order_id,
            resolved_by = ?resolved_by,
            status = %payment_status,
            payment_recorded,
            transition = ?transition,
            "webhook applied"
        );

        Ok(WebhookOutcome::Applied {
            order_id,
            resolved_by,
            payment_status,
            payment_recorded,
            transition,
        })
    }

    /// Metadata, then receipt token, then an existing payment row.
    async fn resolve_order(
        &self,
        event: &GatewayEvent,
        provider_ref: Option<&ProviderRef>,
    ) -> Option<(OrderId, ResolvedBy)> {
        if let Some(found) = event.direct_order_id() {
            return Some(found);
        }

        let provider_ref = provider_ref?;
        match payment_repo::find_order_id(&self.pool, RAZORPAY, provider_ref).await {
            Ok(found) => found.map(|id| (id, ResolvedBy::ExistingPayment)),
            Err(err) => {
                tracing::error!("payment lookup during order resolution failed: {err}");
                None
            }
        }
    }

    fn event_currency(&self, event: &GatewayEvent) -> Currency {
        match event.currency().map(Currency::try_from) {
            Some(Ok(currency)) => currency,
            Some(Err(err)) => {
                tracing::warn!("unrecognised webhook currency, using default: {err}");
                self.pricing.currency
            }
            None => self.pricing.currency,
        }
    }

    /// Apply the ratchet. Failures here are logged and never surface: the
    /// payment row is authoritative and the next related event retries.
    async fn apply_outcome(
        &self,
        order_id: OrderId,
        status: PaymentStatus,
        provider_ref: Option<&ProviderRef>,
    ) -> OrderTransition {
        match status {
            PaymentStatus::Succeeded => {
                match order_repo::set_paid(&self.pool, order_id, provider_ref).await {
                    Ok(Some(previous)) => match previous.after_payment(status) {
                        Some(_) => OrderTransition::MarkedPaid,
                        None => OrderTransition::Unchanged,
                    },
                    Ok(None) => {
                        tracing::warn!(order_id = %order_id, "webhook names an unknown order");
                        OrderTransition::Unchanged
                    }
                    Err(err) => {
                        tracing::error!(order_id = %order_id, "failed to mark order paid: {err}");
                        OrderTransition::Unchanged
                    }
                }
            }
            PaymentStatus::Failed => {
                match order_repo::set_payment_failed_if_pending(&self.pool, order_id).await {
                    Ok(true) => OrderTransition::MarkedPaymentFailed,
                    Ok(false) => OrderTransition::Unchanged,
                    Err(err) => {
                        tracing::warn!(order_id = %order_id, "failed to mark payment_failed: {err}");
                        OrderTransition::Unchanged
                    }
                }
            }
            PaymentStatus::Processing => OrderTransition::Unchanged,
        }
    }
}
