use {
    crate::config::{RazorpayConfig, Secret},
    crate::domain::{
        error::CheckoutError,
        gateway::{IntentRequest, PaymentGateway, RemoteIntent},
    },
    serde::{Deserialize, Serialize},
    std::{future::Future, pin::Pin, time::Duration},
};

/// Creates remote orders through the Razorpay REST API.
pub struct RazorpayGateway {
    client: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: Secret,
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
    payment_capture: u8,
    notes: Notes,
}

#[derive(Serialize)]
struct Notes {
    order_id: i64,
    user_id: i64,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

impl RazorpayGateway {
    /// `None` when either credential is missing; callers then run without a
    /// gateway and the intent endpoint fails closed.
    pub fn from_config(config: &RazorpayConfig) -> Result<Option<Self>, CheckoutError> {
        let (Some(key_id), Some(key_secret)) = (&config.key_id, &config.key_secret) else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("http client: {e}")))?;

        Ok(Some(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            key_id: key_id.clone(),
            key_secret: key_secret.clone(),
        }))
    }

    async fn create_intent_inner(&self, request: &IntentRequest) -> Result<RemoteIntent, CheckoutError> {
        let body = CreateOrderBody {
            amount: request.money.amount().minor_units(),
            currency: request.money.currency().as_str(),
            receipt: request.receipt.to_string(),
            payment_capture: u8::from(request.capture_on_success),
            notes: Notes {
                order_id: request.order_id.get(),
                user_id: request.user_id.get(),
            },
        };

        let resp = self
            .client
            .post(format!("{}/v1/orders", self.api_base))
            .basic_auth(&self.key_id, Some(self.key_secret.reveal()))
            .json(&body)
            .send()
            .await
            .map_err(|e| CheckoutError::Upstream(format!("create order request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(CheckoutError::Upstream(format!(
                "create order returned {status}: {detail}"
            )));
        }

        let created: CreateOrderResponse = resp
            .json()
            .await
            .map_err(|e| CheckoutError::Upstream(format!("create order response: {e}")))?;

        Ok(RemoteIntent {
            id: created.id,
            amount_minor: created.amount,
            currency: created.currency,
        })
    }
}

impl PaymentGateway for RazorpayGateway {
    fn create_intent(
        &self,
        request: &IntentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteIntent, CheckoutError>> + Send + '_>> {
        let request = request.clone();
        Box::pin(async move { self.create_intent_inner(&request).await })
    }
}

/// Stand-in used when credentials are absent. The engine checks
/// configuration first, so this is only reached by a misconfigured caller.
pub struct UnconfiguredGateway;

impl PaymentGateway for UnconfiguredGateway {
    fn create_intent(
        &self,
        _request: &IntentRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteIntent, CheckoutError>> + Send + '_>> {
        Box::pin(async {
            Err(CheckoutError::Configuration(
                "payment gateway credentials are not configured".into(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_yield_no_gateway() {
        let cfg = RazorpayConfig {
            key_id: Some("rzp_test".into()),
            ..RazorpayConfig::default()
        };
        assert!(RazorpayGateway::from_config(&cfg).unwrap().is_none());
    }

    #[test]
    fn body_shape() {
        let body = CreateOrderBody {
            amount: 69_620,
            currency: "INR",
            receipt: "order_5".into(),
            payment_capture: 1,
            notes: Notes {
                order_id: 5,
                user_id: 2,
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "amount": 69620, "currency": "INR", "receipt": "order_5",
                "payment_capture": 1, "notes": {"order_id": 5, "user_id": 2}
            })
        );
    }
}
