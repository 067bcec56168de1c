use {
    crate::{
        AppState,
        adapters::{
            api_errors::{ApiError, ApiJson},
            auth::AuthUser,
        },
        domain::id::OrderId,
        services::payments::{IssuedIntent, PaymentProof},
    },
    axum::{Json, extract::State},
    serde::Deserialize,
    serde_json::{Value, json},
};

#[derive(Debug, Deserialize)]
pub struct CreateIntentBody {
    order_id: OrderId,
}

pub async fn create_intent(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateIntentBody>,
) -> Result<Json<IssuedIntent>, ApiError> {
    let intent = state
        .engine
        .create_payment_intent(user_id, body.order_id)
        .await?;
    Ok(Json(intent))
}

/// Accepts both our field names and the ones the Razorpay checkout widget
/// hands to the client.
#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    order_id: OrderId,
    #[serde(alias = "razorpay_order_id")]
    remote_intent_id: String,
    #[serde(alias = "razorpay_payment_id")]
    remote_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    signature: String,
}

pub async fn verify(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<VerifyBody>,
) -> Result<Json<Value>, ApiError> {
    let proof = PaymentProof {
        order_id: body.order_id,
        intent_id: body.remote_intent_id,
        payment_id: body.remote_payment_id,
        signature: body.signature,
    };
    state.engine.verify_payment(user_id, proof).await?;
    Ok(Json(json!({"status": "verified"})))
}
