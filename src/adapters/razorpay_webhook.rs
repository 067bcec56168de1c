use {
    crate::{AppState, adapters::api_errors::ApiError},
    axum::{Json, body::Bytes, extract::State, http::HeaderMap},
    serde_json::json,
};

pub const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// Public endpoint. The body is taken as raw bytes so the signature is
/// checked over exactly what the gateway signed.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.engine.process_webhook(&body, signature).await?;
    Ok(Json(json!({"status": outcome.as_str()})))
}
