use crate::domain::error::CheckoutError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Newtype so the domain error can become an axum response without the
/// domain depending on HTTP.
pub struct ApiError(pub CheckoutError);

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

/// A malformed or incomplete body is a validation error like any other.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CheckoutError::Validation(rejection.body_text()))
    }
}

/// `Json` extractor whose rejections go through [`ApiError`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal error".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            CheckoutError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            CheckoutError::ProductNotFound { product_id } => (
                StatusCode::BAD_REQUEST,
                "product_not_found",
                format!("product {product_id} not found"),
            ),
            CheckoutError::InsufficientStock { .. } => (
                StatusCode::BAD_REQUEST,
                "insufficient_stock",
                self.0.to_string(),
            ),
            CheckoutError::NotFound(what) => {
                (StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
            }
            CheckoutError::Conflict(msg) => (StatusCode::BAD_REQUEST, "invalid_state", msg.clone()),
            CheckoutError::SignatureInvalid(_) => (
                StatusCode::BAD_REQUEST,
                "signature_invalid",
                "signature verification failed".to_string(),
            ),
            CheckoutError::Upstream(msg) => {
                tracing::warn!("payment gateway error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "payment gateway unavailable".to_string(),
                )
            }
            CheckoutError::Configuration(msg) => {
                tracing::error!("configuration error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "configuration_error",
                    "payments are not configured".to_string(),
                )
            }
            CheckoutError::Database(err) => {
                tracing::error!("database error: {err}");
                internal()
            }
            CheckoutError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                internal()
            }
        };

        let mut body = json!({
            "error_code": error_code,
            "message": message,
        });
        if let CheckoutError::InsufficientStock {
            product_id,
            available,
        } = &self.0
        {
            body["product_id"] = json!(product_id);
            body["available"] = json!(available);
        }

        (status, Json(body)).into_response()
    }
}
