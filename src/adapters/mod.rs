pub mod api_errors;
pub mod auth;
pub mod health;
pub mod orders;
pub mod payments;
pub mod razorpay_client;
pub mod razorpay_webhook;

use {
    crate::AppState,
    axum::{
        Router,
        extract::DefaultBodyLimit,
        http::StatusCode,
        routing::{get, post},
    },
    std::time::Duration,
    tower_http::timeout::TimeoutLayer,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/orders", post(orders::create_order).get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/payments/razorpay/order", post(payments::create_intent))
        .route("/payments/razorpay/verify", post(payments::verify))
        .route("/payments/razorpay/webhook", post(razorpay_webhook::webhook))
        .layer(DefaultBodyLimit::max(64 * 1024)) // gateway events are a few KB
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
