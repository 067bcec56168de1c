use {super::id::ProductId, thiserror::Error};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    #[error("insufficient stock for product {product_id}: {available} available")]
    InsufficientStock { product_id: ProductId, available: i32 },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("payment gateway: {0}")]
    Upstream(String),

    #[error("configuration: {0}")]
    Configuration(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
