use {
    crate::AppState,
    axum::{Json, extract::State},
    serde_json::{Value, json},
};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query("SELECT 1").execute(state.engine.pool()).await {
        Ok(_) => "ok",
        Err(err) => {
            tracing::warn!("health probe failed: {err}");
            "unavailable"
        }
    };
    Json(json!({"status": "ok", "database": database}))
}
