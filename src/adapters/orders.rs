use {
    crate::{
        AppState,
        adapters::{
            api_errors::{ApiError, ApiJson},
            auth::AuthUser,
        },
        domain::{id::OrderId, order::OrderRequest},
        services::checkout::{OrderDetail, OrderPage, PageRequest, PlacedOrder},
    },
    axum::{
        Json,
        extract::{Path, Query, State},
        http::StatusCode,
    },
    serde::Deserialize,
};

pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(request): ApiJson<OrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>), ApiError> {
    let placed = state.engine.create_order(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<i64>,
    limit: Option<i64>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderPage>, ApiError> {
    let page = PageRequest::new(params.page, params.limit);
    Ok(Json(state.engine.list_orders(user_id, page).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetail>, ApiError> {
    let detail = state.engine.get_order(user_id, OrderId::new(order_id)).await?;
    Ok(Json(detail))
}
