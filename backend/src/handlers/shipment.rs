//! HTTP handlers for shipping orders, order details and loadings

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentOperator;
use crate::services::shipment::{
    AddOrderDetailInput, ContractLoadingSummary, CreateOrderInput, Loading, OrderDetail,
    RecordLoadingInput, ShipmentService, ShippingOrder,
};
use crate::AppState;
use shared::ContractBalance;

/// Optional contract scope for loading lists
#[derive(Debug, Deserialize)]
pub struct ContractQuery {
    pub contract_no: Option<String>,
}

/// Create a shipping order
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<ShippingOrder>> {
    let service = ShipmentService::new(state.db);
    let order = service.create_order(input).await?;
    Ok(Json(order))
}

/// List shipping orders
pub async fn list_orders(State(state): State<AppState>) -> AppResult<Json<Vec<ShippingOrder>>> {
    let service = ShipmentService::new(state.db);
    let orders = service.list_orders().await?;
    Ok(Json(orders))
}

/// Add a detail line to a contract
pub async fn add_order_detail(
    State(state): State<AppState>,
    Json(input): Json<AddOrderDetailInput>,
) -> AppResult<Json<OrderDetail>> {
    let service = ShipmentService::new(state.db);
    let detail = service.add_order_detail(input).await?;
    Ok(Json(detail))
}

/// List the detail lines of a contract
pub async fn list_order_details(
    State(state): State<AppState>,
    Path(contract_no): Path<String>,
) -> AppResult<Json<Vec<OrderDetail>>> {
    let service = ShipmentService::new(state.db);
    let details = service.order_details(&contract_no).await?;
    Ok(Json(details))
}

/// Remove a detail line
pub async fn delete_order_detail(
    State(state): State<AppState>,
    Path(detail_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ShipmentService::new(state.db);
    service.delete_order_detail(detail_id).await?;
    Ok(Json(()))
}

/// Ordered vs. loaded balance of a contract
pub async fn contract_balance(
    State(state): State<AppState>,
    Path(contract_no): Path<String>,
) -> AppResult<Json<ContractBalance>> {
    let service = ShipmentService::new(state.db);
    let balance = service.balance_for_contract(&contract_no).await?;
    Ok(Json(balance))
}

/// Record a container loading against a contract
pub async fn record_loading(
    State(state): State<AppState>,
    CurrentOperator(ctx): CurrentOperator,
    Json(input): Json<RecordLoadingInput>,
) -> AppResult<Json<Loading>> {
    let service = ShipmentService::new(state.db);
    let loading = service.record_loading(&ctx, input).await?;
    Ok(Json(loading))
}

/// List loadings
pub async fn list_loadings(
    State(state): State<AppState>,
    Query(query): Query<ContractQuery>,
) -> AppResult<Json<Vec<Loading>>> {
    let service = ShipmentService::new(state.db);
    let loadings = service.loadings(query.contract_no.as_deref()).await?;
    Ok(Json(loadings))
}

/// Loading counts and totals per contract
pub async fn loading_summary(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ContractLoadingSummary>>> {
    let service = ShipmentService::new(state.db);
    let summary = service.loading_summary().await?;
    Ok(Json(summary))
}
