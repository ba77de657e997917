//! HTTP handlers for derived stock balances

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::{AppError, AppResult};
use crate::handlers::reception::FactoryQuery;
use crate::services::stock::{CropSummary, StockService};
use crate::AppState;
use shared::{PoolBalance, StockPool};

/// Net balances per (factory, grade, pool)
pub async fn stock_balances(
    State(state): State<AppState>,
    Query(query): Query<FactoryQuery>,
) -> AppResult<Json<Vec<PoolBalance>>> {
    let service = StockService::new(state.db);
    let balances = service.balances(query.factory_id).await?;
    Ok(Json(balances))
}

/// Per-crop totals for one pool
pub async fn stock_summary_by_pool(
    State(state): State<AppState>,
    Path(pool): Path<String>,
) -> AppResult<Json<Vec<CropSummary>>> {
    let pool: StockPool = pool.parse().map_err(|message: String| AppError::Validation {
        field: "pool".to_string(),
        message,
    })?;

    let service = StockService::new(state.db);
    let summary = service.summary_by_pool(pool).await?;
    Ok(Json(summary))
}

/// Pools whose derived balance is negative (data-entry-lag alert)
pub async fn negative_stock_balances(
    State(state): State<AppState>,
    Query(query): Query<FactoryQuery>,
) -> AppResult<Json<Vec<PoolBalance>>> {
    let service = StockService::new(state.db);
    let balances = service.negative_balances(query.factory_id).await?;
    Ok(Json(balances))
}
