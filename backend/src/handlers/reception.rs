//! HTTP handlers for crop reception endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentOperator;
use crate::services::reception::{
    Reception, ReceptionService, ReceptionSummaryRow, ReceptionWithNames, RecordReceptionInput,
    UpdateReceptionInput,
};
use crate::AppState;
use shared::SummaryPeriod;

/// Optional factory scope for list queries
#[derive(Debug, Deserialize)]
pub struct FactoryQuery {
    pub factory_id: Option<Uuid>,
}

/// Parameters for the reception summary roll-up
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub period: SummaryPeriod,
    pub factory_id: Option<Uuid>,
}

/// Record a crop reception
pub async fn record_reception(
    State(state): State<AppState>,
    CurrentOperator(ctx): CurrentOperator,
    Json(input): Json<RecordReceptionInput>,
) -> AppResult<Json<Reception>> {
    let service = ReceptionService::new(state.db);
    let reception = service.record(&ctx, input).await?;
    Ok(Json(reception))
}

/// List receptions
pub async fn list_receptions(
    State(state): State<AppState>,
    Query(query): Query<FactoryQuery>,
) -> AppResult<Json<Vec<ReceptionWithNames>>> {
    let service = ReceptionService::new(state.db);
    let receptions = service.list(query.factory_id).await?;
    Ok(Json(receptions))
}

/// Summarize receptions by calendar period
pub async fn reception_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<Vec<ReceptionSummaryRow>>> {
    let service = ReceptionService::new(state.db);
    let summary = service.summary(query.period, query.factory_id).await?;
    Ok(Json(summary))
}

/// Edit a reception record
pub async fn update_reception(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
    Json(input): Json<UpdateReceptionInput>,
) -> AppResult<Json<Reception>> {
    let service = ReceptionService::new(state.db);
    let reception = service.update(reception_id, input).await?;
    Ok(Json(reception))
}

/// Delete a reception record
pub async fn delete_reception(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ReceptionService::new(state.db);
    service.delete(reception_id).await?;
    Ok(Json(()))
}
