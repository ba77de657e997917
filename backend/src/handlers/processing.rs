//! HTTP handlers for crop processing endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::reception::FactoryQuery;
use crate::middleware::CurrentOperator;
use crate::services::processing::{
    ProcessingRun, ProcessingRunWithNames, ProcessingService, RecordProcessingInput,
    UpdateProcessingInput,
};
use crate::AppState;

/// Record a processing run
pub async fn record_processing(
    State(state): State<AppState>,
    CurrentOperator(ctx): CurrentOperator,
    Json(input): Json<RecordProcessingInput>,
) -> AppResult<Json<ProcessingRun>> {
    let service = ProcessingService::new(state.db);
    let run = service.record(&ctx, input).await?;
    Ok(Json(run))
}

/// List processing runs
pub async fn list_processing(
    State(state): State<AppState>,
    Query(query): Query<FactoryQuery>,
) -> AppResult<Json<Vec<ProcessingRunWithNames>>> {
    let service = ProcessingService::new(state.db);
    let runs = service.list(query.factory_id).await?;
    Ok(Json(runs))
}

/// Edit a processing run record
pub async fn update_processing(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Json(input): Json<UpdateProcessingInput>,
) -> AppResult<Json<ProcessingRun>> {
    let service = ProcessingService::new(state.db);
    let run = service.update(run_id, input).await?;
    Ok(Json(run))
}

/// Delete a processing run record
pub async fn delete_processing(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ProcessingService::new(state.db);
    service.delete(run_id).await?;
    Ok(Json(()))
}
