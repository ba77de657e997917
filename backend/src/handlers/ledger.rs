//! HTTP handlers for the stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentOperator;
use crate::services::ledger::{
    LedgerFilter, LedgerService, ManualEntryInput, UpdateManualEntryInput,
};
use crate::AppState;
use shared::LedgerEntry;

/// List ledger entries with optional filters
pub async fn list_entries(
    State(state): State<AppState>,
    Query(filter): Query<LedgerFilter>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let service = LedgerService::new(state.db);
    let entries = service.list(&filter).await?;
    Ok(Json(entries))
}

/// Record a manual stock adjustment
pub async fn record_manual_entry(
    State(state): State<AppState>,
    CurrentOperator(ctx): CurrentOperator,
    Json(input): Json<ManualEntryInput>,
) -> AppResult<Json<LedgerEntry>> {
    let service = LedgerService::new(state.db);
    let entry = service.record_manual(&ctx, input).await?;
    Ok(Json(entry))
}

/// Correct a manual ledger entry
pub async fn update_manual_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(input): Json<UpdateManualEntryInput>,
) -> AppResult<Json<LedgerEntry>> {
    let service = LedgerService::new(state.db);
    let entry = service.update_manual(entry_id, input).await?;
    Ok(Json(entry))
}

/// Delete a manual ledger entry
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = LedgerService::new(state.db);
    service.delete(entry_id).await?;
    Ok(Json(()))
}

/// Date of the most recent movement
pub async fn last_transaction_date(
    State(state): State<AppState>,
    Query(filter): Query<LedgerFilter>,
) -> AppResult<Json<Option<NaiveDate>>> {
    let service = LedgerService::new(state.db);
    let last = service.last_transaction_date(filter.factory_id).await?;
    Ok(Json(last))
}

/// Export filtered entries as CSV
pub async fn export_entries(
    State(state): State<AppState>,
    Query(filter): Query<LedgerFilter>,
) -> AppResult<impl IntoResponse> {
    let service = LedgerService::new(state.db);
    let csv_data = service.export_csv(&filter).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"ledger-entries.csv\"",
            ),
        ],
        csv_data,
    ))
}
