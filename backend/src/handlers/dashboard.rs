//! HTTP handlers for the estimates-vs-actuals dashboard

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::AppResult;
use crate::external::PhasingClient;
use crate::middleware::CurrentOperator;
use crate::services::dashboard::{DashboardService, VarianceReport};
use crate::AppState;

/// Reference date for the variance report; defaults to today
#[derive(Debug, Deserialize)]
pub struct VarianceQuery {
    pub date: Option<NaiveDate>,
}

/// Estimates-vs-actuals report for the operator's factory
pub async fn variance_report(
    State(state): State<AppState>,
    CurrentOperator(ctx): CurrentOperator,
    Query(query): Query<VarianceQuery>,
) -> AppResult<Json<VarianceReport>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let phasing = PhasingClient::new(
        state.config.phasing.base_url.clone(),
        state.config.phasing.timeout_seconds,
    );
    let service = DashboardService::new(state.db, phasing);
    let report = service.variance(ctx.factory_id, date).await?;
    Ok(Json(report))
}
