//! Client for the crop-phasing estimate service
//!
//! The phasing service is a black box that supplies planned weekly reception
//! quantities per factory and crop type. This client only fetches and types
//! the rows; all roll-up math happens in the dashboard service.

use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Phasing estimate API client
#[derive(Clone)]
pub struct PhasingClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

/// One week of planned reception quantity for a factory and crop type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPhasing {
    pub bud_year: i32,
    /// Budget period label (month) the week belongs to
    pub period: String,
    pub week_no: i32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days_allocated: i32,
    pub factory_id: Uuid,
    pub crop_type_id: Uuid,
    pub crop_type: String,
    pub week_estimate: Decimal,
}

/// Wire format of the phasing service rows
#[derive(Debug, Deserialize)]
struct PhasingRow {
    #[serde(rename = "BudYear")]
    bud_year: i32,
    #[serde(rename = "Period")]
    period: String,
    #[serde(rename = "weekNo")]
    week_no: i32,
    #[serde(rename = "WeekStart")]
    week_start: NaiveDate,
    #[serde(rename = "WeekEnd")]
    week_end: NaiveDate,
    #[serde(rename = "DaysAllocated")]
    days_allocated: i32,
    #[serde(rename = "factoryId")]
    factory_id: Uuid,
    #[serde(rename = "cropTypeId")]
    crop_type_id: Uuid,
    #[serde(rename = "cropType")]
    crop_type: String,
    #[serde(rename = "WkEst")]
    week_estimate: Decimal,
}

impl PhasingClient {
    /// Create a new PhasingClient
    pub fn new(base_url: String, timeout_seconds: u64) -> Self {
        Self {
            client: Client::new(),
            base_url,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    /// Fetch the weekly phasing rows for a factory and budget year
    pub async fn weekly_phasing(
        &self,
        factory_id: Uuid,
        year: i32,
        date: NaiveDate,
    ) -> AppResult<Vec<WeeklyPhasing>> {
        let url = format!(
            "{}/crop-phasing?year={}&factoryId={}&date={}",
            self.base_url, year, factory_id, date
        );

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!("{} - {}", status, body)));
        }

        let rows: Vec<PhasingRow> = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("malformed response: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|row| WeeklyPhasing {
                bud_year: row.bud_year,
                period: row.period,
                week_no: row.week_no,
                week_start: row.week_start,
                week_end: row.week_end,
                days_allocated: row.days_allocated,
                factory_id: row.factory_id,
                crop_type_id: row.crop_type_id,
                crop_type: row.crop_type,
                week_estimate: row.week_estimate,
            })
            .collect())
    }
}
