//! Dashboard service: reception actuals against phasing estimates
//!
//! Estimates come from the external phasing service as weekly planned
//! quantities per crop type; actuals are summed from the reception records.
//! The report rolls both up to daily / weekly / monthly / yearly windows
//! ending at the requested date.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::phasing::{PhasingClient, WeeklyPhasing};

/// Dashboard service combining ledgered actuals with external estimates
#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
    phasing: PhasingClient,
}

/// Actual vs. estimated quantity for one crop in one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropVariance {
    pub crop: String,
    pub actual: Decimal,
    pub estimate: Decimal,
    /// `actual - estimate`; negative means reception is behind plan
    pub variance: Decimal,
}

/// Variance report for one factory at one reference date
#[derive(Debug, Clone, Serialize)]
pub struct VarianceReport {
    pub factory_id: Uuid,
    pub date: NaiveDate,
    pub daily: Vec<CropVariance>,
    pub weekly: Vec<CropVariance>,
    pub monthly: Vec<CropVariance>,
    pub yearly: Vec<CropVariance>,
}

/// Row of the actuals query: year-to-date receptions per crop with the
/// narrower windows carved out by FILTER clauses
#[derive(Debug, sqlx::FromRow)]
struct ActualsRow {
    crop: String,
    day_qty: Option<Decimal>,
    week_qty: Option<Decimal>,
    month_qty: Option<Decimal>,
    year_qty: Option<Decimal>,
}

/// Estimate totals per crop for each roll-up window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EstimateRollup {
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
    pub yearly: Decimal,
}

impl DashboardService {
    /// Create a new DashboardService instance
    pub fn new(db: PgPool, phasing: PhasingClient) -> Self {
        Self { db, phasing }
    }

    /// Build the estimates-vs-actuals report for one factory
    pub async fn variance(&self, factory_id: Uuid, date: NaiveDate) -> AppResult<VarianceReport> {
        let estimates = self
            .phasing
            .weekly_phasing(factory_id, date.year(), date)
            .await?;
        let rollups = roll_up_estimates(&estimates, date);

        let actuals = sqlx::query_as::<_, ActualsRow>(
            r#"
            SELECT g.crop,
                   SUM(r.quantity) FILTER (WHERE r.operation_date = $2) AS day_qty,
                   SUM(r.quantity) FILTER (
                       WHERE r.operation_date >= DATE_TRUNC('week', $2::timestamp)::date
                   ) AS week_qty,
                   SUM(r.quantity) FILTER (
                       WHERE r.operation_date >= DATE_TRUNC('month', $2::timestamp)::date
                   ) AS month_qty,
                   SUM(r.quantity) AS year_qty
            FROM receptions r
            JOIN grades g ON g.id = r.grade_id
            WHERE r.factory_id = $1
              AND r.operation_date >= DATE_TRUNC('year', $2::timestamp)::date
              AND r.operation_date <= $2
            GROUP BY g.crop
            "#,
        )
        .bind(factory_id)
        .bind(date)
        .fetch_all(&self.db)
        .await?;

        let mut actual_map: BTreeMap<String, ActualsRow> = actuals
            .into_iter()
            .map(|row| (row.crop.clone(), row))
            .collect();

        // Every crop that appears in either source gets a report line
        let mut crops: Vec<String> = actual_map.keys().cloned().collect();
        for crop in rollups.keys() {
            if !actual_map.contains_key(crop) {
                crops.push(crop.clone());
            }
        }
        crops.sort();

        let mut daily = Vec::new();
        let mut weekly = Vec::new();
        let mut monthly = Vec::new();
        let mut yearly = Vec::new();

        for crop in crops {
            let rollup = rollups.get(&crop).cloned().unwrap_or_default();
            let (day_qty, week_qty, month_qty, year_qty) = match actual_map.remove(&crop) {
                Some(row) => (
                    row.day_qty.unwrap_or(Decimal::ZERO),
                    row.week_qty.unwrap_or(Decimal::ZERO),
                    row.month_qty.unwrap_or(Decimal::ZERO),
                    row.year_qty.unwrap_or(Decimal::ZERO),
                ),
                None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            };

            daily.push(variance_line(&crop, day_qty, rollup.daily));
            weekly.push(variance_line(&crop, week_qty, rollup.weekly));
            monthly.push(variance_line(&crop, month_qty, rollup.monthly));
            yearly.push(variance_line(&crop, year_qty, rollup.yearly));
        }

        Ok(VarianceReport {
            factory_id,
            date,
            daily,
            weekly,
            monthly,
            yearly,
        })
    }
}

fn variance_line(crop: &str, actual: Decimal, estimate: Decimal) -> CropVariance {
    CropVariance {
        crop: crop.to_string(),
        actual,
        estimate,
        variance: actual - estimate,
    }
}

/// Roll weekly phasing rows up to the four report windows for `date`.
///
/// The daily figure prorates the containing week's estimate over its
/// allocated days; monthly sums the weeks booked to the date's budget month;
/// yearly sums the whole fetched year.
pub(crate) fn roll_up_estimates(
    rows: &[WeeklyPhasing],
    date: NaiveDate,
) -> BTreeMap<String, EstimateRollup> {
    let mut rollups: BTreeMap<String, EstimateRollup> = BTreeMap::new();

    for row in rows {
        let rollup = rollups.entry(row.crop_type.clone()).or_default();

        rollup.yearly += row.week_estimate;

        if row.week_start.month() == date.month() && row.week_start.year() == date.year() {
            rollup.monthly += row.week_estimate;
        }

        if row.week_start <= date && date <= row.week_end {
            rollup.weekly += row.week_estimate;
            if row.days_allocated > 0 {
                rollup.daily += row.week_estimate / Decimal::from(row.days_allocated);
            }
        }
    }

    rollups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phasing_row(
        crop: &str,
        week_no: i32,
        start: NaiveDate,
        end: NaiveDate,
        days: i32,
        estimate: i64,
    ) -> WeeklyPhasing {
        WeeklyPhasing {
            bud_year: start.year(),
            period: start.format("%b").to_string(),
            week_no,
            week_start: start,
            week_end: end,
            days_allocated: days,
            factory_id: Uuid::new_v4(),
            crop_type_id: Uuid::new_v4(),
            crop_type: crop.to_string(),
            week_estimate: Decimal::from(estimate),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_estimate_prorates_week_over_allocated_days() {
        let rows = vec![phasing_row(
            "Latex",
            2,
            date(2026, 1, 5),
            date(2026, 1, 11),
            7,
            70,
        )];

        let rollups = roll_up_estimates(&rows, date(2026, 1, 7));
        let latex = &rollups["Latex"];
        assert_eq!(latex.daily, Decimal::from(10));
        assert_eq!(latex.weekly, Decimal::from(70));
    }

    #[test]
    fn test_week_outside_reference_date_counts_only_toward_longer_windows() {
        let rows = vec![
            phasing_row("Latex", 2, date(2026, 1, 5), date(2026, 1, 11), 7, 70),
            phasing_row("Latex", 3, date(2026, 1, 12), date(2026, 1, 18), 7, 140),
        ];

        let rollups = roll_up_estimates(&rows, date(2026, 1, 7));
        let latex = &rollups["Latex"];
        assert_eq!(latex.weekly, Decimal::from(70));
        assert_eq!(latex.monthly, Decimal::from(210));
        assert_eq!(latex.yearly, Decimal::from(210));
    }

    #[test]
    fn test_monthly_rollup_splits_on_week_start_month() {
        let rows = vec![
            phasing_row("Cup lump", 5, date(2026, 1, 26), date(2026, 2, 1), 7, 35),
            phasing_row("Cup lump", 6, date(2026, 2, 2), date(2026, 2, 8), 7, 42),
        ];

        let rollups = roll_up_estimates(&rows, date(2026, 2, 4));
        let cup_lump = &rollups["Cup lump"];
        // Week 5 starts in January, so only week 6 is booked to February
        assert_eq!(cup_lump.monthly, Decimal::from(42));
        assert_eq!(cup_lump.yearly, Decimal::from(77));
    }

    #[test]
    fn test_zero_allocated_days_does_not_divide() {
        let rows = vec![phasing_row(
            "Scrap",
            1,
            date(2026, 1, 1),
            date(2026, 1, 4),
            0,
            20,
        )];

        let rollups = roll_up_estimates(&rows, date(2026, 1, 2));
        assert_eq!(rollups["Scrap"].daily, Decimal::ZERO);
        assert_eq!(rollups["Scrap"].weekly, Decimal::from(20));
    }

    #[test]
    fn test_crops_roll_up_independently() {
        let rows = vec![
            phasing_row("Latex", 2, date(2026, 1, 5), date(2026, 1, 11), 7, 70),
            phasing_row("Scrap", 2, date(2026, 1, 5), date(2026, 1, 11), 7, 14),
        ];

        let rollups = roll_up_estimates(&rows, date(2026, 1, 7));
        assert_eq!(rollups["Latex"].daily, Decimal::from(10));
        assert_eq!(rollups["Scrap"].daily, Decimal::from(2));
    }
}
