//! Reception recorder for crop deliveries into the factories
//!
//! A reception and its ledger movement commit together: a reception row must
//! never exist without the matching unprocessed-pool credit.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use shared::{
    validate_quantity, EntryDirection, EntrySource, LedgerMovement, OperatorContext, StockPool,
    SummaryPeriod,
};

/// Ledger description label for reception credits
const RECEPTION_LABEL: &str = "Total crop received";

/// Reception service for recording crop deliveries
#[derive(Clone)]
pub struct ReceptionService {
    db: PgPool,
}

/// A recorded crop reception
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Reception {
    pub id: Uuid,
    pub operation_date: NaiveDate,
    pub factory_id: Uuid,
    pub grade_id: Uuid,
    pub supply_unit_id: Option<Uuid>,
    pub quantity: Decimal,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reception with reference names joined for display
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReceptionWithNames {
    pub id: Uuid,
    pub operation_date: NaiveDate,
    pub factory_id: Uuid,
    pub factory_name: String,
    pub grade_id: Uuid,
    pub crop: String,
    pub supply_unit_id: Option<Uuid>,
    pub supply_unit: Option<String>,
    pub quantity: Decimal,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a reception
#[derive(Debug, Deserialize)]
pub struct RecordReceptionInput {
    pub operation_date: NaiveDate,
    pub grade_id: Uuid,
    pub supply_unit_id: Option<Uuid>,
    pub quantity: Decimal,
}

/// Input for editing a reception record
#[derive(Debug, Deserialize)]
pub struct UpdateReceptionInput {
    pub operation_date: Option<NaiveDate>,
    pub grade_id: Option<Uuid>,
    pub supply_unit_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
}

/// One roll-up row of the reception summary
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReceptionSummaryRow {
    pub factory_id: Uuid,
    pub factory_name: String,
    pub grade_id: Uuid,
    pub crop: String,
    pub period: NaiveDate,
    pub total_quantity: Decimal,
}

impl ReceptionService {
    /// Create a new ReceptionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a crop delivery and its ledger credit atomically.
    ///
    /// Steps: validate, insert the reception row, upsert the ledger movement
    /// (unprocessed / in / reception, keyed by date + factory + grade). Any
    /// step failing rolls the whole transaction back.
    pub async fn record(
        &self,
        ctx: &OperatorContext,
        input: RecordReceptionInput,
    ) -> AppResult<Reception> {
        validate_quantity(input.quantity).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
        })?;

        self.check_references(ctx.factory_id, input.grade_id, input.supply_unit_id)
            .await?;

        let mut tx = self.db.begin().await?;

        let reception = sqlx::query_as::<_, Reception>(
            r#"
            INSERT INTO receptions
                (operation_date, factory_id, grade_id, supply_unit_id, quantity, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, operation_date, factory_id, grade_id, supply_unit_id, quantity,
                      recorded_by, created_at, updated_at
            "#,
        )
        .bind(input.operation_date)
        .bind(ctx.factory_id)
        .bind(input.grade_id)
        .bind(input.supply_unit_id)
        .bind(input.quantity)
        .bind(ctx.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| AppError::ReceptionRecordingFailed(Box::new(err.into())))?;

        let movement = LedgerMovement {
            transaction_date: input.operation_date,
            factory_id: ctx.factory_id,
            grade_id: input.grade_id,
            stock_pool: StockPool::Unprocessed,
            direction: EntryDirection::In,
            source: EntrySource::Reception,
            quantity: input.quantity,
        };

        LedgerService::upsert_with(&mut *tx, &movement, RECEPTION_LABEL)
            .await
            .map_err(|err| AppError::ReceptionRecordingFailed(Box::new(err)))?;

        tx.commit()
            .await
            .map_err(|err| AppError::ReceptionRecordingFailed(Box::new(err.into())))?;

        Ok(reception)
    }

    /// List receptions with reference names, newest first
    pub async fn list(&self, factory_id: Option<Uuid>) -> AppResult<Vec<ReceptionWithNames>> {
        let receptions = sqlx::query_as::<_, ReceptionWithNames>(
            r#"
            SELECT r.id, r.operation_date, r.factory_id, f.factory_name,
                   r.grade_id, g.crop, r.supply_unit_id, su.name AS supply_unit,
                   r.quantity, r.recorded_by, r.created_at
            FROM receptions r
            JOIN factories f ON f.id = r.factory_id
            JOIN grades g ON g.id = r.grade_id
            LEFT JOIN supply_units su ON su.id = r.supply_unit_id
            WHERE ($1::uuid IS NULL OR r.factory_id = $1)
            ORDER BY r.operation_date DESC, r.created_at DESC
            "#,
        )
        .bind(factory_id)
        .fetch_all(&self.db)
        .await?;

        Ok(receptions)
    }

    /// Roll up received quantities by factory, grade and calendar period
    pub async fn summary(
        &self,
        period: SummaryPeriod,
        factory_id: Option<Uuid>,
    ) -> AppResult<Vec<ReceptionSummaryRow>> {
        let rows = sqlx::query_as::<_, ReceptionSummaryRow>(
            r#"
            SELECT f.id AS factory_id, f.factory_name,
                   g.id AS grade_id, g.crop,
                   DATE_TRUNC($1, r.operation_date::timestamp)::date AS period,
                   SUM(r.quantity) AS total_quantity
            FROM receptions r
            JOIN factories f ON f.id = r.factory_id
            JOIN grades g ON g.id = r.grade_id
            WHERE ($2::uuid IS NULL OR r.factory_id = $2)
            GROUP BY f.id, f.factory_name, g.id, g.crop, period
            ORDER BY period, f.factory_name, g.crop
            "#,
        )
        .bind(period.as_str())
        .bind(factory_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Edit a reception record. The ledger entry it originally produced is
    /// left untouched (entries outlive domain edits); stock corrections go
    /// through manual transactions.
    pub async fn update(&self, id: Uuid, input: UpdateReceptionInput) -> AppResult<Reception> {
        if let Some(quantity) = input.quantity {
            validate_quantity(quantity).map_err(|message| AppError::Validation {
                field: "quantity".to_string(),
                message: message.to_string(),
            })?;
        }

        let reception = sqlx::query_as::<_, Reception>(
            r#"
            UPDATE receptions
            SET operation_date = COALESCE($2, operation_date),
                grade_id = COALESCE($3, grade_id),
                supply_unit_id = COALESCE($4, supply_unit_id),
                quantity = COALESCE($5, quantity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, operation_date, factory_id, grade_id, supply_unit_id, quantity,
                      recorded_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.operation_date)
        .bind(input.grade_id)
        .bind(input.supply_unit_id)
        .bind(input.quantity)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::ReferenceNotFound("grade or supply unit".to_string())
            }
            _ => AppError::DatabaseError(err),
        })?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        Ok(reception)
    }

    /// Delete a reception record (ledger untouched, as with `update`)
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM receptions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Reception".to_string()));
        }

        Ok(())
    }

    /// Reject unknown references before anything is written
    async fn check_references(
        &self,
        factory_id: Uuid,
        grade_id: Uuid,
        supply_unit_id: Option<Uuid>,
    ) -> AppResult<()> {
        let factory_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM factories WHERE id = $1)")
                .bind(factory_id)
                .fetch_one(&self.db)
                .await?;
        if !factory_exists {
            return Err(AppError::ReferenceNotFound("factory".to_string()));
        }

        // Receptions take field grades (raw crop), not factory output grades
        let grade_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM grades WHERE id = $1 AND nature = 'field')",
        )
        .bind(grade_id)
        .fetch_one(&self.db)
        .await?;
        if !grade_exists {
            return Err(AppError::ReferenceNotFound("field grade".to_string()));
        }

        if let Some(supply_unit_id) = supply_unit_id {
            let unit_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM supply_units WHERE id = $1)",
            )
            .bind(supply_unit_id)
            .fetch_one(&self.db)
            .await?;
            if !unit_exists {
                return Err(AppError::ReferenceNotFound("supply unit".to_string()));
            }
        }

        Ok(())
    }
}
