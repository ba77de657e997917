//! Processing recorder for crop-to-rubber runs
//!
//! A run moves quantity between the two stock pools: a debit against the
//! unprocessed pool (input grade, resolved through the grade map) and a
//! credit to the processed pool (output grade). Both entries and the run row
//! commit in one transaction; a partial commit would silently create or
//! destroy stock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use shared::{
    validate_quantity, EntryDirection, EntrySource, LedgerMovement, OperatorContext, StockPool,
};

/// Ledger description labels for the two sides of a run
const PROCESSING_DEBIT_LABEL: &str = "Crop processed";
const PROCESSING_CREDIT_LABEL: &str = "Rubber produced";

/// Processing service for recording production runs
#[derive(Clone)]
pub struct ProcessingService {
    db: PgPool,
}

/// A recorded processing run
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProcessingRun {
    pub id: Uuid,
    pub operation_date: NaiveDate,
    pub factory_id: Uuid,
    pub output_grade_id: Uuid,
    pub quantity: Decimal,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Processing run with reference names joined for display
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProcessingRunWithNames {
    pub id: Uuid,
    pub operation_date: NaiveDate,
    pub factory_id: Uuid,
    pub factory_name: String,
    pub output_grade_id: Uuid,
    pub output_grade: String,
    pub quantity: Decimal,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a processing run
#[derive(Debug, Deserialize)]
pub struct RecordProcessingInput {
    pub operation_date: NaiveDate,
    pub output_grade_id: Uuid,
    pub quantity: Decimal,
}

/// Input for editing a processing run record
#[derive(Debug, Deserialize)]
pub struct UpdateProcessingInput {
    pub operation_date: Option<NaiveDate>,
    pub output_grade_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
}

impl ProcessingService {
    /// Create a new ProcessingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a processing run and its two ledger movements atomically.
    ///
    /// Steps: validate, resolve the input grade through the grade map (an
    /// unmapped output grade is a configuration gap and fails before any
    /// write), then in one transaction insert the run row, debit the
    /// unprocessed pool and credit the processed pool. No balance check is
    /// made before the debit: a pool may go negative when receptions lag,
    /// and the deficit stays visible through the stock alerts.
    pub async fn record(
        &self,
        ctx: &OperatorContext,
        input: RecordProcessingInput,
    ) -> AppResult<ProcessingRun> {
        validate_quantity(input.quantity).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
        })?;

        self.check_references(ctx.factory_id, input.output_grade_id)
            .await?;

        let input_grade_id = self.resolve_input_grade(input.output_grade_id).await?;

        let mut tx = self.db.begin().await?;

        let run = sqlx::query_as::<_, ProcessingRun>(
            r#"
            INSERT INTO processing_runs
                (operation_date, factory_id, output_grade_id, quantity, recorded_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, operation_date, factory_id, output_grade_id, quantity,
                      recorded_by, created_at, updated_at
            "#,
        )
        .bind(input.operation_date)
        .bind(ctx.factory_id)
        .bind(input.output_grade_id)
        .bind(input.quantity)
        .bind(ctx.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| AppError::ProcessingRecordingFailed(Box::new(err.into())))?;

        let debit = LedgerMovement {
            transaction_date: input.operation_date,
            factory_id: ctx.factory_id,
            grade_id: input_grade_id,
            stock_pool: StockPool::Unprocessed,
            direction: EntryDirection::Out,
            source: EntrySource::Processing,
            quantity: input.quantity,
        };
        LedgerService::upsert_with(&mut *tx, &debit, PROCESSING_DEBIT_LABEL)
            .await
            .map_err(|err| AppError::ProcessingRecordingFailed(Box::new(err)))?;

        let credit = LedgerMovement {
            transaction_date: input.operation_date,
            factory_id: ctx.factory_id,
            grade_id: input.output_grade_id,
            stock_pool: StockPool::Processed,
            direction: EntryDirection::In,
            source: EntrySource::Processing,
            quantity: input.quantity,
        };
        LedgerService::upsert_with(&mut *tx, &credit, PROCESSING_CREDIT_LABEL)
            .await
            .map_err(|err| AppError::ProcessingRecordingFailed(Box::new(err)))?;

        tx.commit()
            .await
            .map_err(|err| AppError::ProcessingRecordingFailed(Box::new(err.into())))?;

        Ok(run)
    }

    /// List processing runs with reference names, newest first
    pub async fn list(&self, factory_id: Option<Uuid>) -> AppResult<Vec<ProcessingRunWithNames>> {
        let runs = sqlx::query_as::<_, ProcessingRunWithNames>(
            r#"
            SELECT p.id, p.operation_date, p.factory_id, f.factory_name,
                   p.output_grade_id, g.crop AS output_grade,
                   p.quantity, p.recorded_by, p.created_at
            FROM processing_runs p
            JOIN factories f ON f.id = p.factory_id
            JOIN grades g ON g.id = p.output_grade_id
            WHERE ($1::uuid IS NULL OR p.factory_id = $1)
            ORDER BY p.operation_date DESC, p.created_at DESC
            "#,
        )
        .bind(factory_id)
        .fetch_all(&self.db)
        .await?;

        Ok(runs)
    }

    /// Edit a processing run record. As with receptions, the ledger entries
    /// the run produced stay in place; corrections go through manual
    /// transactions.
    pub async fn update(&self, id: Uuid, input: UpdateProcessingInput) -> AppResult<ProcessingRun> {
        if let Some(quantity) = input.quantity {
            validate_quantity(quantity).map_err(|message| AppError::Validation {
                field: "quantity".to_string(),
                message: message.to_string(),
            })?;
        }

        if let Some(output_grade_id) = input.output_grade_id {
            // The replacement grade must still be mapped
            self.resolve_input_grade(output_grade_id).await?;
        }

        let run = sqlx::query_as::<_, ProcessingRun>(
            r#"
            UPDATE processing_runs
            SET operation_date = COALESCE($2, operation_date),
                output_grade_id = COALESCE($3, output_grade_id),
                quantity = COALESCE($4, quantity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, operation_date, factory_id, output_grade_id, quantity,
                      recorded_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.operation_date)
        .bind(input.output_grade_id)
        .bind(input.quantity)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::ReferenceNotFound("output grade".to_string())
            }
            _ => AppError::DatabaseError(err),
        })?
        .ok_or_else(|| AppError::NotFound("Processing run".to_string()))?;

        Ok(run)
    }

    /// Delete a processing run record (ledger untouched)
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM processing_runs WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Processing run".to_string()));
        }

        Ok(())
    }

    /// Resolve the raw input grade a processed output grade consumes.
    /// The grade map is static configuration; a miss is fatal, not retryable.
    async fn resolve_input_grade(&self, output_grade_id: Uuid) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT input_grade_id FROM grade_mappings WHERE output_grade_id = $1",
        )
        .bind(output_grade_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::UnmappedGrade { output_grade_id })
    }

    /// Reject unknown references before anything is written
    async fn check_references(&self, factory_id: Uuid, output_grade_id: Uuid) -> AppResult<()> {
        let factory_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM factories WHERE id = $1)")
                .bind(factory_id)
                .fetch_one(&self.db)
                .await?;
        if !factory_exists {
            return Err(AppError::ReferenceNotFound("factory".to_string()));
        }

        // Runs are recorded against factory output grades
        let grade_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM grades WHERE id = $1 AND nature = 'factory')",
        )
        .bind(output_grade_id)
        .fetch_one(&self.db)
        .await?;
        if !grade_exists {
            return Err(AppError::ReferenceNotFound("output grade".to_string()));
        }

        Ok(())
    }
}
