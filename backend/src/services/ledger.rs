//! Ledger entry store: the durable append/merge log of stock movements
//!
//! Writes go through a single-statement natural-key upsert, so a repeated or
//! retried submission accumulates into the existing row instead of creating a
//! duplicate, and concurrent submissions for the same key serialize at the
//! database row without an application-level read-modify-write.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    validate_description, validate_quantity, EntryDirection, EntrySource, LedgerEntry,
    LedgerMovement, OperatorContext, StockPool,
};

/// Ledger service managing the stock movement log
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Database row for a ledger entry. Enum-ish columns are TEXT in storage and
/// validated when the row is decoded.
#[derive(Debug, sqlx::FromRow)]
struct LedgerEntryRow {
    id: Uuid,
    transaction_date: NaiveDate,
    factory_id: Uuid,
    grade_id: Uuid,
    stock_pool: String,
    direction: String,
    source: String,
    quantity: Decimal,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = AppError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        Ok(LedgerEntry {
            id: row.id,
            transaction_date: row.transaction_date,
            factory_id: row.factory_id,
            grade_id: row.grade_id,
            stock_pool: row.stock_pool.parse().map_err(AppError::Internal)?,
            direction: row.direction.parse().map_err(AppError::Internal)?,
            source: row.source.parse().map_err(AppError::Internal)?,
            quantity: row.quantity,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Filter for listing ledger entries
#[derive(Debug, Default, Deserialize)]
pub struct LedgerFilter {
    pub factory_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub stock_pool: Option<StockPool>,
}

/// Input for recording a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct ManualEntryInput {
    pub transaction_date: NaiveDate,
    pub grade_id: Uuid,
    pub stock_pool: StockPool,
    pub direction: EntryDirection,
    pub quantity: Decimal,
    pub description: String,
}

/// Input for correcting a manual ledger entry
#[derive(Debug, Deserialize)]
pub struct UpdateManualEntryInput {
    pub transaction_date: Option<NaiveDate>,
    pub grade_id: Option<Uuid>,
    pub stock_pool: Option<StockPool>,
    pub direction: Option<EntryDirection>,
    pub quantity: Option<Decimal>,
    pub description: Option<String>,
}

const ENTRY_COLUMNS: &str = "id, transaction_date, factory_id, grade_id, stock_pool, direction, \
                             source, quantity, description, created_at, updated_at";

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert a movement, or merge it additively into the row holding its
    /// natural key. Executes as one statement; the recomputed description
    /// embeds the post-merge total and the transaction date.
    pub async fn upsert(&self, movement: &LedgerMovement, label: &str) -> AppResult<LedgerEntry> {
        Self::upsert_with(&self.db, movement, label).await
    }

    /// Upsert against an arbitrary executor, so recorders can call it inside
    /// their own open transaction.
    pub(crate) async fn upsert_with<'e, E>(
        executor: E,
        movement: &LedgerMovement,
        label: &str,
    ) -> AppResult<LedgerEntry>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            INSERT INTO ledger_entries
                (transaction_date, factory_id, grade_id, stock_pool, direction, source,
                 quantity, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7,
                    $8 || ' on ' || to_char($1, 'YYYY-MM-DD') || ': ' || $7::text || ' t')
            ON CONFLICT (transaction_date, factory_id, grade_id, stock_pool, direction, source)
            DO UPDATE SET
                quantity = ledger_entries.quantity + EXCLUDED.quantity,
                description = $8 || ' on ' || to_char($1, 'YYYY-MM-DD') || ': '
                              || (ledger_entries.quantity + EXCLUDED.quantity)::text || ' t',
                updated_at = NOW()
            RETURNING id, transaction_date, factory_id, grade_id, stock_pool, direction, source,
                      quantity, description, created_at, updated_at
            "#,
        )
        .bind(movement.transaction_date)
        .bind(movement.factory_id)
        .bind(movement.grade_id)
        .bind(movement.stock_pool.as_str())
        .bind(movement.direction.as_str())
        .bind(movement.source.as_str())
        .bind(movement.quantity)
        .bind(label)
        .fetch_one(executor)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }

    /// List ledger entries, newest first
    pub async fn list(&self, filter: &LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE ($1::uuid IS NULL OR factory_id = $1)
              AND ($2::date IS NULL OR transaction_date >= $2)
              AND ($3::date IS NULL OR transaction_date <= $3)
              AND ($4::text IS NULL OR stock_pool = $4)
            ORDER BY transaction_date DESC, created_at DESC
            "#
        ))
        .bind(filter.factory_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.stock_pool.map(|pool| pool.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// Record a manual stock adjustment. The operator's description doubles
    /// as the entry label, so a merged correction still reads as its total.
    pub async fn record_manual(
        &self,
        ctx: &OperatorContext,
        input: ManualEntryInput,
    ) -> AppResult<LedgerEntry> {
        validate_quantity(input.quantity).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
        })?;
        validate_description(&input.description).map_err(|message| AppError::Validation {
            field: "description".to_string(),
            message: message.to_string(),
        })?;

        let movement = LedgerMovement {
            transaction_date: input.transaction_date,
            factory_id: ctx.factory_id,
            grade_id: input.grade_id,
            stock_pool: input.stock_pool,
            direction: input.direction,
            source: EntrySource::Manual,
            quantity: input.quantity,
        };

        self.upsert(&movement, input.description.trim()).await
    }

    /// Correct a manual entry in place. Only manual entries may be edited;
    /// recorder-owned entries are immutable outside their recorders.
    pub async fn update_manual(
        &self,
        id: Uuid,
        input: UpdateManualEntryInput,
    ) -> AppResult<LedgerEntry> {
        if let Some(quantity) = input.quantity {
            validate_quantity(quantity).map_err(|message| AppError::Validation {
                field: "quantity".to_string(),
                message: message.to_string(),
            })?;
        }
        if let Some(description) = &input.description {
            validate_description(description).map_err(|message| AppError::Validation {
                field: "description".to_string(),
                message: message.to_string(),
            })?;
        }

        self.require_manual(id).await?;

        let row = sqlx::query_as::<_, LedgerEntryRow>(&format!(
            r#"
            UPDATE ledger_entries
            SET transaction_date = COALESCE($2, transaction_date),
                grade_id = COALESCE($3, grade_id),
                stock_pool = COALESCE($4, stock_pool),
                direction = COALESCE($5, direction),
                quantity = COALESCE($6, quantity),
                description = COALESCE($7, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.transaction_date)
        .bind(input.grade_id)
        .bind(input.stock_pool.map(|pool| pool.as_str()))
        .bind(input.direction.map(|direction| direction.as_str()))
        .bind(input.quantity)
        .bind(input.description.as_deref().map(str::trim))
        .fetch_one(&self.db)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateEntry("ledger entry key".to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::ReferenceNotFound("grade".to_string())
            }
            _ => AppError::DatabaseError(err),
        })?;

        row.try_into()
    }

    /// Delete a ledger entry by id. Direct removal with no merge semantics,
    /// restricted to manual entries.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.require_manual(id).await?;

        let result = sqlx::query("DELETE FROM ledger_entries WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Ledger entry".to_string()));
        }

        Ok(())
    }

    /// Date of the most recent movement, optionally scoped to one factory
    pub async fn last_transaction_date(
        &self,
        factory_id: Option<Uuid>,
    ) -> AppResult<Option<NaiveDate>> {
        let last = sqlx::query_scalar::<_, Option<NaiveDate>>(
            r#"
            SELECT MAX(transaction_date)
            FROM ledger_entries
            WHERE ($1::uuid IS NULL OR factory_id = $1)
            "#,
        )
        .bind(factory_id)
        .fetch_one(&self.db)
        .await?;

        Ok(last)
    }

    /// Export filtered entries as CSV for the reporting screens
    pub async fn export_csv(&self, filter: &LedgerFilter) -> AppResult<String> {
        let entries = self.list(filter).await?;

        let mut writer = csv::Writer::from_writer(vec![]);
        for entry in &entries {
            writer
                .serialize(entry)
                .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding: {}", e)))
    }

    /// Reject edits against entries owned by the recorders
    async fn require_manual(&self, id: Uuid) -> AppResult<()> {
        let source = sqlx::query_scalar::<_, String>(
            "SELECT source FROM ledger_entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ledger entry".to_string()))?;

        if source != EntrySource::Manual.as_str() {
            return Err(AppError::Validation {
                field: "id".to_string(),
                message: "Only manual entries can be edited or deleted".to_string(),
            });
        }

        Ok(())
    }
}

/// Map a write failure per the store contract: a broken reference surfaces as
/// a domain error, anything else aborts the enclosing transaction as a ledger
/// write failure.
fn map_write_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::ReferenceNotFound("factory or grade".to_string())
        }
        _ => AppError::LedgerWriteFailed(err),
    }
}
