//! Balance projector over the stock ledger
//!
//! Balances are never stored: every query folds the ledger with
//! `SUM(in - out)` per (factory, grade, pool), so a full replay and an
//! incremental view always agree.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{PoolBalance, StockPool};

/// Stock service deriving balances from the ledger
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Row for the grouped balance query
#[derive(Debug, sqlx::FromRow)]
struct BalanceRow {
    factory_id: Uuid,
    grade_id: Uuid,
    stock_pool: String,
    net_quantity: Decimal,
}

impl TryFrom<BalanceRow> for PoolBalance {
    type Error = AppError;

    fn try_from(row: BalanceRow) -> Result<Self, Self::Error> {
        Ok(PoolBalance {
            factory_id: row.factory_id,
            grade_id: row.grade_id,
            stock_pool: row.stock_pool.parse().map_err(AppError::Internal)?,
            net_quantity: row.net_quantity,
        })
    }
}

/// Total quantity held in a pool for one crop, summed across factories
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CropSummary {
    pub crop: String,
    pub total_quantity: Decimal,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Net stock per (factory, grade, pool), optionally scoped to one factory
    pub async fn balances(&self, factory_id: Option<Uuid>) -> AppResult<Vec<PoolBalance>> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT factory_id, grade_id, stock_pool,
                   SUM(CASE WHEN direction = 'in' THEN quantity ELSE -quantity END) AS net_quantity
            FROM ledger_entries
            WHERE ($1::uuid IS NULL OR factory_id = $1)
            GROUP BY factory_id, grade_id, stock_pool
            ORDER BY factory_id, grade_id, stock_pool
            "#,
        )
        .bind(factory_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PoolBalance::try_from).collect()
    }

    /// Pivot one pool by crop name: total quantity held per crop across the
    /// group, for the stock dashboard cards
    pub async fn summary_by_pool(&self, pool: StockPool) -> AppResult<Vec<CropSummary>> {
        let rows = sqlx::query_as::<_, CropSummary>(
            r#"
            SELECT g.crop,
                   SUM(CASE WHEN l.direction = 'in' THEN l.quantity ELSE -l.quantity END)
                       AS total_quantity
            FROM ledger_entries l
            JOIN grades g ON g.id = l.grade_id
            WHERE l.stock_pool = $1
            GROUP BY g.crop
            ORDER BY g.crop
            "#,
        )
        .bind(pool.as_str())
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Pools whose derived balance has gone negative. Processing debits are
    /// allowed to outrun receptions, so a deficit is a data-entry-lag signal
    /// the operators need to see, not a write-time rejection.
    pub async fn negative_balances(&self, factory_id: Option<Uuid>) -> AppResult<Vec<PoolBalance>> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT factory_id, grade_id, stock_pool,
                   SUM(CASE WHEN direction = 'in' THEN quantity ELSE -quantity END) AS net_quantity
            FROM ledger_entries
            WHERE ($1::uuid IS NULL OR factory_id = $1)
            GROUP BY factory_id, grade_id, stock_pool
            HAVING SUM(CASE WHEN direction = 'in' THEN quantity ELSE -quantity END) < 0
            ORDER BY factory_id, grade_id, stock_pool
            "#,
        )
        .bind(factory_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PoolBalance::try_from).collect()
    }
}
