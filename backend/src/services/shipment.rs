//! Shipment reconciler for sales contracts
//!
//! A contract's ordered quantity is the sum of its order detail lines;
//! loadings consume it. The balance is always computed from those two tables,
//! and a loading that would overshoot the remaining quantity is rejected at
//! submission time.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_contract_no, validate_quantity, ContractBalance, OperatorContext};

/// Shipment service managing contracts, order details and loadings
#[derive(Clone)]
pub struct ShipmentService {
    db: PgPool,
}

/// A sales contract header
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShippingOrder {
    pub id: Uuid,
    pub contract_no: String,
    pub order_date: NaiveDate,
    pub buyer: String,
    pub period: String,
    pub destination: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a contract: class / grade / packing / quantity
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderDetail {
    pub id: Uuid,
    pub contract_no: String,
    pub class: String,
    pub grade_id: Uuid,
    pub packing: String,
    pub qty: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A recorded container loading against a contract
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Loading {
    pub id: Uuid,
    pub contract_no: String,
    pub factory_id: Uuid,
    pub loading_date: NaiveDate,
    pub depart_date: Option<NaiveDate>,
    pub vessel: String,
    pub container_no: String,
    pub seal_no: Option<String>,
    pub tally_no: Option<String>,
    pub qty: Decimal,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Per-contract loading roll-up
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContractLoadingSummary {
    pub contract_no: String,
    pub total_loadings: i64,
    pub loaded_qty: Decimal,
}

/// Input for creating a shipping order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub contract_no: String,
    pub order_date: NaiveDate,
    pub buyer: String,
    pub period: String,
    pub destination: String,
}

/// Input for adding an order detail line
#[derive(Debug, Deserialize)]
pub struct AddOrderDetailInput {
    pub contract_no: String,
    pub class: String,
    pub grade_id: Uuid,
    pub packing: String,
    pub qty: Decimal,
}

/// Input for recording a loading
#[derive(Debug, Deserialize)]
pub struct RecordLoadingInput {
    pub contract_no: String,
    pub loading_date: NaiveDate,
    pub depart_date: Option<NaiveDate>,
    pub vessel: String,
    pub container_no: String,
    pub seal_no: Option<String>,
    pub tally_no: Option<String>,
    pub qty: Decimal,
}

impl ShipmentService {
    /// Create a new ShipmentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a shipping order (contract header)
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<ShippingOrder> {
        validate_contract_no(&input.contract_no).map_err(|message| AppError::Validation {
            field: "contract_no".to_string(),
            message: message.to_string(),
        })?;

        let order = sqlx::query_as::<_, ShippingOrder>(
            r#"
            INSERT INTO shipping_orders (contract_no, order_date, buyer, period, destination)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, contract_no, order_date, buyer, period, destination,
                      created_at, updated_at
            "#,
        )
        .bind(&input.contract_no)
        .bind(input.order_date)
        .bind(&input.buyer)
        .bind(&input.period)
        .bind(&input.destination)
        .fetch_one(&self.db)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateEntry("contract number".to_string())
            }
            _ => AppError::DatabaseError(err),
        })?;

        Ok(order)
    }

    /// List shipping orders, newest first
    pub async fn list_orders(&self) -> AppResult<Vec<ShippingOrder>> {
        let orders = sqlx::query_as::<_, ShippingOrder>(
            r#"
            SELECT id, contract_no, order_date, buyer, period, destination,
                   created_at, updated_at
            FROM shipping_orders
            ORDER BY order_date DESC, contract_no
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(orders)
    }

    /// Add a detail line to a contract; the line's qty raises the contract's
    /// ordered quantity
    pub async fn add_order_detail(&self, input: AddOrderDetailInput) -> AppResult<OrderDetail> {
        validate_quantity(input.qty).map_err(|message| AppError::Validation {
            field: "qty".to_string(),
            message: message.to_string(),
        })?;

        let detail = sqlx::query_as::<_, OrderDetail>(
            r#"
            INSERT INTO order_details (contract_no, class, grade_id, packing, qty)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, contract_no, class, grade_id, packing, qty, created_at
            "#,
        )
        .bind(&input.contract_no)
        .bind(&input.class)
        .bind(input.grade_id)
        .bind(&input.packing)
        .bind(input.qty)
        .fetch_one(&self.db)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::ReferenceNotFound("contract or grade".to_string())
            }
            _ => AppError::DatabaseError(err),
        })?;

        Ok(detail)
    }

    /// Detail lines of a contract
    pub async fn order_details(&self, contract_no: &str) -> AppResult<Vec<OrderDetail>> {
        let details = sqlx::query_as::<_, OrderDetail>(
            r#"
            SELECT id, contract_no, class, grade_id, packing, qty, created_at
            FROM order_details
            WHERE contract_no = $1
            ORDER BY created_at
            "#,
        )
        .bind(contract_no)
        .fetch_all(&self.db)
        .await?;

        Ok(details)
    }

    /// Remove a detail line
    pub async fn delete_order_detail(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM order_details WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Order detail".to_string()));
        }

        Ok(())
    }

    /// Ordered vs. loaded position of a contract. A contract without detail
    /// lines has no ordered quantity and reports NotFound, which is distinct
    /// from a fully loaded contract (remaining zero).
    pub async fn balance_for_contract(&self, contract_no: &str) -> AppResult<ContractBalance> {
        let ordered = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(qty) FROM order_details WHERE contract_no = $1",
        )
        .bind(contract_no)
        .fetch_one(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contract".to_string()))?;

        let loaded = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(qty), 0) FROM loadings WHERE contract_no = $1",
        )
        .bind(contract_no)
        .fetch_one(&self.db)
        .await?;

        Ok(ContractBalance::new(contract_no, ordered, loaded))
    }

    /// Record a container loading. The contract balance is recomputed inside
    /// the insert transaction and the loading is rejected up front when it
    /// would exceed the remaining quantity.
    pub async fn record_loading(
        &self,
        ctx: &OperatorContext,
        input: RecordLoadingInput,
    ) -> AppResult<Loading> {
        validate_contract_no(&input.contract_no).map_err(|message| AppError::Validation {
            field: "contract_no".to_string(),
            message: message.to_string(),
        })?;
        validate_quantity(input.qty).map_err(|message| AppError::Validation {
            field: "qty".to_string(),
            message: message.to_string(),
        })?;
        if input.vessel.trim().is_empty() {
            return Err(AppError::Validation {
                field: "vessel".to_string(),
                message: "Vessel is required".to_string(),
            });
        }
        if input.container_no.trim().is_empty() {
            return Err(AppError::Validation {
                field: "container_no".to_string(),
                message: "Container number is required".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let ordered = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(qty) FROM order_details WHERE contract_no = $1",
        )
        .bind(&input.contract_no)
        .fetch_one(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Contract".to_string()))?;

        let loaded = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(qty), 0) FROM loadings WHERE contract_no = $1",
        )
        .bind(&input.contract_no)
        .fetch_one(&mut *tx)
        .await?;

        let balance = ContractBalance::new(input.contract_no.as_str(), ordered, loaded);
        if !balance.accepts(input.qty) {
            return Err(AppError::ExceedsContractBalance {
                contract_no: input.contract_no,
                remaining: balance.remaining,
                requested: input.qty,
            });
        }

        let loading = sqlx::query_as::<_, Loading>(
            r#"
            INSERT INTO loadings
                (contract_no, factory_id, loading_date, depart_date, vessel, container_no,
                 seal_no, tally_no, qty, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, contract_no, factory_id, loading_date, depart_date, vessel,
                      container_no, seal_no, tally_no, qty, recorded_by, created_at
            "#,
        )
        .bind(&input.contract_no)
        .bind(ctx.factory_id)
        .bind(input.loading_date)
        .bind(input.depart_date)
        .bind(&input.vessel)
        .bind(&input.container_no)
        .bind(&input.seal_no)
        .bind(&input.tally_no)
        .bind(input.qty)
        .bind(ctx.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::ReferenceNotFound("contract or factory".to_string())
            }
            _ => AppError::DatabaseError(err),
        })?;

        tx.commit().await?;

        Ok(loading)
    }

    /// Loadings, optionally narrowed to one contract, newest first
    pub async fn loadings(&self, contract_no: Option<&str>) -> AppResult<Vec<Loading>> {
        let loadings = sqlx::query_as::<_, Loading>(
            r#"
            SELECT id, contract_no, factory_id, loading_date, depart_date, vessel,
                   container_no, seal_no, tally_no, qty, recorded_by, created_at
            FROM loadings
            WHERE ($1::text IS NULL OR contract_no = $1)
            ORDER BY loading_date DESC, created_at DESC
            "#,
        )
        .bind(contract_no)
        .fetch_all(&self.db)
        .await?;

        Ok(loadings)
    }

    /// Loading counts and totals per contract
    pub async fn loading_summary(&self) -> AppResult<Vec<ContractLoadingSummary>> {
        let summary = sqlx::query_as::<_, ContractLoadingSummary>(
            r#"
            SELECT contract_no, COUNT(*) AS total_loadings, SUM(qty) AS loaded_qty
            FROM loadings
            GROUP BY contract_no
            ORDER BY contract_no
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(summary)
    }
}
