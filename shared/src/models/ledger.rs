//! Stock ledger models and the pure balance projection
//!
//! A ledger entry is a signed quantity movement against one of the two stock
//! pools. Entries are unique per natural key; a repeated submission for the
//! same key merges additively instead of creating a second row.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inventory bucket a movement applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockPool {
    /// Raw crop awaiting processing (latex, cup lump, scrap)
    Unprocessed,
    /// Finished rubber (RSS, CNR grades)
    Processed,
}

impl StockPool {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockPool::Unprocessed => "unprocessed",
            StockPool::Processed => "processed",
        }
    }
}

impl FromStr for StockPool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unprocessed" => Ok(StockPool::Unprocessed),
            "processed" => Ok(StockPool::Processed),
            other => Err(format!("unknown stock pool: {}", other)),
        }
    }
}

/// Whether a movement adds to or subtracts from its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    In,
    Out,
}

impl EntryDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryDirection::In => "in",
            EntryDirection::Out => "out",
        }
    }
}

impl FromStr for EntryDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(EntryDirection::In),
            "out" => Ok(EntryDirection::Out),
            other => Err(format!("unknown entry direction: {}", other)),
        }
    }
}

/// The recording operation that produced a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Reception,
    Processing,
    Manual,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySource::Reception => "reception",
            EntrySource::Processing => "processing",
            EntrySource::Manual => "manual",
        }
    }
}

impl FromStr for EntrySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reception" => Ok(EntrySource::Reception),
            "processing" => Ok(EntrySource::Processing),
            "manual" => Ok(EntrySource::Manual),
            other => Err(format!("unknown entry source: {}", other)),
        }
    }
}

/// Natural key of a ledger entry. At most one stored row exists per key; a
/// repeated submission for the same key accumulates into the existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub transaction_date: NaiveDate,
    pub factory_id: Uuid,
    pub grade_id: Uuid,
    pub stock_pool: StockPool,
    pub direction: EntryDirection,
    pub source: EntrySource,
}

/// A candidate quantity movement, before it is persisted or merged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMovement {
    pub transaction_date: NaiveDate,
    pub factory_id: Uuid,
    pub grade_id: Uuid,
    pub stock_pool: StockPool,
    pub direction: EntryDirection,
    pub source: EntrySource,
    /// Always non-negative; the direction carries the sign
    pub quantity: Decimal,
}

impl LedgerMovement {
    pub fn key(&self) -> LedgerKey {
        LedgerKey {
            transaction_date: self.transaction_date,
            factory_id: self.factory_id,
            grade_id: self.grade_id,
            stock_pool: self.stock_pool,
            direction: self.direction,
            source: self.source,
        }
    }

    /// Effect on the pool balance: `+quantity` for IN, `-quantity` for OUT
    pub fn signed_quantity(&self) -> Decimal {
        match self.direction {
            EntryDirection::In => self.quantity,
            EntryDirection::Out => -self.quantity,
        }
    }
}

/// A stored ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub transaction_date: NaiveDate,
    pub factory_id: Uuid,
    pub grade_id: Uuid,
    pub stock_pool: StockPool,
    pub direction: EntryDirection,
    pub source: EntrySource,
    pub quantity: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn key(&self) -> LedgerKey {
        LedgerKey {
            transaction_date: self.transaction_date,
            factory_id: self.factory_id,
            grade_id: self.grade_id,
            stock_pool: self.stock_pool,
            direction: self.direction,
            source: self.source,
        }
    }

    pub fn signed_quantity(&self) -> Decimal {
        match self.direction {
            EntryDirection::In => self.quantity,
            EntryDirection::Out => -self.quantity,
        }
    }
}

/// Net stock position for one (factory, grade, pool) group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBalance {
    pub factory_id: Uuid,
    pub grade_id: Uuid,
    pub stock_pool: StockPool,
    pub net_quantity: Decimal,
}

/// Description template for a stored entry, embedding the running total so a
/// merged row always reads as its current state, e.g.
/// `Total crop received on 2026-01-05: 70 t`. The store recomputes the same
/// template when it merges.
pub fn entry_description(label: &str, date: NaiveDate, total: Decimal) -> String {
    format!("{} on {}: {} t", label, date.format("%Y-%m-%d"), total)
}

/// Collapse movements by natural key, summing quantities. In-memory mirror of
/// the store's additive upsert: submitting the same key twice yields one slot
/// holding the summed quantity, never two.
pub fn collapse_by_key(movements: &[LedgerMovement]) -> BTreeMap<LedgerKey, Decimal> {
    let mut collapsed = BTreeMap::new();
    for movement in movements {
        *collapsed.entry(movement.key()).or_insert(Decimal::ZERO) += movement.quantity;
    }
    collapsed
}

/// Fold movements into net balances per (factory, grade, pool). Pure function
/// of the movement set: the result is independent of submission order and of
/// whether same-key movements were merged first.
pub fn project_balances(movements: &[LedgerMovement]) -> Vec<PoolBalance> {
    let mut groups: BTreeMap<(Uuid, Uuid, StockPool), Decimal> = BTreeMap::new();
    for movement in movements {
        *groups
            .entry((movement.factory_id, movement.grade_id, movement.stock_pool))
            .or_insert(Decimal::ZERO) += movement.signed_quantity();
    }

    groups
        .into_iter()
        .map(|((factory_id, grade_id, stock_pool), net_quantity)| PoolBalance {
            factory_id,
            grade_id,
            stock_pool,
            net_quantity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(
        date: NaiveDate,
        factory: Uuid,
        grade: Uuid,
        pool: StockPool,
        direction: EntryDirection,
        source: EntrySource,
        qty: i64,
    ) -> LedgerMovement {
        LedgerMovement {
            transaction_date: date,
            factory_id: factory,
            grade_id: grade,
            stock_pool: pool,
            direction,
            source,
            quantity: Decimal::from(qty),
        }
    }

    #[test]
    fn test_stock_pool_round_trip() {
        for pool in [StockPool::Unprocessed, StockPool::Processed] {
            assert_eq!(pool.as_str().parse::<StockPool>().unwrap(), pool);
        }
        assert!("raw".parse::<StockPool>().is_err());
    }

    #[test]
    fn test_direction_round_trip() {
        for direction in [EntryDirection::In, EntryDirection::Out] {
            assert_eq!(direction.as_str().parse::<EntryDirection>().unwrap(), direction);
        }
        assert!("inout".parse::<EntryDirection>().is_err());
    }

    #[test]
    fn test_source_round_trip() {
        for source in [EntrySource::Reception, EntrySource::Processing, EntrySource::Manual] {
            assert_eq!(source.as_str().parse::<EntrySource>().unwrap(), source);
        }
        assert!("import".parse::<EntrySource>().is_err());
    }

    #[test]
    fn test_signed_quantity() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let factory = Uuid::new_v4();
        let grade = Uuid::new_v4();

        let credit = movement(
            date,
            factory,
            grade,
            StockPool::Unprocessed,
            EntryDirection::In,
            EntrySource::Reception,
            50,
        );
        let debit = movement(
            date,
            factory,
            grade,
            StockPool::Unprocessed,
            EntryDirection::Out,
            EntrySource::Processing,
            30,
        );

        assert_eq!(credit.signed_quantity(), Decimal::from(50));
        assert_eq!(debit.signed_quantity(), Decimal::from(-30));
    }

    #[test]
    fn test_collapse_merges_same_key() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let factory = Uuid::new_v4();
        let grade = Uuid::new_v4();

        let first = movement(
            date,
            factory,
            grade,
            StockPool::Unprocessed,
            EntryDirection::In,
            EntrySource::Reception,
            50,
        );
        let second = movement(
            date,
            factory,
            grade,
            StockPool::Unprocessed,
            EntryDirection::In,
            EntrySource::Reception,
            20,
        );

        let collapsed = collapse_by_key(&[first.clone(), second]);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[&first.key()], Decimal::from(70));
    }

    #[test]
    fn test_collapse_keeps_distinct_keys_apart() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let factory = Uuid::new_v4();
        let grade = Uuid::new_v4();

        let received = movement(
            date,
            factory,
            grade,
            StockPool::Unprocessed,
            EntryDirection::In,
            EntrySource::Reception,
            50,
        );
        // Same date/factory/grade/pool/direction, different source: separate row
        let adjusted = movement(
            date,
            factory,
            grade,
            StockPool::Unprocessed,
            EntryDirection::In,
            EntrySource::Manual,
            5,
        );

        let collapsed = collapse_by_key(&[received, adjusted]);
        assert_eq!(collapsed.len(), 2);
    }

    #[test]
    fn test_project_balances_nets_in_and_out() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let factory = Uuid::new_v4();
        let grade = Uuid::new_v4();

        let movements = vec![
            movement(
                date,
                factory,
                grade,
                StockPool::Unprocessed,
                EntryDirection::In,
                EntrySource::Reception,
                70,
            ),
            movement(
                date.succ_opt().unwrap(),
                factory,
                grade,
                StockPool::Unprocessed,
                EntryDirection::Out,
                EntrySource::Processing,
                30,
            ),
        ];

        let balances = project_balances(&movements);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].net_quantity, Decimal::from(40));
    }

    #[test]
    fn test_project_balances_is_order_independent() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let factory = Uuid::new_v4();
        let grade_a = Uuid::new_v4();
        let grade_b = Uuid::new_v4();

        let mut movements = vec![
            movement(
                date,
                factory,
                grade_a,
                StockPool::Unprocessed,
                EntryDirection::In,
                EntrySource::Reception,
                100,
            ),
            movement(
                date,
                factory,
                grade_a,
                StockPool::Unprocessed,
                EntryDirection::Out,
                EntrySource::Processing,
                40,
            ),
            movement(
                date,
                factory,
                grade_b,
                StockPool::Processed,
                EntryDirection::In,
                EntrySource::Processing,
                40,
            ),
        ];

        let forward = project_balances(&movements);
        movements.reverse();
        let backward = project_balances(&movements);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_negative_balance_is_representable() {
        // Processing may debit a pool before the matching reception is keyed
        // in; the projection reports the deficit instead of clamping it.
        let date = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let factory = Uuid::new_v4();
        let grade = Uuid::new_v4();

        let movements = vec![movement(
            date,
            factory,
            grade,
            StockPool::Unprocessed,
            EntryDirection::Out,
            EntrySource::Processing,
            25,
        )];

        let balances = project_balances(&movements);
        assert_eq!(balances[0].net_quantity, Decimal::from(-25));
    }

    #[test]
    fn test_entry_description_embeds_total_and_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let description = entry_description("Total crop received", date, Decimal::from(70));
        assert_eq!(description, "Total crop received on 2026-01-05: 70 t");
    }
}
