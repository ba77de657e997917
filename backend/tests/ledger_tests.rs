//! Ledger merge tests for the Rubber Group Operations Platform
//!
//! Covers the natural-key merge semantics: a repeated submission for the
//! same key accumulates into one entry instead of creating a second row.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    collapse_by_key, entry_description, EntryDirection, EntrySource, LedgerMovement, StockPool,
};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn reception_movement(
    day: NaiveDate,
    factory: Uuid,
    grade: Uuid,
    quantity: Decimal,
) -> LedgerMovement {
    LedgerMovement {
        transaction_date: day,
        factory_id: factory,
        grade_id: grade,
        stock_pool: StockPool::Unprocessed,
        direction: EntryDirection::In,
        source: EntrySource::Reception,
        quantity,
    }
}

// ============================================================================
// Idempotent merge
// ============================================================================
// Submitting the same reception (same date/factory/grade) twice yields one
// entry whose quantity equals the sum of both submissions, not two rows.

#[test]
fn test_repeated_reception_merges_into_one_entry() {
    let factory = Uuid::new_v4();
    let grade_a = Uuid::new_v4();
    let day = date(2026, 1, 5);

    let first = reception_movement(day, factory, grade_a, dec("50"));
    let second = reception_movement(day, factory, grade_a, dec("20"));

    let collapsed = collapse_by_key(&[first.clone(), second]);

    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed[&first.key()], dec("70"));
}

#[test]
fn test_different_dates_do_not_merge() {
    let factory = Uuid::new_v4();
    let grade = Uuid::new_v4();

    let monday = reception_movement(date(2026, 1, 5), factory, grade, dec("50"));
    let tuesday = reception_movement(date(2026, 1, 6), factory, grade, dec("20"));

    let collapsed = collapse_by_key(&[monday, tuesday]);
    assert_eq!(collapsed.len(), 2);
}

#[test]
fn test_different_factories_do_not_merge() {
    let grade = Uuid::new_v4();
    let day = date(2026, 1, 5);

    let collapsed = collapse_by_key(&[
        reception_movement(day, Uuid::new_v4(), grade, dec("50")),
        reception_movement(day, Uuid::new_v4(), grade, dec("20")),
    ]);
    assert_eq!(collapsed.len(), 2);
}

#[test]
fn test_source_is_part_of_the_key() {
    let factory = Uuid::new_v4();
    let grade = Uuid::new_v4();
    let day = date(2026, 1, 5);

    let reception = reception_movement(day, factory, grade, dec("50"));
    let manual = LedgerMovement {
        source: EntrySource::Manual,
        ..reception.clone()
    };

    let collapsed = collapse_by_key(&[reception, manual]);
    assert_eq!(collapsed.len(), 2);
}

#[test]
fn test_direction_is_part_of_the_key() {
    let factory = Uuid::new_v4();
    let grade = Uuid::new_v4();
    let day = date(2026, 1, 5);

    let credit = reception_movement(day, factory, grade, dec("50"));
    let debit = LedgerMovement {
        direction: EntryDirection::Out,
        ..credit.clone()
    };

    let collapsed = collapse_by_key(&[credit.clone(), debit.clone()]);
    assert_eq!(collapsed.len(), 2);
    assert_eq!(collapsed[&credit.key()], dec("50"));
    assert_eq!(collapsed[&debit.key()], dec("50"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// N submissions for the same key always collapse to one slot holding
    /// their sum, independent of how the quantity is split up.
    #[test]
    fn property_same_key_submissions_sum(quantities in prop::collection::vec(1u32..10_000, 1..20)) {
        let factory = Uuid::new_v4();
        let grade = Uuid::new_v4();
        let day = date(2026, 1, 5);

        let movements: Vec<LedgerMovement> = quantities
            .iter()
            .map(|q| reception_movement(day, factory, grade, Decimal::from(*q)))
            .collect();

        let expected: u64 = quantities.iter().map(|q| *q as u64).sum();
        let collapsed = collapse_by_key(&movements);

        prop_assert_eq!(collapsed.len(), 1);
        prop_assert_eq!(collapsed[&movements[0].key()], Decimal::from(expected));
    }

    /// Merging never changes the total quantity across the ledger.
    #[test]
    fn property_collapse_preserves_total_quantity(
        quantities in prop::collection::vec(1u32..10_000, 1..30),
        day_offsets in prop::collection::vec(0u8..3, 1..30),
    ) {
        let factory = Uuid::new_v4();
        let grade = Uuid::new_v4();
        let base = date(2026, 1, 5);

        let movements: Vec<LedgerMovement> = quantities
            .iter()
            .zip(day_offsets.iter().cycle())
            .map(|(q, offset)| {
                let day = base + chrono::Days::new(*offset as u64);
                reception_movement(day, factory, grade, Decimal::from(*q))
            })
            .collect();

        let before: Decimal = movements.iter().map(|m| m.quantity).sum();
        let after: Decimal = collapse_by_key(&movements).values().copied().sum();

        prop_assert_eq!(before, after);
    }
}

// ============================================================================
// Description template
// ============================================================================
// A merged entry's description is recomputed from the running total, so the
// stored row always reads as its current state.

#[test]
fn test_description_embeds_new_total_after_merge() {
    let day = date(2026, 1, 5);

    let after_first = entry_description("Total crop received", day, dec("50"));
    let after_merge = entry_description("Total crop received", day, dec("70"));

    assert_eq!(after_first, "Total crop received on 2026-01-05: 50 t");
    assert_eq!(after_merge, "Total crop received on 2026-01-05: 70 t");
    assert_ne!(after_first, after_merge);
}
