//! Shipment reconciliation tests for the Rubber Group Operations Platform
//!
//! Covers contract balance arithmetic and the up-front rejection of loadings
//! that would exceed the remaining contract quantity.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::ContractBalance;

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Contract reconciliation
// ============================================================================
// Ordered 1000 with loadings [300, 400] reconciles to
// {ordered 1000, loaded 700, remaining 300}; a further 400 is rejected.

#[test]
fn test_contract_balance_reconciliation() {
    let loadings = [dec("300"), dec("400")];
    let loaded: Decimal = loadings.iter().copied().sum();

    let balance = ContractBalance::new("CT-2026-014", dec("1000"), loaded);

    assert_eq!(balance.ordered_qty, dec("1000"));
    assert_eq!(balance.loaded_qty, dec("700"));
    assert_eq!(balance.remaining, dec("300"));

    // 400 > 300 remaining: blocked at submission
    assert!(!balance.accepts(dec("400")));
    assert!(balance.accepts(dec("300")));
}

#[test]
fn test_exact_fill_then_reject_any_more() {
    let balance = ContractBalance::new("CT-2026-020", dec("1000"), dec("700"));
    assert!(balance.accepts(dec("300")));

    let after = ContractBalance::new("CT-2026-020", dec("1000"), dec("1000"));
    assert!(after.is_fulfilled());
    assert!(!after.accepts(dec("0.001")));
}

#[test]
fn test_fulfilled_is_distinct_from_over_loaded() {
    let fulfilled = ContractBalance::new("CT-2026-001", dec("500"), dec("500"));
    let over = ContractBalance::new("CT-2026-002", dec("500"), dec("650"));

    assert!(fulfilled.is_fulfilled() && !fulfilled.is_over_loaded());
    assert!(over.is_over_loaded() && !over.is_fulfilled());
}

#[test]
fn test_fractional_quantities_reconcile() {
    let balance = ContractBalance::new("CT-2026-031", dec("100.5"), dec("60.25"));
    assert_eq!(balance.remaining, dec("40.25"));
    assert!(balance.accepts(dec("40.25")));
    assert!(!balance.accepts(dec("40.26")));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// remaining = ordered - loaded, and a loading is accepted exactly when
    /// it fits in the remaining quantity.
    #[test]
    fn property_accepts_iff_within_remaining(
        ordered in 1u32..100_000,
        loaded in 0u32..100_000,
        requested in 1u32..100_000,
    ) {
        let balance = ContractBalance::new(
            "CT-PROP",
            Decimal::from(ordered),
            Decimal::from(loaded),
        );

        prop_assert_eq!(
            balance.remaining,
            Decimal::from(ordered) - Decimal::from(loaded)
        );
        prop_assert_eq!(
            balance.accepts(Decimal::from(requested)),
            Decimal::from(requested) <= balance.remaining
        );
    }

    /// Loadings that each pass the submission check never drive the contract
    /// negative; the first over-limit request is rejected with the balance
    /// unchanged.
    #[test]
    fn property_guarded_loadings_never_overshoot(
        ordered in 100u32..10_000,
        requests in prop::collection::vec(1u32..5_000, 1..30),
    ) {
        let ordered = Decimal::from(ordered);
        let mut loaded = Decimal::ZERO;

        for request in requests {
            let request = Decimal::from(request);
            let balance = ContractBalance::new("CT-PROP", ordered, loaded);
            if balance.accepts(request) {
                loaded += request;
            }
            prop_assert!(loaded <= ordered);
        }

        let end_state = ContractBalance::new("CT-PROP", ordered, loaded);
        prop_assert!(!end_state.is_over_loaded());
    }
}
