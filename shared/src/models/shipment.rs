//! Shipment reconciliation models
//!
//! A sales contract carries an ordered quantity (the sum of its order detail
//! lines); loadings consume it. Same reconciliation shape as the stock
//! ledger, over contracted goods instead of pooled stock.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordered vs. loaded position of one contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractBalance {
    pub contract_no: String,
    pub ordered_qty: Decimal,
    pub loaded_qty: Decimal,
    pub remaining: Decimal,
}

impl ContractBalance {
    pub fn new(contract_no: impl Into<String>, ordered_qty: Decimal, loaded_qty: Decimal) -> Self {
        Self {
            contract_no: contract_no.into(),
            ordered_qty,
            loaded_qty,
            remaining: ordered_qty - loaded_qty,
        }
    }

    /// Whether a new loading of `qty` fits within the remaining quantity.
    /// Checked at submission time; an over-limit loading is rejected, not
    /// recorded and flagged later.
    pub fn accepts(&self, qty: Decimal) -> bool {
        qty <= self.remaining
    }

    /// A contract already loaded past its ordered quantity
    pub fn is_over_loaded(&self) -> bool {
        self.remaining < Decimal::ZERO
    }

    /// Fully loaded, nothing left to ship
    pub fn is_fulfilled(&self) -> bool {
        self.remaining == Decimal::ZERO
    }
}
