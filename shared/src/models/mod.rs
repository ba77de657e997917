//! Domain models for the Rubber Group Operations Platform

mod ledger;
mod shipment;

pub use ledger::*;
pub use shipment::*;
