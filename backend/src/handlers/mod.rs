//! HTTP handlers for the Rubber Group Operations Platform

pub mod dashboard;
pub mod health;
pub mod ledger;
pub mod processing;
pub mod reception;
pub mod shipment;
pub mod stock;

pub use dashboard::*;
pub use health::*;
pub use ledger::*;
pub use processing::*;
pub use reception::*;
pub use shipment::*;
pub use stock::*;
