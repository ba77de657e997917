//! Business logic services for the Rubber Group Operations Platform

pub mod dashboard;
pub mod ledger;
pub mod processing;
pub mod reception;
pub mod shipment;
pub mod stock;

pub use dashboard::DashboardService;
pub use ledger::LedgerService;
pub use processing::ProcessingService;
pub use reception::ReceptionService;
pub use shipment::ShipmentService;
pub use stock::StockService;
