//! Route definitions for the Rubber Group Operations Platform

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stock ledger
        .nest("/ledger", ledger_routes())
        // Crop receptions
        .nest("/receptions", reception_routes())
        // Processing runs
        .nest("/processing", processing_routes())
        // Derived stock balances
        .nest("/stock", stock_routes())
        // Shipping orders and loadings
        .nest("/shipments", shipment_routes())
        // Estimates vs actuals
        .nest("/dashboard", dashboard_routes())
}

/// Stock ledger routes
fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/entries",
            get(handlers::list_entries).post(handlers::record_manual_entry),
        )
        .route(
            "/entries/:entry_id",
            put(handlers::update_manual_entry).delete(handlers::delete_entry),
        )
        .route("/entries/export", get(handlers::export_entries))
        .route("/last-date", get(handlers::last_transaction_date))
}

/// Crop reception routes
fn reception_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_receptions).post(handlers::record_reception),
        )
        .route("/summary", get(handlers::reception_summary))
        .route(
            "/:reception_id",
            put(handlers::update_reception).delete(handlers::delete_reception),
        )
}

/// Processing run routes
fn processing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_processing).post(handlers::record_processing),
        )
        .route(
            "/:run_id",
            put(handlers::update_processing).delete(handlers::delete_processing),
        )
}

/// Derived stock routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/balances", get(handlers::stock_balances))
        .route("/balances/negative", get(handlers::negative_stock_balances))
        .route("/summary/:pool", get(handlers::stock_summary_by_pool))
}

/// Shipping order and loading routes
fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route("/orders/details", post(handlers::add_order_detail))
        .route(
            "/orders/details/:detail_id",
            delete(handlers::delete_order_detail),
        )
        .route(
            "/orders/:contract_no/details",
            get(handlers::list_order_details),
        )
        .route(
            "/orders/:contract_no/balance",
            get(handlers::contract_balance),
        )
        .route(
            "/loadings",
            get(handlers::list_loadings).post(handlers::record_loading),
        )
        .route("/loadings/summary", get(handlers::loading_summary))
}

/// Dashboard routes
fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/variance", get(handlers::variance_report))
}
