//! HTTP request handlers for the receipts service.

pub mod health;
pub mod metrics;
pub mod receipts;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use receipts::{get_receipt, list_receipts};
