//! Observability for the receipts service.
//!
//! Provides metrics definitions and the Prometheus recorder setup. Tracing
//! subscriber setup lives in `common::observability`.

pub mod metrics;
