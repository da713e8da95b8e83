//! Receipt storage.
//!
//! Handlers depend on the [`ReceiptRepository`] trait; the in-memory
//! implementation holds the fixed seed set.

pub mod receipts;

pub use receipts::{InMemoryReceiptRepository, ReceiptRepository};
