//! Common utilities shared across Receipts API components.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (size limits, clock skew, header inspection)
pub mod jwt;

/// Module for tracing subscriber setup
pub mod observability;
