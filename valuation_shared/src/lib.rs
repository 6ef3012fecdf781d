//! Valuation Shared Library
//!
//! Types shared between the valuation learner and the market side.
//!
//! This library provides:
//! - The [`Buyer`] contract the learning engine queries for bundles
//! - The [`ValuationOracle`] contract used by tests and reporting
//! - [`LinearUtilityBuyer`], a synthetic buyer with a known linear valuation

pub mod buyer;

// Re-export commonly used types
pub use buyer::{Buyer, LinearUtilityBuyer, ValuationOracle};

