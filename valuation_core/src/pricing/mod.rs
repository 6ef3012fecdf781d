//! Price selection and the cuts derived from purchase responses.
//!
//! - [`selector`] picks the ordered item pair whose price reveals the most
//! - [`cuts`] turns a bundle into a halfspace and re-anchors on the budget simplex

pub mod cuts;
pub mod selector;

use serde::{Deserialize, Serialize};
use valuation_shared::Buyer;

use crate::error::{LearnError, LearnResult};

pub use cuts::{degree_of_freedom_cut, hyperplane_from_bundle, SIMPLEX_TOTAL};
pub use selector::{select_best_price, CandidatePrice, CENTER_EPSILON};

/// Market parameters shared by every query of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketTerms {
    /// Number of items on offer
    pub items: usize,
    /// Budget `B`; the reference item of each pair is priced at `B`
    pub budget: f64,
    /// Suppression prices are `B · 2^bit_length`
    pub bit_length: u32,
}

impl MarketTerms {
    pub fn new(items: usize, budget: f64, bit_length: u32) -> LearnResult<Self> {
        let terms = Self {
            items,
            budget,
            bit_length,
        };
        terms.validate()?;
        Ok(terms)
    }

    /// Reads the terms a buyer advertises.
    pub fn from_buyer<B: Buyer + ?Sized>(buyer: &B) -> LearnResult<Self> {
        Self::new(buyer.no_of_items(), buyer.budget(), buyer.bit_length())
    }

    /// Price that keeps every item outside the current pair off the table.
    pub fn suppression_price(&self) -> f64 {
        self.budget * 2f64.powi(self.bit_length.min(i32::MAX as u32) as i32)
    }

    fn validate(&self) -> LearnResult<()> {
        if self.items < 2 {
            return Err(LearnError::invalid_parameter(
                "items",
                self.items,
                "≥ 2 (prices compare item pairs)",
            ));
        }
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(LearnError::invalid_parameter("budget", self.budget, "> 0"));
        }
        if !self.suppression_price().is_finite() {
            return Err(LearnError::invalid_parameter(
                "bit_length",
                self.bit_length,
                "budget · 2^bit_length must be finite",
            ));
        }
        Ok(())
    }
}
