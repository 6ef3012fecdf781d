/// Buyer contract consumed by the valuation learner
///
/// A buyer is the external party of a posted-price experiment: it is shown a
/// per-unit price for every item and answers with the bundle it purchases under
/// its own budget.
pub mod linear;

use anyhow::Result;
use ndarray::Array1;

pub use linear::LinearUtilityBuyer;

/// Trait for buyers that answer posted-price queries
///
/// Implementations may be simulations, recorded sessions, or adapters to a
/// live market. The learner never retries a failed query.
pub trait Buyer {
    /// Number of items on offer
    fn no_of_items(&self) -> usize;

    /// Budget the buyer spends per query
    fn budget(&self) -> f64;

    /// Precision parameter bounding suppression prices (`budget * 2^bit_length`)
    fn bit_length(&self) -> u32;

    /// Bundle purchased at the given per-unit prices
    ///
    /// # Arguments
    /// * `prices` - One price per item
    ///
    /// # Returns
    /// One purchased quantity per item
    fn bundle(&mut self, prices: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get buyer name for logging/debugging
    fn name(&self) -> &str {
        "UnknownBuyer"
    }
}

/// Ground-truth access for buyers whose valuation is known
///
/// Only test oracles and reporting read this; the learning engine does not.
pub trait ValuationOracle {
    fn valuation_vector(&self) -> Array1<f64>;
}
