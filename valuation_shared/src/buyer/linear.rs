use std::cmp::Ordering;

use anyhow::{bail, ensure, Result};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Buyer, ValuationOracle};

/// Synthetic buyer with a fixed linear utility `a·x`.
///
/// Each item can be bought in any fractional quantity up to one unit. At a
/// given price vector the buyer solves the fractional knapsack: items are
/// bought in decreasing order of value per unit of price until the budget is
/// spent. Items priced at or below zero are taken for free.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use valuation_shared::{Buyer, LinearUtilityBuyer};
///
/// let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
/// let bundle = buyer.bundle(&array![1.0, 1.0]).unwrap();
/// assert_eq!(bundle, array![1.0, 0.0]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearUtilityBuyer {
    valuation: Array1<f64>,
    budget: f64,
    bit_length: u32,
}

impl LinearUtilityBuyer {
    /// Creates a buyer with an explicit valuation vector.
    pub fn new(valuation: Array1<f64>, budget: f64, bit_length: u32) -> Result<Self> {
        ensure!(
            valuation.len() >= 2,
            "a buyer needs at least two items, got {}",
            valuation.len()
        );
        ensure!(
            valuation.iter().all(|v| v.is_finite() && *v >= 0.0),
            "valuation weights must be finite and non-negative"
        );
        ensure!(
            budget.is_finite() && budget > 0.0,
            "budget must be positive, got {budget}"
        );

        Ok(Self {
            valuation,
            budget,
            bit_length,
        })
    }

    /// Creates a deterministic random buyer whose valuation sums to one.
    ///
    /// Weights are drawn from `[0.1, 1.0)` before normalisation so that no
    /// item is worthless.
    pub fn from_seed(seed: u64, items: usize, budget: f64, bit_length: u32) -> Result<Self> {
        ensure!(items >= 2, "a buyer needs at least two items, got {items}");
        let mut rng = StdRng::seed_from_u64(seed);
        let raw = Array1::from_iter((0..items).map(|_| rng.gen_range(0.1..1.0)));
        let total = raw.sum();
        Self::new(raw / total, budget, bit_length)
    }

    fn value_per_price(&self, item: usize, prices: &Array1<f64>) -> f64 {
        let price = prices[item];
        if price <= 0.0 {
            f64::INFINITY
        } else {
            self.valuation[item] / price
        }
    }
}

impl Buyer for LinearUtilityBuyer {
    fn no_of_items(&self) -> usize {
        self.valuation.len()
    }

    fn budget(&self) -> f64 {
        self.budget
    }

    fn bit_length(&self) -> u32 {
        self.bit_length
    }

    fn bundle(&mut self, prices: &Array1<f64>) -> Result<Array1<f64>> {
        let items = self.valuation.len();
        if prices.len() != items {
            bail!(
                "price vector has {} entries but the buyer knows {} items",
                prices.len(),
                items
            );
        }
        if prices.iter().any(|p| !p.is_finite()) {
            bail!("prices must be finite");
        }

        let mut order: Vec<usize> = (0..items).filter(|&k| self.valuation[k] > 0.0).collect();
        // Stable sort keeps index order among equally attractive items.
        order.sort_by(|&a, &b| {
            self.value_per_price(b, prices)
                .partial_cmp(&self.value_per_price(a, prices))
                .unwrap_or(Ordering::Equal)
        });

        let mut bundle = Array1::zeros(items);
        let mut remaining = self.budget;
        for item in order {
            let price = prices[item];
            if price <= 0.0 {
                bundle[item] = 1.0;
                continue;
            }
            if remaining <= 0.0 {
                break;
            }
            let quantity = (remaining / price).min(1.0);
            bundle[item] = quantity;
            remaining -= quantity * price;
        }

        Ok(bundle)
    }

    fn name(&self) -> &str {
        "LinearUtilityBuyer"
    }
}

impl ValuationOracle for LinearUtilityBuyer {
    fn valuation_vector(&self) -> Array1<f64> {
        self.valuation.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn buys_preferred_item_with_whole_budget() {
        let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
        let bundle = buyer.bundle(&array![1.0, 1.0]).unwrap();
        assert_eq!(bundle, array![1.0, 0.0]);
    }

    #[test]
    fn spends_leftover_budget_on_second_choice() {
        let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
        let bundle = buyer.bundle(&array![1.0, 0.5]).unwrap();
        assert!((bundle[1] - 1.0).abs() < 1e-12);
        assert!((bundle[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn suppressed_items_stay_unbought() {
        let mut buyer = LinearUtilityBuyer::new(array![0.3, 0.3, 0.4], 1.0, 8).unwrap();
        let suppression = 2f64.powi(8);
        let bundle = buyer.bundle(&array![1.0, 1.2, suppression]).unwrap();
        assert_eq!(bundle[0], 1.0);
        assert_eq!(bundle[1], 0.0);
        assert_eq!(bundle[2], 0.0);
    }

    #[test]
    fn free_items_are_always_taken() {
        let mut buyer = LinearUtilityBuyer::new(array![0.5, 0.5], 1.0, 8).unwrap();
        let bundle = buyer.bundle(&array![1.0, 0.0]).unwrap();
        assert_eq!(bundle, array![1.0, 1.0]);
    }

    #[test]
    fn rejects_mismatched_price_vector() {
        let mut buyer = LinearUtilityBuyer::new(array![0.5, 0.5], 1.0, 8).unwrap();
        assert!(buyer.bundle(&array![1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn seeded_buyers_are_deterministic_and_normalised() {
        let first = LinearUtilityBuyer::from_seed(2018, 4, 1.0, 8).unwrap();
        let second = LinearUtilityBuyer::from_seed(2018, 4, 1.0, 8).unwrap();
        assert_eq!(first.valuation_vector(), second.valuation_vector());
        assert!((first.valuation_vector().sum() - 1.0).abs() < 1e-12);
        assert!(first.valuation_vector().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn rejects_non_positive_budget() {
        assert!(LinearUtilityBuyer::new(array![0.5, 0.5], 0.0, 8).is_err());
    }
}
