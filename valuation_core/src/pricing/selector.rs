use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::MarketTerms;
use crate::error::{LearnError, LearnResult};
use crate::geometry::Ellipsoid;

/// Center coordinates at or below this magnitude cannot anchor a price ratio.
pub const CENTER_EPSILON: f64 = 1e-12;

/// Price vector for an ordered item pair together with its cut normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePrice {
    /// Ordered pair `(i, j)`: `i` is priced at the budget, `j` at the center ratio
    pub pair: (usize, usize),
    pub price: Array1<f64>,
    /// Unit normal supported on `i` and `j`, orthogonal to the center
    pub normal: Array1<f64>,
    /// `normalᵀ·M·normal`, the squared half-width of the ellipsoid across the cut
    pub score: f64,
}

impl CandidatePrice {
    /// Builds the candidate for pair `(i, j)` at `center`.
    ///
    /// Returns `None` when the pair is out of range for `terms`, when
    /// `center[i]` is too small to divide by, or when the resulting price or
    /// normal is degenerate.
    pub fn build(
        terms: &MarketTerms,
        pair: (usize, usize),
        center: &Array1<f64>,
    ) -> Option<Self> {
        let (i, j) = pair;
        if i >= terms.items || j >= terms.items || center.len() != terms.items {
            return None;
        }
        let anchor = center[i];
        if i == j || !anchor.is_finite() || anchor.abs() <= CENTER_EPSILON {
            return None;
        }

        let mut price = Array1::from_elem(terms.items, terms.suppression_price());
        price[i] = terms.budget;
        price[j] = terms.budget * center[j] / anchor;
        if !price[j].is_finite() {
            return None;
        }

        let mut normal = Array1::zeros(terms.items);
        normal[i] = price[j];
        normal[j] = -price[i];
        let norm = normal.dot(&normal).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return None;
        }
        normal /= norm;

        Some(Self {
            pair,
            price,
            normal,
            score: 0.0,
        })
    }
}

/// Picks the ordered pair whose cut direction is widest in the ellipsoid.
///
/// Pairs are visited `i` outer, `j` inner; only a strictly larger score
/// replaces the incumbent, so ties resolve to the first pair visited.
///
/// # Errors
///
/// * `DimensionMismatch` if the ellipsoid does not have `terms.items` coordinates
/// * `NoValidCandidate` if the division guard rejects every pair
pub fn select_best_price(terms: &MarketTerms, ellipsoid: &Ellipsoid) -> LearnResult<CandidatePrice> {
    if ellipsoid.dim() != terms.items {
        return Err(LearnError::dimension_mismatch(
            terms.items,
            ellipsoid.dim(),
            "select_best_price",
        ));
    }

    let center = ellipsoid.center();
    let shape = ellipsoid.shape_mat();
    let mut best: Option<CandidatePrice> = None;
    let mut skipped = 0usize;

    for i in 0..terms.items {
        for j in 0..terms.items {
            if i == j {
                continue;
            }
            let Some(mut candidate) = CandidatePrice::build(terms, (i, j), center) else {
                skipped += 1;
                continue;
            };
            candidate.score = candidate.normal.dot(&shape.dot(&candidate.normal));
            let better = best
                .as_ref()
                .map_or(true, |incumbent| candidate.score > incumbent.score);
            if better {
                best = Some(candidate);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(
            "Skipped {} of {} candidate pairs with a vanishing center coordinate",
            skipped,
            terms.items * (terms.items - 1)
        );
    }

    best.ok_or(LearnError::NoValidCandidate { items: terms.items })
}
