use ndarray::Array1;

use super::CandidatePrice;
use crate::error::{LearnError, LearnResult};
use crate::geometry::{Direction, Halfspace, PIVOT_TOLERANCE};

/// Total valuation on the normalised budget simplex.
pub const SIMPLEX_TOTAL: f64 = 1.0;

/// Turns the bundle bought at `selection.price` into a cut through `center`.
///
/// The buyer revealed that item `i` is worth at least as much per dollar as
/// item `j` when it bought `i` without `j`, or all of `i` and only part of
/// `j`. That reads `normal·a* ≥ 0` and keeps the [`Direction::AtLeast`] side;
/// any other bundle keeps [`Direction::AtMost`].
///
/// # Errors
///
/// * `DimensionMismatch` if the bundle or center has the wrong length
/// * `PreconditionViolated` if `|normal·center| > 1e-5`
pub fn hyperplane_from_bundle(
    bundle: &Array1<f64>,
    selection: &CandidatePrice,
    center: &Array1<f64>,
) -> LearnResult<Halfspace> {
    let dim = selection.normal.len();
    if bundle.len() != dim {
        return Err(LearnError::dimension_mismatch(
            dim,
            bundle.len(),
            "hyperplane_from_bundle bundle",
        ));
    }
    if center.len() != dim {
        return Err(LearnError::dimension_mismatch(
            dim,
            center.len(),
            "hyperplane_from_bundle center",
        ));
    }

    let residual = selection.normal.dot(center).abs();
    if residual.is_nan() || residual > PIVOT_TOLERANCE {
        return Err(LearnError::precondition(
            "hyperplane_from_bundle normal·center",
            residual,
            PIVOT_TOLERANCE,
        ));
    }

    let (i, j) = selection.pair;
    let (x_i, x_j) = (bundle[i], bundle[j]);
    let prefers_i = (x_i > 0.0 && x_j == 0.0) || (x_i == 1.0 && (0.0..1.0).contains(&x_j));
    let direction = if prefers_i {
        Direction::AtLeast
    } else {
        Direction::AtMost
    };

    Halfspace::new(selection.normal.clone(), center.clone(), direction)
}

/// Cut with the all-ones normal through `center` that pulls the ellipsoid
/// back toward `Σ xᵢ = 1`.
pub fn degree_of_freedom_cut(center: &Array1<f64>) -> LearnResult<Halfspace> {
    let ones = Array1::from_elem(center.len(), 1.0);
    let direction = if ones.dot(center) <= SIMPLEX_TOTAL {
        Direction::AtLeast
    } else {
        Direction::AtMost
    };
    Halfspace::new(ones, center.clone(), direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Ellipsoid;
    use crate::pricing::{select_best_price, MarketTerms};
    use ndarray::array;

    fn selection_at(center: &Array1<f64>) -> CandidatePrice {
        let terms = MarketTerms::new(center.len(), 1.0, 8).unwrap();
        let ellipsoid = Ellipsoid::ball(center.clone(), 0.5).unwrap();
        select_best_price(&terms, &ellipsoid).unwrap()
    }

    #[test]
    fn bundle_rules_pick_direction() {
        let center = array![0.7, 0.55];
        let selection = selection_at(&center);
        assert_eq!(selection.pair, (0, 1));

        let cases = [
            (array![1.0, 0.0], Direction::AtLeast),
            (array![0.3, 0.0], Direction::AtLeast),
            (array![1.0, 0.5], Direction::AtLeast),
            (array![0.5, 1.0], Direction::AtMost),
            (array![0.0, 0.8], Direction::AtMost),
            (array![0.0, 0.0], Direction::AtMost),
            (array![1.0, 1.0], Direction::AtMost),
        ];
        for (bundle, expected) in cases {
            let cut = hyperplane_from_bundle(&bundle, &selection, &center).unwrap();
            assert_eq!(cut.direction(), expected, "bundle {bundle}");
            assert!(cut.normal().dot(cut.pivot()).abs() <= PIVOT_TOLERANCE);
            assert_eq!(cut.pivot(), &center);
        }
    }

    #[test]
    fn rejects_center_off_the_hyperplane() {
        let center = array![0.7, 0.55];
        let selection = selection_at(&center);
        let shifted = array![0.7, 0.75];
        let result = hyperplane_from_bundle(&array![1.0, 0.0], &selection, &shifted);
        assert!(matches!(result, Err(LearnError::PreconditionViolated { .. })));
    }

    #[test]
    fn rejects_short_bundle() {
        let center = array![0.7, 0.55];
        let selection = selection_at(&center);
        let result = hyperplane_from_bundle(&array![1.0], &selection, &center);
        assert!(matches!(result, Err(LearnError::DimensionMismatch { .. })));
    }

    #[test]
    fn simplex_cut_points_toward_unit_total() {
        let below = degree_of_freedom_cut(&array![0.3, 0.4]).unwrap();
        assert_eq!(below.direction(), Direction::AtLeast);
        assert!(below.contains(&array![0.6, 0.4]));

        let above = degree_of_freedom_cut(&array![0.7, 0.55]).unwrap();
        assert_eq!(above.direction(), Direction::AtMost);
        assert!(above.contains(&array![0.6, 0.4]));

        let on = degree_of_freedom_cut(&array![0.5, 0.5]).unwrap();
        assert_eq!(on.direction(), Direction::AtLeast);
        assert_eq!(on.normal(), &array![1.0, 1.0]);
    }
}
