//! Central-cut minimum-volume ellipsoid update.
//!
//! Given `E = (c, M)` in dimension `n` and a halfspace through `c` with
//! normal `g`, let `n̄ = g / √(gᵀ·M·g)`, `b = M·n̄` and `s = ±1` the retained
//! side. The smallest ellipsoid containing the retained half is
//!
//! ```text
//! c' = c + s · b / (n + 1)
//! M' = n² / (n² − 1) · (M − 2 / (n + 1) · b·bᵀ)
//! ```
//!
//! and its volume is exactly [`volume_ratio`]`(n)` times the old one.
//!
//! Each update flattens the shape matrix along the cut direction, so after
//! enough cuts its smallest axis falls below what `f64` can resolve around
//! the center. Results past [`CONDITION_FLOOR`] or [`RESOLUTION_FACTOR`] are
//! rejected rather than returned with a silently wrong membership test.

use ndarray::Array2;

use super::{
    max_abs_deviation, outer, Ellipsoid, Halfspace, CONDITION_FLOOR, NORMAL_EPSILON,
    PIVOT_TOLERANCE, RESOLUTION_FACTOR,
};
use crate::error::{LearnError, LearnResult};

/// Volume shrink factor of one central cut in dimension `n`:
/// `n/(n+1) · (n²/(n²−1))^((n−1)/2)`, and `1/2` for `n = 1`.
pub fn volume_ratio(dim: usize) -> f64 {
    if dim <= 1 {
        return 0.5;
    }
    let n = dim as f64;
    let n2 = n * n;
    n / (n + 1.0) * (n2 / (n2 - 1.0)).powf((n - 1.0) / 2.0)
}

/// Minimum-volume ellipsoid containing `ellipsoid ∩ halfspace`.
///
/// # Errors
///
/// * `DimensionMismatch` if the halfspace lives in another dimension
/// * `PreconditionViolated` if the pivot is not the ellipsoid's center
/// * `DegenerateNormal` if the normal has no length in the ellipsoid metric
/// * `NotPositiveDefinite` if the updated shape matrix breaks down or is too
///   ill-conditioned to resolve
pub fn min_volume_ellipsoid(ellipsoid: &Ellipsoid, halfspace: &Halfspace) -> LearnResult<Ellipsoid> {
    let dim = ellipsoid.dim();
    if halfspace.dim() != dim {
        return Err(LearnError::dimension_mismatch(
            dim,
            halfspace.dim(),
            "min_volume_ellipsoid",
        ));
    }

    let deviation = max_abs_deviation(halfspace.pivot(), ellipsoid.center());
    if deviation > PIVOT_TOLERANCE {
        return Err(LearnError::precondition(
            "min_volume_ellipsoid pivot vs center",
            deviation,
            PIVOT_TOLERANCE,
        ));
    }

    let shape = ellipsoid.shape_mat();
    let m_normal = shape.dot(halfspace.normal());
    let quad = halfspace.normal().dot(&m_normal);
    if !quad.is_finite() || quad <= NORMAL_EPSILON {
        return Err(LearnError::degenerate_normal("min_volume_ellipsoid"));
    }

    // b = M·n̄ with n̄ scaled to unit length in the M metric
    let step = m_normal / quad.sqrt();
    let sign = halfspace.direction().sign();

    let (center, shape_mat) = if dim == 1 {
        (
            ellipsoid.center() + &(&step * (sign * 0.5)),
            shape * 0.25,
        )
    } else {
        let n = dim as f64;
        let n2 = n * n;
        let center = ellipsoid.center() + &(&step * (sign / (n + 1.0)));
        let rank_one: Array2<f64> = outer(&step, &step) * (2.0 / (n + 1.0));
        (center, (shape - &rank_one) * (n2 / (n2 - 1.0)))
    };

    let next = Ellipsoid::new(center, shape_mat).map_err(|err| match err {
        LearnError::NotPositiveDefinite { .. } => {
            LearnError::not_positive_definite("min_volume_ellipsoid result")
        }
        other => other,
    })?;
    check_conditioning(&next)?;
    Ok(next)
}

fn check_conditioning(ellipsoid: &Ellipsoid) -> LearnResult<()> {
    let eigenvalues = ellipsoid.eigenvalues();
    let smallest = eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
    let largest = eigenvalues.iter().copied().fold(0.0f64, f64::max);
    let reach = ellipsoid
        .center()
        .iter()
        .fold(0.0f64, |acc, v| acc.max(v.abs()));

    let flat = smallest <= CONDITION_FLOOR * largest;
    let unresolved = smallest.max(0.0).sqrt() <= RESOLUTION_FACTOR * f64::EPSILON * reach;
    if flat || unresolved {
        return Err(LearnError::not_positive_definite(format!(
            "min_volume_ellipsoid result (λ_min {smallest:.2e}, λ_max {largest:.2e})"
        )));
    }
    Ok(())
}
