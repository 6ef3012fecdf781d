//! Ellipsoids, cutting halfspaces and the central-cut update.
//!
//! Public types carry `ndarray` vectors and matrices; spectral work
//! (Cholesky, eigenvalues) is delegated to `nalgebra` on freshly converted
//! copies, since every update produces an entirely new shape matrix.

pub mod ellipsoid;
pub mod halfspace;
pub mod update;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

pub use ellipsoid::{Ellipsoid, HyperplaneSection};
pub use halfspace::{Direction, Halfspace, Hyperplane};
pub use update::{min_volume_ellipsoid, volume_ratio};

/// Maximum distance between a cut's pivot and the point it must pass through.
pub const PIVOT_TOLERANCE: f64 = 1e-5;

/// Slack allowed on the unit level set when testing membership.
pub const MEMBERSHIP_TOLERANCE: f64 = 1e-6;

/// Relative asymmetry accepted before a shape matrix is rejected.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Smallest admissible `normalᵀ·M·normal` for a cut.
pub const NORMAL_EPSILON: f64 = 1e-300;

/// Updated shape matrices need `λ_min > CONDITION_FLOOR · λ_max`.
pub const CONDITION_FLOOR: f64 = 1e-12;

/// Updated shape matrices need `√λ_min > RESOLUTION_FACTOR · ε · ‖c‖∞`, so
/// the shortest axis stays well above the rounding step of the center.
pub const RESOLUTION_FACTOR: f64 = 1e4;

pub(crate) fn to_dmatrix(matrix: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = matrix.dim();
    DMatrix::from_fn(rows, cols, |r, c| matrix[[r, c]])
}

pub(crate) fn to_dvector(vector: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(vector.len(), vector.iter().copied())
}

/// Largest absolute coordinate difference between two vectors.
pub(crate) fn max_abs_deviation(lhs: &Array1<f64>, rhs: &Array1<f64>) -> f64 {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

pub(crate) fn outer(lhs: &Array1<f64>, rhs: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((lhs.len(), rhs.len()), |(r, c)| lhs[r] * rhs[c])
}

pub(crate) fn symmetrized(matrix: &Array2<f64>) -> Array2<f64> {
    (matrix + &matrix.t()) * 0.5
}
