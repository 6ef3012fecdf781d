use std::cmp::Ordering;

use nalgebra::{Cholesky, SymmetricEigen};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{
    outer, symmetrized, to_dmatrix, to_dvector, Hyperplane, MEMBERSHIP_TOLERANCE, NORMAL_EPSILON,
    SYMMETRY_TOLERANCE,
};
use crate::error::{LearnError, LearnResult};

/// Ellipsoidal region `{x : (x − c)ᵀ·M⁻¹·(x − c) ≤ 1}`.
///
/// The shape matrix `M` is symmetric positive definite; construction rejects
/// anything else. Values are never mutated: every cut yields a new ellipsoid.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use valuation_learning_core::geometry::Ellipsoid;
///
/// let ellipsoid = Ellipsoid::ball(array![0.7, 0.55], 0.5).unwrap();
/// assert!(ellipsoid.contains(&array![0.6, 0.4]));
/// assert!((ellipsoid.volume() - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    center: Array1<f64>,
    shape_mat: Array2<f64>,
}

impl Ellipsoid {
    /// Creates an ellipsoid after validating the shape matrix.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` if `shape_mat` is not square or disagrees with `center`
    /// * `InvalidParameter` for non-finite entries or a visibly asymmetric matrix
    /// * `NotPositiveDefinite` if the Cholesky factorisation fails
    pub fn new(center: Array1<f64>, shape_mat: Array2<f64>) -> LearnResult<Self> {
        let dim = center.len();
        if dim == 0 {
            return Err(LearnError::invalid_parameter(
                "center",
                "[]",
                "at least one coordinate",
            ));
        }
        let (rows, cols) = shape_mat.dim();
        if rows != cols {
            return Err(LearnError::dimension_mismatch(
                rows,
                cols,
                "Ellipsoid::new square shape matrix",
            ));
        }
        if rows != dim {
            return Err(LearnError::dimension_mismatch(
                dim,
                rows,
                "Ellipsoid::new shape matrix",
            ));
        }
        if center.iter().chain(shape_mat.iter()).any(|v| !v.is_finite()) {
            return Err(LearnError::invalid_parameter(
                "ellipsoid",
                "non-finite entry",
                "finite center and shape matrix",
            ));
        }

        let scale = shape_mat
            .iter()
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
            .max(f64::MIN_POSITIVE);
        let asymmetry = (&shape_mat - &shape_mat.t())
            .iter()
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        if asymmetry > SYMMETRY_TOLERANCE * scale {
            return Err(LearnError::invalid_parameter(
                "shape_mat",
                format!("asymmetry {asymmetry:e}"),
                "symmetric matrix",
            ));
        }

        let shape_mat = symmetrized(&shape_mat);
        if Cholesky::new(to_dmatrix(&shape_mat)).is_none() {
            return Err(LearnError::not_positive_definite("Ellipsoid::new"));
        }

        Ok(Self { center, shape_mat })
    }

    /// Ball-like start region with `M = radius · I`.
    pub fn ball(center: Array1<f64>, radius: f64) -> LearnResult<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(LearnError::invalid_parameter("radius", radius, "> 0"));
        }
        let dim = center.len();
        Self::new(center, Array2::eye(dim) * radius)
    }

    pub fn dim(&self) -> usize {
        self.center.len()
    }

    pub fn center(&self) -> &Array1<f64> {
        &self.center
    }

    pub fn shape_mat(&self) -> &Array2<f64> {
        &self.shape_mat
    }

    /// Volume up to the unit-ball constant: `√det(M)`.
    ///
    /// Eigenvalues that drift below zero are clamped, so a numerically
    /// singular matrix reports `0.0` rather than NaN.
    pub fn volume(&self) -> f64 {
        self.eigenvalues()
            .iter()
            .map(|value| value.max(0.0))
            .product::<f64>()
            .sqrt()
    }

    /// Eigenvalues of the shape matrix in ascending order.
    pub fn eigenvalues(&self) -> Array1<f64> {
        sorted_eigenvalues(&self.shape_mat)
    }

    pub fn max_eigenvalue(&self) -> f64 {
        self.eigenvalues()
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// `(p − c)ᵀ·M⁻¹·(p − c)`, or `None` for a point of the wrong dimension.
    pub fn quadratic_form(&self, point: &Array1<f64>) -> Option<f64> {
        if point.len() != self.dim() {
            return None;
        }
        let cholesky = Cholesky::new(to_dmatrix(&self.shape_mat))?;
        let diff = to_dvector(&(point - &self.center));
        let solved = cholesky.solve(&diff);
        Some(diff.dot(&solved))
    }

    /// Membership with a small slack on the unit level set.
    pub fn contains(&self, point: &Array1<f64>) -> bool {
        self.quadratic_form(point)
            .is_some_and(|value| value <= 1.0 + MEMBERSHIP_TOLERANCE)
    }

    /// Section of the ellipsoid with an affine hyperplane.
    ///
    /// With `δ = rhs − a·c` and `q = aᵀ·M·a` the section is centered at
    /// `c + (δ/q)·M·a` with shape `(1 − δ²/q)·(M − M·a·aᵀ·M / q)`, a rank
    /// `n − 1` matrix. Returns `Ok(None)` when the hyperplane misses.
    pub fn intersect_hyperplane(
        &self,
        plane: &Hyperplane,
    ) -> LearnResult<Option<HyperplaneSection>> {
        if plane.dim() != self.dim() {
            return Err(LearnError::dimension_mismatch(
                self.dim(),
                plane.dim(),
                "Ellipsoid::intersect_hyperplane",
            ));
        }

        let normal = plane.normal();
        let m_normal = self.shape_mat.dot(normal);
        let quad = normal.dot(&m_normal);
        if !quad.is_finite() || quad <= NORMAL_EPSILON {
            return Err(LearnError::degenerate_normal(
                "Ellipsoid::intersect_hyperplane",
            ));
        }

        let delta = plane.rhs() - normal.dot(&self.center);
        let level = 1.0 - delta * delta / quad;
        if level < 0.0 {
            return Ok(None);
        }

        let center = &self.center + &(&m_normal * (delta / quad));
        let shape_mat = (&self.shape_mat - &(outer(&m_normal, &m_normal) / quad)) * level;

        Ok(Some(HyperplaneSection {
            center,
            shape_mat: symmetrized(&shape_mat),
        }))
    }
}

/// Flat ellipsoid lying inside a hyperplane, expressed in ambient coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperplaneSection {
    center: Array1<f64>,
    shape_mat: Array2<f64>,
}

impl HyperplaneSection {
    pub fn center(&self) -> &Array1<f64> {
        &self.center
    }

    /// Positive semi-definite; singular along the hyperplane normal.
    pub fn shape_mat(&self) -> &Array2<f64> {
        &self.shape_mat
    }

    pub fn eigenvalues(&self) -> Array1<f64> {
        sorted_eigenvalues(&self.shape_mat)
    }
}

fn sorted_eigenvalues(matrix: &Array2<f64>) -> Array1<f64> {
    let eigen = SymmetricEigen::new(to_dmatrix(matrix));
    let mut values: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Array1::from(values)
}
