use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{LearnError, LearnResult};

/// Side of a cut that is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Keep `normal·(x − pivot) ≥ 0`
    AtLeast,
    /// Keep `normal·(x − pivot) ≤ 0`
    AtMost,
}

impl Direction {
    /// `+1` for [`Direction::AtLeast`], `−1` for [`Direction::AtMost`].
    pub fn sign(self) -> f64 {
        match self {
            Direction::AtLeast => 1.0,
            Direction::AtMost => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::AtLeast => "geq",
            Direction::AtMost => "leq",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cut through `pivot` with the given normal; `direction` selects the half kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Halfspace {
    normal: Array1<f64>,
    pivot: Array1<f64>,
    direction: Direction,
}

impl Halfspace {
    pub fn new(normal: Array1<f64>, pivot: Array1<f64>, direction: Direction) -> LearnResult<Self> {
        if normal.len() != pivot.len() {
            return Err(LearnError::dimension_mismatch(
                normal.len(),
                pivot.len(),
                "Halfspace::new pivot",
            ));
        }
        if normal.iter().chain(pivot.iter()).any(|v| !v.is_finite()) {
            return Err(LearnError::invalid_parameter(
                "halfspace",
                "non-finite entry",
                "finite normal and pivot",
            ));
        }

        Ok(Self {
            normal,
            pivot,
            direction,
        })
    }

    pub fn normal(&self) -> &Array1<f64> {
        &self.normal
    }

    pub fn pivot(&self) -> &Array1<f64> {
        &self.pivot
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn dim(&self) -> usize {
        self.normal.len()
    }

    /// Right-hand side of the bounding hyperplane, `normal·pivot`.
    pub fn offset(&self) -> f64 {
        self.normal.dot(&self.pivot)
    }

    /// Whether `point` lies in the retained half (boundary included).
    pub fn contains(&self, point: &Array1<f64>) -> bool {
        if point.len() != self.dim() {
            return false;
        }
        let signed = self.direction.sign() * (self.normal.dot(point) - self.offset());
        signed >= -super::MEMBERSHIP_TOLERANCE
    }
}

/// Affine hyperplane `normal·x = rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperplane {
    normal: Array1<f64>,
    rhs: f64,
}

impl Hyperplane {
    pub fn new(normal: Array1<f64>, rhs: f64) -> LearnResult<Self> {
        let norm = normal.dot(&normal).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(LearnError::degenerate_normal("Hyperplane::new"));
        }
        if !rhs.is_finite() {
            return Err(LearnError::invalid_parameter("rhs", rhs, "finite"));
        }
        Ok(Self { normal, rhs })
    }

    /// The budget simplex `Σ xᵢ = total`, stored with a unit normal.
    pub fn simplex(dim: usize, total: f64) -> LearnResult<Self> {
        if dim == 0 {
            return Err(LearnError::invalid_parameter("dim", dim, "≥ 1"));
        }
        let scale = (dim as f64).sqrt();
        Self::new(Array1::from_elem(dim, 1.0 / scale), total / scale)
    }

    pub fn normal(&self) -> &Array1<f64> {
        &self.normal
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn dim(&self) -> usize {
        self.normal.len()
    }
}
