//! Error types for the valuation learner
//!
//! Every fatal condition of a learning run is reported through [`LearnError`]
//! and returned to the caller; nothing is retried or swallowed.

use std::fmt;

/// Result type alias for learner operations
pub type LearnResult<T> = Result<T, LearnError>;

/// Error type for geometry, pricing and orchestration
#[derive(Debug)]
pub enum LearnError {
    /// A cut was built against a pivot that does not sit where it must
    PreconditionViolated {
        context: String,
        deviation: f64,
        tolerance: f64,
    },

    /// Vector or matrix dimensions disagree
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// Shape matrix lost positive-definiteness
    NotPositiveDefinite { context: String },

    /// Cut normal has (numerically) zero length in the ellipsoid metric
    DegenerateNormal { context: String },

    /// Every candidate item pair was rejected by the division guard
    NoValidCandidate { items: usize },

    /// Invalid parameter value
    InvalidParameter {
        parameter: String,
        value: String,
        constraint: String,
    },

    /// The buyer could not answer a price query
    Buyer(anyhow::Error),
}

impl fmt::Display for LearnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearnError::PreconditionViolated {
                context,
                deviation,
                tolerance,
            } => {
                write!(
                    f,
                    "Precondition violated in {}: deviation {:e} exceeds tolerance {:e}",
                    context, deviation, tolerance
                )
            }
            LearnError::DimensionMismatch {
                expected,
                got,
                context,
            } => {
                write!(
                    f,
                    "Dimension mismatch in {}: expected {} dimensions, got {}",
                    context, expected, got
                )
            }
            LearnError::NotPositiveDefinite { context } => {
                write!(f, "Shape matrix is not positive definite in {}", context)
            }
            LearnError::DegenerateNormal { context } => {
                write!(f, "Degenerate cut normal in {}", context)
            }
            LearnError::NoValidCandidate { items } => {
                write!(
                    f,
                    "No valid candidate price among {} items: every pair hit the division guard",
                    items
                )
            }
            LearnError::InvalidParameter {
                parameter,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter '{}' = '{}': must satisfy {}",
                    parameter, value, constraint
                )
            }
            LearnError::Buyer(err) => write!(f, "Buyer query failed: {}", err),
        }
    }
}

impl std::error::Error for LearnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LearnError::Buyer(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for LearnError {
    fn from(err: anyhow::Error) -> Self {
        LearnError::Buyer(err)
    }
}

// Convenience constructors for common error patterns
impl LearnError {
    /// Create a precondition violation error
    pub fn precondition(context: impl Into<String>, deviation: f64, tolerance: f64) -> Self {
        LearnError::PreconditionViolated {
            context: context.into(),
            deviation,
            tolerance,
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(expected: usize, got: usize, context: impl Into<String>) -> Self {
        LearnError::DimensionMismatch {
            expected,
            got,
            context: context.into(),
        }
    }

    /// Create a non-positive-definite error
    pub fn not_positive_definite(context: impl Into<String>) -> Self {
        LearnError::NotPositiveDefinite {
            context: context.into(),
        }
    }

    /// Create a degenerate normal error
    pub fn degenerate_normal(context: impl Into<String>) -> Self {
        LearnError::DegenerateNormal {
            context: context.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl fmt::Display,
        constraint: impl Into<String>,
    ) -> Self {
        LearnError::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Whether the error stems from numerical breakdown of the geometry
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            LearnError::NotPositiveDefinite { .. }
                | LearnError::DegenerateNormal { .. }
                | LearnError::NoValidCandidate { .. }
        )
    }
}
