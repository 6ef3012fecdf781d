//! Ellipsoid-method learner of a buyer's linear valuation.
//!
//! Each iteration posts the price vector that splits the current ellipsoid
//! along its widest pairwise direction, reads the bundle the buyer returns,
//! and shrinks the ellipsoid twice: once with the revealed preference and
//! once toward the budget simplex `Σ aᵢ = 1`.

pub mod observer;
pub mod session;

use ndarray::{array, Array1};
use serde::Serialize;
use valuation_shared::Buyer;

use crate::config::LearnerConfig;
use crate::error::{LearnError, LearnResult};
use crate::geometry::{Ellipsoid, Hyperplane};
use crate::pricing::{MarketTerms, SIMPLEX_TOTAL};

pub use observer::{IterationObserver, NoopObserver, TracingObserver};
pub use session::{CutRecord, IterationReport, LearningHistory, LearningSession};

/// Offset added to the caller's initial guess so the first center is not
/// already on the budget simplex.
pub fn default_center_offset(items: usize) -> Array1<f64> {
    match items {
        2 => array![0.1, 0.15],
        3 => array![0.1, -0.05, 0.15],
        n => Array1::zeros(n),
    }
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    IterationCap,
    Converged { max_eigenvalue: f64 },
    /// Iteration `iteration` could not produce a valid ellipsoid; every
    /// ellipsoid before it is kept.
    NumericalBreakdown { iteration: usize, detail: String },
}

/// Result of [`EllipsoidLearner::run`].
#[derive(Debug, Clone)]
pub struct LearningOutcome {
    pub history: LearningHistory,
    pub stop_reason: StopReason,
}

impl LearningOutcome {
    pub fn final_ellipsoid(&self) -> &Ellipsoid {
        self.history.final_ellipsoid()
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Point estimate on the budget simplex.
    ///
    /// Center of the final ellipsoid's section with `Σ xᵢ = 1`; the final
    /// center itself when the simplex misses the ellipsoid.
    pub fn simplex_estimate(&self) -> LearnResult<Array1<f64>> {
        let ellipsoid = self.final_ellipsoid();
        let simplex = Hyperplane::simplex(ellipsoid.dim(), SIMPLEX_TOTAL)?;
        Ok(match ellipsoid.intersect_hyperplane(&simplex)? {
            Some(section) => section.center().clone(),
            None => ellipsoid.center().clone(),
        })
    }
}

/// Runs the full experiment loop against a buyer.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use valuation_learning_core::{EllipsoidLearner, LearnerConfig, LinearUtilityBuyer, NoopObserver};
///
/// let mut config = LearnerConfig::default();
/// config.max_iterations = 20;
///
/// let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
/// let learner = EllipsoidLearner::new(config).unwrap();
/// let outcome = learner
///     .run(&mut buyer, &array![0.6, 0.4], None, &mut NoopObserver)
///     .unwrap();
///
/// assert!(outcome.final_ellipsoid().contains(&array![0.6, 0.4]));
/// ```
#[derive(Debug, Clone)]
pub struct EllipsoidLearner {
    config: LearnerConfig,
}

impl EllipsoidLearner {
    pub fn new(config: LearnerConfig) -> LearnResult<Self> {
        if !config.initial_radius.is_finite() || config.initial_radius <= 0.0 {
            return Err(LearnError::invalid_parameter(
                "initial_radius",
                config.initial_radius,
                "> 0",
            ));
        }
        if config.max_iterations == 0 {
            return Err(LearnError::invalid_parameter("max_iterations", 0, "≥ 1"));
        }
        if let Some(threshold) = config.convergence_threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(LearnError::invalid_parameter(
                    "convergence_threshold",
                    threshold,
                    "> 0",
                ));
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Ball of radius `initial_radius` (in the shape-matrix sense) around
    /// `guess` plus the configured offset.
    pub fn initial_ellipsoid(&self, guess: &Array1<f64>) -> LearnResult<Ellipsoid> {
        let offset = self.config.center_offset_for(guess.len())?;
        Ellipsoid::ball(guess + &offset, self.config.initial_radius)
    }

    /// Starts a session for `buyer` without running any iteration.
    pub fn session<B: Buyer + ?Sized>(
        &self,
        buyer: &B,
        guess: &Array1<f64>,
    ) -> LearnResult<LearningSession> {
        let terms = MarketTerms::from_buyer(buyer)?;
        if guess.len() != terms.items {
            return Err(LearnError::dimension_mismatch(
                terms.items,
                guess.len(),
                "initial guess",
            ));
        }
        LearningSession::start(self.initial_ellipsoid(guess)?, terms)
    }

    /// Iterates until the cap or, when configured, until the largest
    /// eigenvalue of the shape matrix falls to the convergence threshold.
    ///
    /// A numerical breakdown of the geometry ends the run with
    /// [`StopReason::NumericalBreakdown`] and the history completed so far.
    /// Any other error is returned; the buyer is never re-queried.
    pub fn run<B, O>(
        &self,
        buyer: &mut B,
        guess: &Array1<f64>,
        reference: Option<&Array1<f64>>,
        observer: &mut O,
    ) -> LearnResult<LearningOutcome>
    where
        B: Buyer + ?Sized,
        O: IterationObserver + ?Sized,
    {
        let mut session = self.session(&*buyer, guess)?;
        if let Some(point) = reference {
            session = session.with_reference(point.clone())?;
        }

        let stop_reason = loop {
            if let Some(threshold) = self.config.convergence_threshold {
                let max_eigenvalue = session.current().max_eigenvalue();
                if max_eigenvalue <= threshold {
                    break StopReason::Converged { max_eigenvalue };
                }
            }
            if session.iterations() >= self.config.max_iterations {
                break StopReason::IterationCap;
            }

            match session.step(buyer, self.config.verbose) {
                Ok(report) => observer.on_iteration(&report),
                Err(err) if err.is_numerical() => {
                    tracing::warn!(
                        "Learning against {} reached its numerical limit at iteration {}: {}",
                        buyer.name(),
                        session.iterations() + 1,
                        err
                    );
                    break StopReason::NumericalBreakdown {
                        iteration: session.iterations() + 1,
                        detail: err.to_string(),
                    };
                }
                Err(err) => {
                    tracing::error!(
                        "Learning against {} stopped at iteration {}: {}",
                        buyer.name(),
                        session.iterations() + 1,
                        err
                    );
                    return Err(err);
                }
            }
        };

        tracing::info!(
            "Learning against {} finished after {} iterations ({:?}), final volume {:.3e}",
            buyer.name(),
            session.iterations(),
            stop_reason,
            session.current().volume()
        );

        Ok(LearningOutcome {
            history: session.into_history(),
            stop_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_shared::LinearUtilityBuyer;

    #[test]
    fn default_offsets_follow_item_count() {
        assert_eq!(default_center_offset(2), array![0.1, 0.15]);
        assert_eq!(default_center_offset(3), array![0.1, -0.05, 0.15]);
        assert_eq!(default_center_offset(5), Array1::<f64>::zeros(5));
    }

    #[test]
    fn initial_ellipsoid_contains_guess() {
        let learner = EllipsoidLearner::new(LearnerConfig::default()).unwrap();
        let guess = array![0.2, 0.5, 0.3];
        let initial = learner.initial_ellipsoid(&guess).unwrap();
        let expected = array![0.3, 0.45, 0.45];
        assert!(initial
            .center()
            .iter()
            .zip(expected.iter())
            .all(|(a, b)| (a - b).abs() < 1e-12));
        assert!(initial.contains(&guess));
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = LearnerConfig::default();
        config.initial_radius = 0.0;
        assert!(EllipsoidLearner::new(config).is_err());

        let mut config = LearnerConfig::default();
        config.convergence_threshold = Some(-1.0);
        assert!(EllipsoidLearner::new(config).is_err());
    }

    #[test]
    fn run_stops_at_iteration_cap() {
        let mut config = LearnerConfig::default();
        config.max_iterations = 7;
        let learner = EllipsoidLearner::new(config).unwrap();
        let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();

        let mut count = 0;
        let mut observer = |_: &IterationReport| count += 1;
        let outcome = learner
            .run(&mut buyer, &array![0.6, 0.4], None, &mut observer)
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::IterationCap);
        assert_eq!(outcome.iterations(), 7);
        assert_eq!(count, 7);
    }

    #[test]
    fn rejects_guess_of_wrong_length() {
        let learner = EllipsoidLearner::new(LearnerConfig::default()).unwrap();
        let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
        let result = learner.run(&mut buyer, &array![0.3, 0.3, 0.4], None, &mut NoopObserver);
        assert!(matches!(result, Err(LearnError::DimensionMismatch { .. })));
    }
}
