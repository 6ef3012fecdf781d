//! One posted-price experiment per step.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use valuation_shared::Buyer;

use crate::error::{LearnError, LearnResult};
use crate::geometry::{min_volume_ellipsoid, Direction, Ellipsoid, Halfspace};
use crate::pricing::{degree_of_freedom_cut, hyperplane_from_bundle, select_best_price, MarketTerms};

/// The two cuts applied in one iteration and the experiment behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutRecord {
    pub pair: (usize, usize),
    pub price: Array1<f64>,
    pub bundle: Array1<f64>,
    /// Cut revealed by the bundle, through the pre-iteration center
    pub informative: Halfspace,
    /// Cut toward the budget simplex, through the intermediate center
    pub simplex: Halfspace,
}

/// Every ellipsoid of a run, starting with the initial one.
///
/// `ellipsoids()` always yields one more item than `cuts()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningHistory {
    terms: MarketTerms,
    initial: Ellipsoid,
    updates: Vec<Ellipsoid>,
    cuts: Vec<CutRecord>,
}

impl LearningHistory {
    pub fn new(initial: Ellipsoid, terms: MarketTerms) -> LearnResult<Self> {
        if initial.dim() != terms.items {
            return Err(LearnError::dimension_mismatch(
                terms.items,
                initial.dim(),
                "LearningHistory initial ellipsoid",
            ));
        }
        Ok(Self {
            terms,
            initial,
            updates: Vec::new(),
            cuts: Vec::new(),
        })
    }

    pub(crate) fn from_parts(
        terms: MarketTerms,
        initial: Ellipsoid,
        updates: Vec<Ellipsoid>,
        cuts: Vec<CutRecord>,
    ) -> Self {
        Self {
            terms,
            initial,
            updates,
            cuts,
        }
    }

    pub fn terms(&self) -> &MarketTerms {
        &self.terms
    }

    pub fn initial(&self) -> &Ellipsoid {
        &self.initial
    }

    pub fn final_ellipsoid(&self) -> &Ellipsoid {
        self.updates.last().unwrap_or(&self.initial)
    }

    pub fn ellipsoids(&self) -> impl Iterator<Item = &Ellipsoid> + '_ {
        std::iter::once(&self.initial).chain(self.updates.iter())
    }

    pub fn cuts(&self) -> &[CutRecord] {
        &self.cuts
    }

    /// Number of completed iterations.
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    fn push(&mut self, next: Ellipsoid, cut: CutRecord) {
        self.updates.push(next);
        self.cuts.push(cut);
    }
}

/// Per-iteration observation handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationReport {
    /// 1-based index of the completed iteration
    pub iteration: usize,
    pub pair: (usize, usize),
    pub price: Vec<f64>,
    pub bundle: Vec<f64>,
    pub direction: Direction,
    pub volume: f64,
    /// Ascending
    pub eigenvalues: Vec<f64>,
    pub center: Vec<f64>,
    /// Whether the caller's reference point is still inside
    pub reference_member: Option<bool>,
}

/// Stepwise driver over a [`LearningHistory`].
///
/// Stopping early is just not calling [`step`](Self::step) again; the last
/// completed ellipsoid stays valid.
#[derive(Debug, Clone)]
pub struct LearningSession {
    history: LearningHistory,
    reference: Option<Array1<f64>>,
}

impl LearningSession {
    pub fn start(initial: Ellipsoid, terms: MarketTerms) -> LearnResult<Self> {
        Ok(Self {
            history: LearningHistory::new(initial, terms)?,
            reference: None,
        })
    }

    /// Resumes from a previously recorded history.
    pub fn resume(history: LearningHistory) -> Self {
        Self {
            history,
            reference: None,
        }
    }

    /// Tracks membership of `reference` in every report.
    pub fn with_reference(mut self, reference: Array1<f64>) -> LearnResult<Self> {
        if reference.len() != self.history.terms.items {
            return Err(LearnError::dimension_mismatch(
                self.history.terms.items,
                reference.len(),
                "LearningSession reference point",
            ));
        }
        self.reference = Some(reference);
        Ok(self)
    }

    pub fn current(&self) -> &Ellipsoid {
        self.history.final_ellipsoid()
    }

    pub fn history(&self) -> &LearningHistory {
        &self.history
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    pub fn into_history(self) -> LearningHistory {
        self.history
    }

    /// Runs one iteration: price, query, informative cut, simplex cut.
    ///
    /// On error the session is left exactly as before the call.
    pub fn step<B: Buyer + ?Sized>(
        &mut self,
        buyer: &mut B,
        verbose: bool,
    ) -> LearnResult<IterationReport> {
        let terms = self.history.terms;
        if buyer.no_of_items() != terms.items {
            return Err(LearnError::dimension_mismatch(
                terms.items,
                buyer.no_of_items(),
                "LearningSession buyer items",
            ));
        }

        let current = self.history.final_ellipsoid();
        let selection = select_best_price(&terms, current)?;
        let bundle = buyer.bundle(&selection.price)?;
        if bundle.len() != terms.items {
            return Err(LearnError::dimension_mismatch(
                terms.items,
                bundle.len(),
                "bundle returned by buyer",
            ));
        }

        let informative = hyperplane_from_bundle(&bundle, &selection, current.center())?;
        let intermediate = min_volume_ellipsoid(current, &informative)?;
        let simplex = degree_of_freedom_cut(intermediate.center())?;
        let next = min_volume_ellipsoid(&intermediate, &simplex)?;

        let report = IterationReport {
            iteration: self.history.len() + 1,
            pair: selection.pair,
            price: selection.price.to_vec(),
            bundle: bundle.to_vec(),
            direction: informative.direction(),
            volume: next.volume(),
            eigenvalues: next.eigenvalues().to_vec(),
            center: next.center().to_vec(),
            reference_member: self.reference.as_ref().map(|point| next.contains(point)),
        };

        if verbose {
            tracing::debug!(
                "iteration {}: pair {:?} {} cut, volume {:.3e}, center {:?}",
                report.iteration,
                report.pair,
                report.direction,
                report.volume,
                report.center
            );
        }

        self.history.push(
            next,
            CutRecord {
                pair: selection.pair,
                price: selection.price,
                bundle,
                informative,
                simplex,
            },
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use valuation_shared::LinearUtilityBuyer;

    fn session_for(buyer: &LinearUtilityBuyer, center: Array1<f64>) -> LearningSession {
        let terms = MarketTerms::from_buyer(buyer).unwrap();
        let initial = Ellipsoid::ball(center, 0.5).unwrap();
        LearningSession::start(initial, terms).unwrap()
    }

    #[test]
    fn step_records_both_cuts() {
        let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
        let mut session = session_for(&buyer, array![0.7, 0.55]);

        let report = session.step(&mut buyer, false).unwrap();
        assert_eq!(report.iteration, 1);
        assert_eq!(session.iterations(), 1);
        assert_eq!(session.history().ellipsoids().count(), 2);

        let cut = &session.history().cuts()[0];
        assert_eq!(cut.informative.pivot(), session.history().initial().center());
        assert_eq!(cut.informative.direction(), report.direction);
        assert_eq!(cut.simplex.normal(), &array![1.0, 1.0]);
        assert_eq!(session.current().center().to_vec(), report.center);
    }

    #[test]
    fn reference_membership_is_reported() {
        let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
        let mut session = session_for(&buyer, array![0.7, 0.55])
            .with_reference(array![0.6, 0.4])
            .unwrap();

        for _ in 0..5 {
            let report = session.step(&mut buyer, true).unwrap();
            assert_eq!(report.reference_member, Some(true));
        }
    }

    #[test]
    fn rejects_buyer_with_other_item_count() {
        let buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
        let mut session = session_for(&buyer, array![0.7, 0.55]);
        let mut wider = LinearUtilityBuyer::new(array![0.3, 0.3, 0.4], 1.0, 8).unwrap();

        let result = session.step(&mut wider, false);
        assert!(matches!(result, Err(LearnError::DimensionMismatch { .. })));
        assert!(session.history().is_empty());
    }

    #[test]
    fn rejects_misplaced_reference() {
        let buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
        let result = session_for(&buyer, array![0.7, 0.55]).with_reference(array![0.6]);
        assert!(result.is_err());
    }
}
