//! # Valuation Learning Core
//!
//! Learns a buyer's linear valuation vector from posted-price experiments.
//! Every experiment offers two items at prices set by the current ellipsoid's
//! center and prices everything else out of reach; the bundle the buyer picks
//! reveals which of the two it values more per unit of price, and the
//! central-cut ellipsoid method folds that answer into a smaller ellipsoid
//! that still contains the true valuation.
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use valuation_learning_core::{EllipsoidLearner, LearnerConfig, LinearUtilityBuyer, TracingObserver};
//!
//! let mut buyer = LinearUtilityBuyer::new(array![0.3, 0.3, 0.4], 1.0, 8).unwrap();
//!
//! let mut config = LearnerConfig::default();
//! config.max_iterations = 25;
//! let learner = EllipsoidLearner::new(config).unwrap();
//!
//! let outcome = learner
//!     .run(&mut buyer, &array![0.3, 0.3, 0.4], None, &mut TracingObserver)
//!     .unwrap();
//! let estimate = outcome.simplex_estimate().unwrap();
//! println!("Estimated valuation: {estimate}");
//! ```
//!
//! ## Core Modules
//!
//! - [`geometry`] - Ellipsoids, halfspaces and the minimum-volume update
//! - [`pricing`] - Price selection and purchase-derived cuts
//! - [`learner`] - Stepwise sessions and the full experiment loop
//! - [`config`] - Learner configuration via TOML
//! - [`logging`] - JSON line-delimited run journal
//! - [`checkpoint`] - Versioned snapshots of learning history

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod geometry;
pub mod learner;
pub mod logging;
pub mod pricing;

pub use checkpoint::CheckpointError;
pub use config::{ConfigError, JournalConfig, LearnerConfig};
pub use error::{LearnError, LearnResult};
pub use geometry::{
    min_volume_ellipsoid, volume_ratio, Direction, Ellipsoid, Halfspace, Hyperplane,
    HyperplaneSection,
};
pub use learner::{
    default_center_offset, CutRecord, EllipsoidLearner, IterationObserver, IterationReport,
    LearningHistory, LearningOutcome, LearningSession, NoopObserver, StopReason, TracingObserver,
};
pub use logging::{JournalEntry, JsonlJournal};
pub use pricing::{
    degree_of_freedom_cut, hyperplane_from_bundle, select_best_price, CandidatePrice, MarketTerms,
};
pub use valuation_shared::{Buyer, LinearUtilityBuyer, ValuationOracle};
