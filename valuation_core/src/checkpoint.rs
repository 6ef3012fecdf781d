//! Versioned binary snapshots of learning state.
//!
//! Snapshots carry a version header so incompatible files are rejected
//! during load. Loaded state is re-validated before it is handed back.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::LearnError;
use crate::geometry::Ellipsoid;
use crate::learner::{CutRecord, LearningHistory};
use crate::pricing::MarketTerms;

const HISTORY_CHECKPOINT_VERSION: u32 = 1;

/// Failure to persist or restore a [`LearningHistory`].
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    /// Written by an incompatible build.
    VersionMismatch { expected: u32, found: u32 },
    /// Decoded, but the pieces do not fit together.
    InvalidFormat(String),
    /// A restored ellipsoid or market parameter was rejected.
    Learn(LearnError),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(err) => write!(f, "history file: {err}"),
            CheckpointError::Serialization(err) => write!(f, "history encoding: {err}"),
            CheckpointError::VersionMismatch { expected, found } => write!(
                f,
                "history snapshot is version {found}, this build reads version {expected}",
            ),
            CheckpointError::InvalidFormat(msg) => write!(f, "inconsistent history snapshot: {msg}"),
            CheckpointError::Learn(err) => write!(f, "history snapshot rejected: {err}"),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io(err) => Some(err),
            CheckpointError::Serialization(err) => Some(&**err),
            CheckpointError::Learn(err) => Some(err),
            CheckpointError::VersionMismatch { .. } | CheckpointError::InvalidFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(err: std::io::Error) -> Self {
        CheckpointError::Io(err)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(err: bincode::Error) -> Self {
        CheckpointError::Serialization(err)
    }
}

impl From<LearnError> for CheckpointError {
    fn from(err: LearnError) -> Self {
        CheckpointError::Learn(err)
    }
}

/// Fixed-width little-endian integers, so snapshots are portable.
fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

fn encode_to(path: &Path, snapshot: &LearningHistoryCheckpoint) -> Result<(), CheckpointError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)?,
        _ => {}
    }
    let mut writer = BufWriter::new(File::create(path)?);
    bincode_options().serialize_into(&mut writer, snapshot)?;
    writer.flush()?;
    Ok(())
}

fn decode_from(path: &Path) -> Result<LearningHistoryCheckpoint, CheckpointError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode_options().deserialize_from(reader)?)
}

#[derive(Serialize, Deserialize)]
struct EllipsoidCheckpoint {
    center: Vec<f64>,
    shape_mat: Vec<f64>,
}

impl EllipsoidCheckpoint {
    fn capture(ellipsoid: &Ellipsoid) -> Self {
        Self {
            center: ellipsoid.center().to_vec(),
            shape_mat: ellipsoid.shape_mat().iter().copied().collect(),
        }
    }

    fn restore(self) -> Result<Ellipsoid, CheckpointError> {
        let dim = self.center.len();
        if self.shape_mat.len() != dim * dim {
            return Err(CheckpointError::InvalidFormat(format!(
                "shape matrix has {} entries for dimension {}",
                self.shape_mat.len(),
                dim
            )));
        }
        let shape_mat = ndarray::Array2::from_shape_vec((dim, dim), self.shape_mat)
            .map_err(|err| CheckpointError::InvalidFormat(err.to_string()))?;
        Ok(Ellipsoid::new(ndarray::Array1::from(self.center), shape_mat)?)
    }
}

#[derive(Serialize, Deserialize)]
struct LearningHistoryCheckpoint {
    version: u32,
    terms: MarketTerms,
    ellipsoids: Vec<EllipsoidCheckpoint>,
    cuts: Vec<CutRecord>,
}

impl LearningHistory {
    /// Writes the full history (terms, every ellipsoid, every cut).
    pub fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let snapshot = LearningHistoryCheckpoint {
            version: HISTORY_CHECKPOINT_VERSION,
            terms: *self.terms(),
            ellipsoids: self.ellipsoids().map(EllipsoidCheckpoint::capture).collect(),
            cuts: self.cuts().to_vec(),
        };
        encode_to(path.as_ref(), &snapshot)
    }

    /// Reads a history written by [`LearningHistory::save_checkpoint`],
    /// re-validating the market terms and every ellipsoid.
    pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let snapshot = decode_from(path.as_ref())?;
        if snapshot.version != HISTORY_CHECKPOINT_VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: HISTORY_CHECKPOINT_VERSION,
                found: snapshot.version,
            });
        }

        let terms = MarketTerms::new(
            snapshot.terms.items,
            snapshot.terms.budget,
            snapshot.terms.bit_length,
        )?;
        if snapshot.ellipsoids.len() != snapshot.cuts.len() + 1 {
            return Err(CheckpointError::InvalidFormat(format!(
                "{} ellipsoids recorded for {} cuts",
                snapshot.ellipsoids.len(),
                snapshot.cuts.len()
            )));
        }

        let mut ellipsoids = snapshot
            .ellipsoids
            .into_iter()
            .map(EllipsoidCheckpoint::restore)
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(ellipsoid) = ellipsoids.iter().find(|e| e.dim() != terms.items) {
            return Err(CheckpointError::Learn(LearnError::dimension_mismatch(
                terms.items,
                ellipsoid.dim(),
                "checkpointed ellipsoid",
            )));
        }

        let initial = ellipsoids.remove(0);
        Ok(LearningHistory::from_parts(
            terms,
            initial,
            ellipsoids,
            snapshot.cuts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learner::LearningSession;
    use ndarray::array;
    use valuation_shared::LinearUtilityBuyer;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "valuation_checkpoint_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn history_checkpoint_resumes_session() {
        let mut buyer = LinearUtilityBuyer::new(array![0.6, 0.4], 1.0, 8).unwrap();
        let terms = MarketTerms::from_buyer(&buyer).unwrap();
        let initial = Ellipsoid::ball(array![0.7, 0.55], 0.5).unwrap();
        let mut session = LearningSession::start(initial, terms).unwrap();
        for _ in 0..4 {
            session.step(&mut buyer, false).unwrap();
        }

        let dir = scratch_dir("resume");
        let path = dir.join("history.bin");
        session.history().save_checkpoint(&path).unwrap();

        let restored = LearningHistory::load_checkpoint(&path).unwrap();
        assert_eq!(restored.len(), 4);
        assert_eq!(restored.cuts(), session.history().cuts());
        let before = session.current();
        let after = restored.final_ellipsoid();
        assert!((before.volume() - after.volume()).abs() < 1e-12);
        assert_eq!(before.center(), after.center());

        let mut resumed = LearningSession::resume(restored);
        resumed.step(&mut buyer, false).unwrap();
        assert_eq!(resumed.iterations(), 5);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = scratch_dir("version");
        let path = dir.join("history.bin");
        let snapshot = LearningHistoryCheckpoint {
            version: HISTORY_CHECKPOINT_VERSION + 1,
            terms: MarketTerms::new(2, 1.0, 8).unwrap(),
            ellipsoids: vec![EllipsoidCheckpoint {
                center: vec![0.5, 0.5],
                shape_mat: vec![0.5, 0.0, 0.0, 0.5],
            }],
            cuts: Vec::new(),
        };
        encode_to(&path, &snapshot).unwrap();

        let result = LearningHistory::load_checkpoint(&path);
        assert!(matches!(result, Err(CheckpointError::VersionMismatch { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_shape_matrix_is_rejected() {
        let dir = scratch_dir("corrupt");
        let path = dir.join("history.bin");
        let snapshot = LearningHistoryCheckpoint {
            version: HISTORY_CHECKPOINT_VERSION,
            terms: MarketTerms::new(2, 1.0, 8).unwrap(),
            ellipsoids: vec![EllipsoidCheckpoint {
                center: vec![0.5, 0.5],
                shape_mat: vec![1.0, 2.0, 2.0, 1.0],
            }],
            cuts: Vec::new(),
        };
        encode_to(&path, &snapshot).unwrap();

        let result = LearningHistory::load_checkpoint(&path);
        assert!(matches!(result, Err(CheckpointError::Learn(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn truncated_file_is_a_serialization_error() {
        let dir = scratch_dir("truncated");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("history.bin");
        std::fs::write(&path, [1u8, 0, 0]).unwrap();

        let result = LearningHistory::load_checkpoint(&path);
        match result {
            Err(err @ CheckpointError::Serialization(_)) => {
                assert!(std::error::Error::source(&err).is_some());
            }
            other => panic!("expected serialization error, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = scratch_dir("missing");
        let result = LearningHistory::load_checkpoint(dir.join("absent.bin"));
        assert!(matches!(result, Err(CheckpointError::Io(_))));
    }
}
