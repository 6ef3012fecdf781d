//! JSONL run journal.
//!
//! The journal appends one line per sampled iteration while keeping an
//! in-memory copy for deterministic testing.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::config::JournalConfig;
use crate::geometry::Direction;
use crate::learner::{IterationObserver, IterationReport};

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Single journal line.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub sequence: usize,
    pub iteration: usize,
    pub pair: (usize, usize),
    pub direction: Direction,
    pub volume: f64,
    pub max_eigenvalue: f64,
    pub center: Vec<f64>,
    pub reference_member: Option<bool>,
    pub timestamp_ms: u128,
}

impl JournalEntry {
    fn from_report(report: &IterationReport) -> Self {
        Self {
            sequence: 0,
            iteration: report.iteration,
            pair: report.pair,
            direction: report.direction,
            volume: report.volume,
            max_eigenvalue: report.eigenvalues.last().copied().unwrap_or(f64::NAN),
            center: report.center.clone(),
            reference_member: report.reference_member,
            timestamp_ms: timestamp_ms(),
        }
    }
}

/// Iteration journal with a configurable sampling interval.
#[derive(Debug, Clone)]
pub struct JsonlJournal {
    path: PathBuf,
    log_every: usize,
    sequence: usize,
    entries: Vec<JournalEntry>,
}

impl JsonlJournal {
    pub fn new<P: Into<PathBuf>>(path: P, log_every: usize) -> Self {
        Self {
            path: path.into(),
            log_every: log_every.max(1),
            sequence: 0,
            entries: Vec::new(),
        }
    }

    pub fn from_config(config: &JournalConfig) -> Self {
        Self::new(config.path.clone(), config.log_every)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every recorded entry, sampled or not.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn record(&mut self, report: &IterationReport) -> io::Result<()> {
        self.sequence += 1;
        let mut entry = JournalEntry::from_report(report);
        entry.sequence = self.sequence;
        self.entries.push(entry.clone());

        if self.sequence % self.log_every == 0 {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            append_json_line(&self.path, &entry)?;
        }

        Ok(())
    }
}

impl IterationObserver for JsonlJournal {
    fn on_iteration(&mut self, report: &IterationReport) {
        if let Err(err) = self.record(report) {
            tracing::warn!(
                "Failed to append iteration {} to {}: {}",
                report.iteration,
                self.path.display(),
                err
            );
        }
    }

    fn name(&self) -> &str {
        "JsonlJournal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(iteration: usize) -> IterationReport {
        IterationReport {
            iteration,
            pair: (1, 0),
            price: vec![0.9, 1.0],
            bundle: vec![0.0, 1.0],
            direction: Direction::AtMost,
            volume: 0.5 / iteration as f64,
            eigenvalues: vec![0.2, 0.3],
            center: vec![0.55, 0.45],
            reference_member: None,
        }
    }

    fn scratch_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "valuation_journal_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir.join("run.jsonl")
    }

    #[test]
    fn journal_samples_lines_but_keeps_all_entries() {
        let path = scratch_path("sampling");
        let mut journal = JsonlJournal::new(&path, 2);
        for idx in 1..=5 {
            journal.record(&report(idx)).unwrap();
        }

        let sequences: Vec<usize> = journal.entries().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["iteration"], 4);
        assert_eq!(second["direction"], "atMost");
        assert_eq!(second["maxEigenvalue"], 0.3);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn journal_observes_through_trait() {
        let path = scratch_path("observer");
        let mut journal = JsonlJournal::from_config(&JournalConfig {
            path: path.clone(),
            log_every: 0,
        });
        journal.on_iteration(&report(1));
        assert_eq!(journal.entries().len(), 1);
        assert!(path.exists());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
