//! Bounded best-of-K artifact retention
//!
//! A [`Retainer`] keeps the K highest-scoring named artifacts and deletes
//! evicted ones from storage. Each artifact family (checkpoints,
//! confusion matrices, ROC curves) owns an independent instance with its
//! own capacity and score definition. Eviction happens only on `offer`;
//! there is no reconciliation sweep of storage.

use crate::Result;
use std::path::{Path, PathBuf};

/// One retained scored artifact
#[derive(Clone, Debug, PartialEq)]
pub struct RetainedArtifact {
    /// Performance score at save time (validation accuracy)
    pub score: f32,

    /// Backing file on storage
    pub path: PathBuf,

    /// Insertion order, used to break score ties (earlier wins)
    pub sequence: u64,
}

/// Bounded set of the K highest-scoring artifacts
pub struct Retainer {
    capacity: usize,
    next_sequence: u64,
    entries: Vec<RetainedArtifact>,
}

impl Retainer {
    /// Create a retainer keeping at most `capacity` artifacts
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_sequence: 0,
            entries: Vec::new(),
        }
    }

    /// Offer a scored candidate, evicting the lowest-scoring overflow
    ///
    /// The candidate is inserted, the set is re-sorted by score
    /// descending (ties broken by earlier insertion), and entries beyond
    /// capacity are evicted: their backing files are deleted and they are
    /// returned. A backing file that is already gone is a no-op, not an
    /// error. Eviction is irreversible within a run.
    pub fn offer(&mut self, score: f32, path: impl Into<PathBuf>) -> Result<Vec<RetainedArtifact>> {
        self.entries.push(RetainedArtifact {
            score,
            path: path.into(),
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;

        // Stable sort: equal scores keep insertion order, first wins
        self.entries
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let evicted: Vec<RetainedArtifact> = self.entries.split_off(self.capacity.min(self.entries.len()));
        for artifact in &evicted {
            remove_if_present(&artifact.path)?;
        }
        Ok(evicted)
    }

    /// Currently retained artifacts, best first
    pub fn entries(&self) -> &[RetainedArtifact] {
        &self.entries
    }

    /// Number of retained artifacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been retained yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity K
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Format an artifact file name encoding epoch and score
///
/// The encoding is load-bearing: eviction scans can recover the numeric
/// score from the name alone.
pub fn artifact_file_name(prefix: &str, epoch: usize, score: f32, ext: &str) -> String {
    format!("{prefix}_epoch_{epoch}_acc_{score:.4}.{ext}")
}

/// Parse `(epoch, score)` back out of an artifact file name
pub fn parse_artifact_name(name: &str) -> Option<(usize, f32)> {
    let stem = name.rsplit_once('.').map_or(name, |(s, _)| s);
    let (head, score) = stem.rsplit_once("_acc_")?;
    let (_, epoch) = head.rsplit_once("_epoch_")?;
    Some((epoch.parse().ok()?, score.parse().ok()?))
}
