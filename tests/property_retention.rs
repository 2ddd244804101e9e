//! Property tests for bounded artifact retention

use explicar::retain::{artifact_file_name, parse_artifact_name, Retainer};
use proptest::collection::vec;
use proptest::prelude::*;
use std::path::PathBuf;

/// Reference implementation of the keep rule: sort by score descending
/// with earlier offers winning ties, keep the first `capacity`.
fn expected_kept(scores: &[f32], capacity: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut kept: Vec<usize> = order.into_iter().take(capacity).collect();
    kept.sort_unstable();
    kept
}

proptest! {
    #[test]
    fn prop_pool_size_never_exceeds_capacity(
        scores in vec(0.0f32..1.0, 0..30),
        capacity in 1usize..6,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut retainer = Retainer::new(capacity);
        for (i, &score) in scores.iter().enumerate() {
            let path = dir.path().join(format!("artifact_{i}.bin"));
            std::fs::write(&path, b"x").unwrap();
            retainer.offer(score, path).unwrap();
            prop_assert!(retainer.len() <= capacity);
        }
        prop_assert_eq!(retainer.len(), capacity.min(scores.len()));
    }

    #[test]
    fn prop_kept_set_matches_stable_top_k(
        scores in vec(0.0f32..1.0, 0..30),
        capacity in 1usize..6,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut retainer = Retainer::new(capacity);
        let mut paths = Vec::new();
        for (i, &score) in scores.iter().enumerate() {
            let path = dir.path().join(format!("artifact_{i}.bin"));
            std::fs::write(&path, b"x").unwrap();
            retainer.offer(score, path.clone()).unwrap();
            paths.push(path);
        }

        let mut kept: Vec<PathBuf> =
            retainer.entries().iter().map(|a| a.path.clone()).collect();
        kept.sort_unstable();
        let mut expected: Vec<PathBuf> = expected_kept(&scores, capacity)
            .into_iter()
            .map(|i| paths[i].clone())
            .collect();
        expected.sort_unstable();
        prop_assert_eq!(kept, expected);

        // Evicted files are gone from disk, kept ones remain
        for (i, path) in paths.iter().enumerate() {
            let should_exist = expected_kept(&scores, capacity).contains(&i);
            prop_assert_eq!(path.exists(), should_exist);
        }
    }

    #[test]
    fn prop_artifact_name_round_trips(
        epoch in 0usize..10_000,
        score in 0.0f32..1.0,
    ) {
        let name = artifact_file_name("checkpoint", epoch, score, "json");
        let (parsed_epoch, parsed_score) = parse_artifact_name(&name).unwrap();
        prop_assert_eq!(parsed_epoch, epoch);
        prop_assert!((parsed_score - score).abs() < 5e-5);
    }
}
