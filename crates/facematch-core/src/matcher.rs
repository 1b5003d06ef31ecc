//! Nearest-neighbour search over the registered gallery.

use crate::types::{Embedding, Gallery, Neighbor};
use thiserror::Error;

/// Neighbours reported by default (nearest, 2nd, 3rd).
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Error, Debug, PartialEq)]
pub enum MatchError {
    #[error("probe has {actual} dimensions, gallery expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("probe embedding contains NaN or infinite values")]
    NonFiniteProbe,
    #[error("top-k must be at least 1")]
    InvalidK,
}

/// Strategy for ranking gallery entries against a probe embedding.
pub trait Matcher {
    fn nearest(&self, probe: &Embedding, gallery: &Gallery) -> Result<Vec<Neighbor>, MatchError>;
}

/// Euclidean top-k matcher.
///
/// Scans the gallery once, keeping the `k` closest entries in a small
/// sorted buffer. Ties keep insertion order: a later entry only moves
/// ahead of an earlier one when strictly closer.
///
/// With exactly one registered face and `k >= 2`, that face is reported
/// as both nearest and second nearest so the report always has two lines.
#[derive(Debug, Clone, Copy)]
pub struct EuclideanMatcher {
    k: usize,
}

impl Default for EuclideanMatcher {
    fn default() -> Self {
        Self { k: DEFAULT_TOP_K }
    }
}

impl EuclideanMatcher {
    pub fn new(k: usize) -> Result<Self, MatchError> {
        if k == 0 {
            return Err(MatchError::InvalidK);
        }
        Ok(Self { k })
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl Matcher for EuclideanMatcher {
    fn nearest(&self, probe: &Embedding, gallery: &Gallery) -> Result<Vec<Neighbor>, MatchError> {
        if probe.len() != gallery.dim() {
            return Err(MatchError::DimensionMismatch {
                expected: gallery.dim(),
                actual: probe.len(),
            });
        }
        if !probe.is_finite() {
            return Err(MatchError::NonFiniteProbe);
        }

        // (distance, gallery index), ascending.
        let mut best: Vec<(f32, usize)> = Vec::with_capacity(self.k + 1);

        for (idx, face) in gallery.iter().enumerate() {
            let distance = probe.euclidean_distance(&face.embedding);
            // Total order keeps the buffer sorted even if a distance overflows.
            let pos = best.partition_point(|&(d, _)| d.total_cmp(&distance).is_le());
            if pos < self.k {
                best.insert(pos, (distance, idx));
                best.truncate(self.k);
            }
        }

        tracing::debug!(entries = gallery.len(), kept = best.len(), "gallery scanned");

        let entries = gallery.entries();
        let mut neighbors: Vec<Neighbor> = best
            .into_iter()
            .map(|(distance, idx)| Neighbor {
                name: entries[idx].name.clone(),
                distance,
            })
            .collect();

        if neighbors.len() == 1 && self.k >= 2 {
            let only = neighbors[0].clone();
            neighbors.push(only);
        }

        Ok(neighbors)
    }
}
