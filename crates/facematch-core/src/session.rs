//! In-memory identification session.
//!
//! Owns the registered gallery. Matching never mutates anything here; the
//! caller decides when to `publish` a result.

use crate::classifier::{classify, Classification, DISTANCE_THRESHOLD};
use crate::matcher::{EuclideanMatcher, MatchError, Matcher};
use crate::types::{Embedding, Gallery, GalleryError, RegisteredFace};

pub struct Session {
    gallery: Gallery,
    matcher: Box<dyn Matcher + Send>,
    threshold: f32,
    last: Option<Classification>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Gallery::default(), Box::new(EuclideanMatcher::default()))
    }
}

impl Session {
    pub fn new(gallery: Gallery, matcher: Box<dyn Matcher + Send>) -> Self {
        Self {
            gallery,
            matcher,
            threshold: DISTANCE_THRESHOLD,
            last: None,
        }
    }

    pub fn register(&mut self, name: &str, embedding: Embedding) -> Result<&RegisteredFace, GalleryError> {
        self.gallery.add(name, embedding)
    }

    /// Rank the gallery against `probe` and classify the nearest entry.
    pub fn identify(&self, probe: &Embedding) -> Result<Classification, MatchError> {
        let neighbors = self.matcher.nearest(probe, &self.gallery)?;
        Ok(classify(neighbors, self.threshold))
    }

    /// Record `classification` as the latest published result.
    pub fn publish(&mut self, classification: Classification) {
        tracing::info!(label = %classification.label, "result published");
        self.last = Some(classification);
    }

    pub fn last(&self) -> Option<&Classification> {
        self.last.as_ref()
    }

    pub fn entries(&self) -> &[RegisteredFace] {
        self.gallery.entries()
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }
}
