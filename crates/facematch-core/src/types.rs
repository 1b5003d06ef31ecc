use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output length of the MobileFaceNet embedding model.
pub const EMBEDDING_DIM: usize = 192;

/// Bounding box for a detected face, in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl BoundingBox {
    /// Box covering a whole `width` x `height` image with full confidence.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            confidence: 1.0,
        }
    }
}

/// Face embedding vector (192-dimensional for MobileFaceNet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when no component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Euclidean distance between two embeddings of the same length.
    ///
    /// Squared differences are accumulated in `f32` and rooted once.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| {
                let diff = a - b;
                diff * diff
            })
            .sum::<f32>()
            .sqrt()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// A user-named face kept in the in-memory gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredFace {
    pub name: String,
    pub embedding: Embedding,
    pub registered_at: DateTime<Utc>,
}

/// One ranked neighbour of a probe embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub name: String,
    pub distance: f32,
}

#[derive(Error, Debug, PartialEq)]
pub enum GalleryError {
    #[error("face name must not be empty")]
    EmptyName,
    #[error("embedding has {actual} dimensions, gallery expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding for `{0}` contains NaN or infinite values")]
    NonFinite(String),
}

/// Append-only, insertion-ordered set of registered faces.
///
/// Every stored embedding has the gallery's dimension and only finite values.
#[derive(Debug, Clone, Serialize)]
pub struct Gallery {
    dim: usize,
    entries: Vec<RegisteredFace>,
}

impl Default for Gallery {
    fn default() -> Self {
        Self::with_dim(EMBEDDING_DIM)
    }
}

impl Gallery {
    pub fn with_dim(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RegisteredFace] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredFace> {
        self.entries.iter()
    }

    /// Register a named embedding at the end of the gallery.
    pub fn add(&mut self, name: &str, embedding: Embedding) -> Result<&RegisteredFace, GalleryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GalleryError::EmptyName);
        }
        if embedding.len() != self.dim {
            return Err(GalleryError::DimensionMismatch {
                expected: self.dim,
                actual: embedding.len(),
            });
        }
        if !embedding.is_finite() {
            return Err(GalleryError::NonFinite(name.to_string()));
        }

        self.entries.push(RegisteredFace {
            name: name.to_string(),
            embedding,
            registered_at: Utc::now(),
        });
        tracing::debug!(name, entries = self.entries.len(), "gallery entry appended");

        let idx = self.entries.len() - 1;
        Ok(&self.entries[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance_identical() {
        let a = Embedding::new(vec![0.3, -0.2, 0.9]);
        assert_eq!(a.euclidean_distance(&a.clone()), 0.0);
    }

    #[test]
    fn test_euclidean_distance_known_triangle() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![3.0, 4.0]);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_distance_constant_offset() {
        let a = Embedding::new(vec![0.0; EMBEDDING_DIM]);
        let b = Embedding::new(vec![0.1; EMBEDDING_DIM]);
        let expected = 0.1 * (EMBEDDING_DIM as f32).sqrt();
        let dist = a.euclidean_distance(&b);
        assert!((dist - expected).abs() < 1e-4, "got {dist}, expected {expected}");
        assert!((dist - 1.3856).abs() < 1e-3);
    }

    #[test]
    fn test_gallery_rejects_empty_name() {
        let mut gallery = Gallery::with_dim(2);
        let err = gallery.add("   ", Embedding::new(vec![0.0, 0.0])).unwrap_err();
        assert_eq!(err, GalleryError::EmptyName);
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_gallery_rejects_wrong_dimension() {
        let mut gallery = Gallery::default();
        let err = gallery.add("alice", Embedding::new(vec![0.0; 10])).unwrap_err();
        assert_eq!(
            err,
            GalleryError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                actual: 10
            }
        );
    }

    #[test]
    fn test_gallery_rejects_non_finite_embedding() {
        let mut gallery = Gallery::with_dim(2);
        gallery.add("a", Embedding::new(vec![1.0, 0.0])).unwrap();
        let err = gallery.add("nan", Embedding::new(vec![f32::NAN, 0.0])).unwrap_err();
        assert_eq!(err, GalleryError::NonFinite("nan".into()));
        let err = gallery.add("inf", Embedding::new(vec![0.0, f32::INFINITY])).unwrap_err();
        assert_eq!(err, GalleryError::NonFinite("inf".into()));
        assert_eq!(gallery.len(), 1);
    }

    #[test]
    fn test_gallery_keeps_insertion_order_and_trims_names() {
        let mut gallery = Gallery::with_dim(1);
        gallery.add(" alice ", Embedding::new(vec![1.0])).unwrap();
        gallery.add("bob", Embedding::new(vec![2.0])).unwrap();
        let names: Vec<_> = gallery.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
        assert_eq!(gallery.len(), 2);
    }

    #[test]
    fn test_bounding_box_full() {
        let b = BoundingBox::full(640, 480);
        assert_eq!((b.x, b.y, b.width, b.height), (0.0, 0.0, 640.0, 480.0));
    }
}
