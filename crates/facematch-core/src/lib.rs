//! facematch-core — Face identification against an in-memory gallery.
//!
//! Encodes 112x112 face crops for MobileFaceNet, embeds them via ONNX
//! Runtime, and ranks registered faces by Euclidean distance.

pub mod classifier;
pub mod crop;
pub mod encoder;
pub mod matcher;
pub mod pipeline;
pub mod recognizer;
pub mod session;
pub mod types;

pub use classifier::{classify, Classification, Label, DISTANCE_THRESHOLD};
pub use matcher::{EuclideanMatcher, MatchError, Matcher};
pub use recognizer::{EmbeddingOracle, OnnxEmbedder, RecognizerError};
pub use session::Session;
pub use types::{BoundingBox, Embedding, Gallery, Neighbor, RegisteredFace, EMBEDDING_DIM};

use std::path::PathBuf;

/// Default directory for model assets: `$XDG_DATA_HOME/facematch/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facematch")
        .join("models")
}
