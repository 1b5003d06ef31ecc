//! MobileFaceNet embedding model via ONNX Runtime.
//!
//! Maps an encoded 112x112 face tensor to a 192-dimensional embedding.

use crate::encoder::{CHANNELS, INPUT_SIZE, TENSOR_LEN};
use crate::types::{Embedding, EMBEDDING_DIM};
use ndarray::ArrayView4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_MODEL_FILE: &str = "mobile_face_net.onnx";
const DEFAULT_INTRA_THREADS: usize = 2;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("model file not found: {0} — export mobile_face_net to ONNX and place it in the model directory")]
    ModelNotFound(String),
    #[error("input tensor must hold {TENSOR_LEN} values, got {0}")]
    InvalidInput(usize),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Anything that turns an encoded face tensor into an embedding.
///
/// Implementations may hold mutable inference state, so callers keep
/// exclusive access for the duration of a call.
pub trait EmbeddingOracle {
    fn embed(&mut self, tensor: &[f32]) -> Result<Embedding, RecognizerError>;
}

/// ONNX Runtime backed embedder.
pub struct OnnxEmbedder {
    session: Session,
}

impl OnnxEmbedder {
    /// Load the embedding model with the default thread count.
    pub fn load(model_path: &str) -> Result<Self, RecognizerError> {
        Self::load_with_threads(model_path, DEFAULT_INTRA_THREADS)
    }

    pub fn load_with_threads(model_path: &str, intra_threads: usize) -> Result<Self, RecognizerError> {
        if !Path::new(model_path).exists() {
            return Err(RecognizerError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            intra_threads,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded embedding model"
        );

        Ok(Self { session })
    }
}

impl EmbeddingOracle for OnnxEmbedder {
    fn embed(&mut self, tensor: &[f32]) -> Result<Embedding, RecognizerError> {
        if tensor.len() != TENSOR_LEN {
            return Err(RecognizerError::InvalidInput(tensor.len()));
        }

        // NHWC, as exported from the TFLite graph.
        let input = ArrayView4::from_shape((1, INPUT_SIZE, INPUT_SIZE, CHANNELS), tensor)
            .map_err(|e| RecognizerError::InferenceFailed(format!("input shape: {e}")))?;

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input)?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RecognizerError::InferenceFailed(format!("embedding extraction: {e}")))?;

        if raw.len() != EMBEDDING_DIM {
            return Err(RecognizerError::InferenceFailed(format!(
                "expected {EMBEDDING_DIM}-dim embedding, got {}",
                raw.len()
            )));
        }

        let embedding = Embedding::new(raw.to_vec());
        if !embedding.is_finite() {
            return Err(RecognizerError::InferenceFailed(
                "model produced NaN or infinite values".into(),
            ));
        }
        Ok(embedding)
    }
}
