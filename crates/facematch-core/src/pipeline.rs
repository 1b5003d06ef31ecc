//! Face crop → embedding → classification.

use crate::classifier::Classification;
use crate::encoder::{self, EncodeError};
use crate::matcher::MatchError;
use crate::recognizer::{EmbeddingOracle, RecognizerError};
use crate::session::Session;
use crate::types::Embedding;
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("encode: {0}")]
    Encode(#[from] EncodeError),
    #[error("embedding unavailable: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("match: {0}")]
    Match(#[from] MatchError),
}

/// Encode a 112x112 face crop and run it through `oracle`.
pub fn embed_face(oracle: &mut dyn EmbeddingOracle, face: &RgbImage) -> Result<Embedding, PipelineError> {
    let tensor = encoder::encode_rgb(face)?;
    Ok(oracle.embed(&tensor)?)
}

/// Embed `face` and classify it against the session gallery.
///
/// When the oracle fails no matching is attempted.
pub fn recognize(
    oracle: &mut dyn EmbeddingOracle,
    face: &RgbImage,
    session: &Session,
) -> Result<Classification, PipelineError> {
    let embedding = embed_face(oracle, face)?;
    Ok(session.identify(&embedding)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Label;
    use crate::encoder::{INPUT_SIZE, TENSOR_LEN};
    use crate::types::EMBEDDING_DIM;
    use image::Rgb;

    /// Embeds a crop as its mean tensor value repeated across every dimension.
    struct MeanOracle;

    impl EmbeddingOracle for MeanOracle {
        fn embed(&mut self, tensor: &[f32]) -> Result<Embedding, RecognizerError> {
            assert_eq!(tensor.len(), TENSOR_LEN);
            let mean = tensor.iter().sum::<f32>() / tensor.len() as f32;
            Ok(Embedding::new(vec![mean; EMBEDDING_DIM]))
        }
    }

    struct BrokenOracle;

    impl EmbeddingOracle for BrokenOracle {
        fn embed(&mut self, _tensor: &[f32]) -> Result<Embedding, RecognizerError> {
            Err(RecognizerError::ModelNotFound("mobile_face_net.onnx".into()))
        }
    }

    fn face(level: u8) -> RgbImage {
        RgbImage::from_pixel(INPUT_SIZE as u32, INPUT_SIZE as u32, Rgb([level; 3]))
    }

    #[test]
    fn test_recognize_registered_face() {
        let mut session = Session::default();
        let grey = embed_face(&mut MeanOracle, &face(128)).unwrap();
        session.register("grey", grey).unwrap();

        let c = recognize(&mut MeanOracle, &face(128), &session).unwrap();
        assert_eq!(c.label, Label::Known("grey".into()));
        assert_eq!(c.neighbors[0].distance, 0.0);
    }

    #[test]
    fn test_recognize_unknown_face() {
        let mut session = Session::default();
        session.register("black", embed_face(&mut MeanOracle, &face(0)).unwrap()).unwrap();

        // Mean 0.0 vs -1.0 in every dimension: distance sqrt(192).
        let c = recognize(&mut MeanOracle, &face(128), &session).unwrap();
        assert_eq!(c.label, Label::Unknown);
        assert!((c.neighbors[0].distance - (EMBEDDING_DIM as f32).sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_oracle_failure_skips_matching() {
        let session = Session::default();
        let err = recognize(&mut BrokenOracle, &face(10), &session).unwrap_err();
        assert!(matches!(err, PipelineError::Recognizer(RecognizerError::ModelNotFound(_))));
    }

    #[test]
    fn test_wrong_crop_size_is_encode_error() {
        let small = RgbImage::new(64, 64);
        let err = embed_face(&mut MeanOracle, &small).unwrap_err();
        assert!(matches!(err, PipelineError::Encode(_)));
    }
}
