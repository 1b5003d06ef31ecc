//! Face region extraction.
//!
//! Takes the first box reported by a detector, clamps it to the image,
//! crops, and rescales to the model's square input.

use crate::encoder::INPUT_SIZE;
use crate::types::BoundingBox;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CropError {
    #[error("no face detected")]
    NoFace,
    #[error("face box {0:?} does not overlap the {1}x{2} image")]
    EmptyRegion(BoundingBox, u32, u32),
    #[error("detector failed: {0}")]
    Detector(String),
}

/// Source of face boxes for an image.
pub trait FaceDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<BoundingBox>, CropError>;
}

/// Detector stand-in that reports a caller-supplied region, or the whole
/// image when none is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRegion {
    region: Option<BoundingBox>,
}

impl FixedRegion {
    pub fn new(region: Option<BoundingBox>) -> Self {
        Self { region }
    }
}

impl FaceDetector for FixedRegion {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<BoundingBox>, CropError> {
        Ok(vec![self
            .region
            .unwrap_or_else(|| BoundingBox::full(image.width(), image.height()))])
    }
}

/// Crop `bbox` out of `image` and scale it to `INPUT_SIZE` square RGB.
pub fn crop_face(image: &DynamicImage, bbox: &BoundingBox) -> Result<RgbImage, CropError> {
    let (img_w, img_h) = (image.width(), image.height());

    let x0 = bbox.x.max(0.0).floor() as u32;
    let y0 = bbox.y.max(0.0).floor() as u32;
    let x1 = ((bbox.x + bbox.width).min(img_w as f32)).max(0.0) as u32;
    let y1 = ((bbox.y + bbox.height).min(img_h as f32)).max(0.0) as u32;

    if x1 <= x0 || y1 <= y0 {
        return Err(CropError::EmptyRegion(*bbox, img_w, img_h));
    }

    let face = image.crop_imm(x0, y0, x1 - x0, y1 - y0);
    let size = INPUT_SIZE as u32;
    Ok(face.resize_exact(size, size, FilterType::Triangle).to_rgb8())
}

/// Detect, keep the first face, and return its normalized crop.
pub fn detect_and_crop(
    detector: &mut dyn FaceDetector,
    image: &DynamicImage,
) -> Result<RgbImage, CropError> {
    let faces = detector.detect(image)?;
    let face = faces.first().ok_or(CropError::NoFace)?;
    tracing::debug!(
        x = face.x,
        y = face.y,
        width = face.width,
        height = face.height,
        confidence = face.confidence,
        detected = faces.len(),
        "face selected"
    );
    crop_face(image, face)
}
