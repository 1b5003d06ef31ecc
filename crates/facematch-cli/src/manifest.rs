//! Gallery manifest: the faces to register before identifying a probe.
//!
//! ```toml
//! [[face]]
//! name = "alice"
//! image = "alice.jpg"
//! bbox = [10, 20, 100, 100]
//! ```

use anyhow::{Context, Result};
use facematch_core::BoundingBox;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryManifest {
    #[serde(rename = "face", default)]
    pub faces: Vec<ManifestFace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestFace {
    pub name: String,
    pub image: PathBuf,
    /// `[x, y, width, height]`; the whole image when absent.
    pub bbox: Option<[f32; 4]>,
}

impl ManifestFace {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bbox.map(|[x, y, width, height]| BoundingBox {
            x,
            y,
            width,
            height,
            confidence: 1.0,
        })
    }
}

impl GalleryManifest {
    pub fn parse(raw: &str, base_dir: &Path) -> Result<Self> {
        let mut manifest: GalleryManifest = toml::from_str(raw)?;
        for face in &mut manifest.faces {
            if face.image.is_relative() {
                face.image = base_dir.join(&face.image);
            }
        }
        Ok(manifest)
    }

    /// Read a manifest, resolving image paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading gallery manifest {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&raw, base_dir).with_context(|| format!("parsing gallery manifest {}", path.display()))
    }
}
