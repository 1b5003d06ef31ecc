use facematch_core::matcher::DEFAULT_TOP_K;
use facematch_core::recognizer::DEFAULT_MODEL_FILE;
use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
///
/// Model constants (input size, normalization, embedding length, distance
/// threshold) belong to the model asset and are not configurable here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Explicit embedding model path; overrides `model_dir`.
    pub model_path: Option<PathBuf>,
    /// Neighbours listed in the match report.
    pub top_k: usize,
    /// ONNX Runtime intra-op thread count.
    pub intra_threads: usize,
}

impl Config {
    /// Load configuration from `FACEMATCH_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let model_dir = get("FACEMATCH_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(facematch_core::default_model_dir);

        Self {
            model_dir,
            model_path: get("FACEMATCH_MODEL_PATH").map(PathBuf::from),
            top_k: parse_or(get("FACEMATCH_TOP_K"), DEFAULT_TOP_K),
            intra_threads: parse_or(get("FACEMATCH_INTRA_THREADS"), 2),
        }
    }

    /// Path to the MobileFaceNet embedding model.
    pub fn embedding_model_path(&self) -> String {
        self.model_path
            .clone()
            .unwrap_or_else(|| self.model_dir.join(DEFAULT_MODEL_FILE))
            .to_string_lossy()
            .into_owned()
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
