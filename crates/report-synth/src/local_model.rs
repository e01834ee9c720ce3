//! In-process model loading.
//!
//! An in-process model is any [`ChatBackend`] produced by a [`ModelLoader`]
//! from a model file. The synthesizer calls the loader once at
//! construction; a load failure puts it into local-render mode for good.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use report_core::{BackendError, ChatBackend};
use tracing::debug;

use crate::gguf::GgufBackend;

/// Tokenizer file looked up next to the model when none is given.
pub const DEFAULT_TOKENIZER_FILE: &str = "tokenizer.json";

/// Loads a model from disk and exposes it as a chat backend.
pub trait ModelLoader: Send + Sync {
    /// Load the model at `path`.
    fn load(&self, path: &Path) -> Result<Arc<dyn ChatBackend>, BackendError>;
}

/// Loads quantized GGUF models with their Hugging Face tokenizer.
#[derive(Debug, Clone, Default)]
pub struct GgufLoader {
    tokenizer_path: Option<PathBuf>,
}

impl GgufLoader {
    /// Use an explicit tokenizer instead of the one beside the model.
    pub fn with_tokenizer(path: impl Into<PathBuf>) -> Self {
        Self {
            tokenizer_path: Some(path.into()),
        }
    }

    fn tokenizer_for(&self, model_path: &Path) -> PathBuf {
        self.tokenizer_path.clone().unwrap_or_else(|| {
            model_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_TOKENIZER_FILE)
        })
    }
}

impl ModelLoader for GgufLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn ChatBackend>, BackendError> {
        let meta = std::fs::metadata(path).map_err(|e| {
            BackendError::Unavailable(format!("cannot read model {}: {}", path.display(), e))
        })?;
        debug!("Model file {} ({} bytes) found", path.display(), meta.len());

        let tokenizer = self.tokenizer_for(path);
        if !tokenizer.is_file() {
            return Err(BackendError::Unavailable(format!(
                "tokenizer not found at {}",
                tokenizer.display()
            )));
        }

        let backend = GgufBackend::load(path, &tokenizer)?;
        Ok(Arc::new(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file() {
        let err = GgufLoader::default()
            .load(Path::new("/nonexistent/model.gguf"))
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::Unavailable(msg) if msg.contains("cannot read")));
    }

    #[test]
    fn test_missing_tokenizer() {
        let dir = scratch_dir("report-synth-loader-no-tokenizer");
        let model = dir.join("model.gguf");
        std::fs::write(&model, b"GGUF").unwrap();

        let err = GgufLoader::default().load(&model).err().unwrap();
        assert!(matches!(
            err,
            BackendError::Unavailable(msg) if msg.contains("tokenizer not found")
                && msg.contains("tokenizer.json")
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_model_reaches_gguf_reader() {
        let dir = scratch_dir("report-synth-loader-corrupt");
        let model = dir.join("model.gguf");
        std::fs::write(&model, b"definitely not gguf").unwrap();
        std::fs::write(dir.join(DEFAULT_TOKENIZER_FILE), b"{}").unwrap();

        let err = GgufLoader::default().load(&model).err().unwrap();
        assert!(matches!(err, BackendError::Unavailable(msg) if msg.contains("invalid GGUF")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_explicit_tokenizer_path() {
        let loader = GgufLoader::with_tokenizer("/models/llama/tokenizer.json");
        assert_eq!(
            loader.tokenizer_for(Path::new("/elsewhere/model.gguf")),
            PathBuf::from("/models/llama/tokenizer.json")
        );
        assert_eq!(
            GgufLoader::default().tokenizer_for(Path::new("/models/q4.gguf")),
            PathBuf::from("/models/tokenizer.json")
        );
    }
}
