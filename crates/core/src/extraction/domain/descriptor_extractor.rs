use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The image could not be read or decoded. The image is skipped.
    #[error("failed to read image {path}: {source}")]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    /// The detection or embedding model itself failed. The run stops.
    #[error("face model failed on {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

impl ExtractionError {
    /// Whether the failure is local to one image.
    pub fn is_per_image(&self) -> bool {
        matches!(self, ExtractionError::UnreadableImage { .. })
    }
}

/// Domain interface for turning an image into face embeddings.
///
/// Returns one embedding per detected face, best detection first. An image
/// with no faces yields an empty list. Implementations may hold model
/// sessions, hence `&mut self`.
pub trait DescriptorExtractor: Send {
    fn extract(&mut self, image: &Path) -> Result<Vec<Vec<f64>>, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_image_is_per_image() {
        let err = ExtractionError::UnreadableImage {
            path: PathBuf::from("a.jpg"),
            source: "truncated".into(),
        };
        assert!(err.is_per_image());
        assert!(err.to_string().contains("a.jpg"));
    }

    #[test]
    fn test_model_failure_is_fatal() {
        let err = ExtractionError::Model {
            path: PathBuf::from("a.jpg"),
            source: "session closed".into(),
        };
        assert!(!err.is_per_image());
    }
}
