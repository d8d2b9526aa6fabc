use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One detected face: the image it came from and its embedding.
///
/// The image path is an opaque identifier to the grouping engine; only the
/// identity diagnostic and the materializer look inside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub image: PathBuf,
    pub embedding: Vec<f64>,
}

impl Descriptor {
    pub fn new(image: impl Into<PathBuf>, embedding: Vec<f64>) -> Self {
        Self {
            image: image.into(),
            embedding,
        }
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}
