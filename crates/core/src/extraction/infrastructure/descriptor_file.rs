use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::extraction::domain::descriptor_extractor::{DescriptorExtractor, ExtractionError};
use crate::shared::descriptor::Descriptor;

#[derive(Error, Debug)]
pub enum DescriptorFileError {
    #[error("failed to read descriptors from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid descriptor file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write descriptors to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode descriptors: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Reads `[{"image": ..., "embedding": [...]}, ...]`.
pub fn read_descriptors(path: &Path) -> Result<Vec<Descriptor>, DescriptorFileError> {
    let json = fs::read_to_string(path).map_err(|e| DescriptorFileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| DescriptorFileError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn write_descriptors(path: &Path, descriptors: &[Descriptor]) -> Result<(), DescriptorFileError> {
    let json = serde_json::to_string_pretty(descriptors).map_err(DescriptorFileError::Encode)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| DescriptorFileError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
    }
    fs::write(path, json).map_err(|e| DescriptorFileError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serves precomputed embeddings in place of running the face models.
///
/// Images are looked up by exact path first, then by file name, so a file
/// produced in another directory still lines up with the photos being sorted.
/// Images with no entry have no faces.
pub struct JsonDescriptorSource {
    by_path: HashMap<PathBuf, Vec<Vec<f64>>>,
    by_file_name: HashMap<String, Vec<Vec<f64>>>,
}

impl JsonDescriptorSource {
    pub fn new(descriptors: Vec<Descriptor>) -> Self {
        let mut by_path: HashMap<PathBuf, Vec<Vec<f64>>> = HashMap::new();
        let mut by_file_name: HashMap<String, Vec<Vec<f64>>> = HashMap::new();
        for d in descriptors {
            if let Some(name) = file_name(&d.image) {
                by_file_name
                    .entry(name)
                    .or_default()
                    .push(d.embedding.clone());
            }
            by_path.entry(d.image).or_default().push(d.embedding);
        }
        Self {
            by_path,
            by_file_name,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, DescriptorFileError> {
        let descriptors = read_descriptors(path)?;
        log::info!(
            "Loaded {} descriptors from {}",
            descriptors.len(),
            path.display()
        );
        Ok(Self::new(descriptors))
    }
}

impl DescriptorExtractor for JsonDescriptorSource {
    fn extract(&mut self, image: &Path) -> Result<Vec<Vec<f64>>, ExtractionError> {
        let found = self.by_path.get(image).or_else(|| {
            file_name(image).and_then(|name| self.by_file_name.get(&name))
        });
        match found {
            Some(embeddings) => Ok(embeddings.clone()),
            None => {
                log::debug!("No precomputed descriptors for {}", image.display());
                Ok(Vec::new())
            }
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
