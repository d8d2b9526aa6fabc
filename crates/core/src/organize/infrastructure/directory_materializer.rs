use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::organize::domain::group_materializer::GroupMaterializer;

/// Copies each group's images into `output_dir/<dir_name>/`, keeping base names.
///
/// An image listed twice in a group (two faces of the same person) is copied
/// once. Existing files with the same name are overwritten.
pub struct DirectoryMaterializer {
    output_dir: PathBuf,
}

impl DirectoryMaterializer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl GroupMaterializer for DirectoryMaterializer {
    fn materialize(
        &self,
        dir_name: &str,
        images: &[&Path],
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let person_dir = self.output_dir.join(dir_name);
        fs::create_dir_all(&person_dir)?;

        let mut copied: HashSet<&Path> = HashSet::new();
        for &image in images {
            if !copied.insert(image) {
                continue;
            }
            let file_name = image
                .file_name()
                .ok_or_else(|| format!("Image path has no file name: {}", image.display()))?;
            let dest = person_dir.join(file_name);
            fs::copy(image, &dest).map_err(|e| {
                format!(
                    "Failed to copy {} to {}: {e}",
                    image.display(),
                    dest.display()
                )
            })?;
            log::debug!("Copied {} to {}", image.display(), person_dir.display());
        }

        log::info!(
            "Wrote {} images to {}",
            copied.len(),
            person_dir.display()
        );
        Ok(person_dir)
    }
}
