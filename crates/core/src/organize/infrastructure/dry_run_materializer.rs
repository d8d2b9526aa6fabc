use std::path::{Path, PathBuf};

use crate::organize::domain::group_materializer::GroupMaterializer;

/// Reports where each group would be written without touching the filesystem.
pub struct DryRunMaterializer {
    output_dir: PathBuf,
}

impl DryRunMaterializer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl GroupMaterializer for DryRunMaterializer {
    fn materialize(
        &self,
        dir_name: &str,
        images: &[&Path],
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let person_dir = self.output_dir.join(dir_name);
        for image in images {
            log::info!("[dry run] {} -> {}", image.display(), person_dir.display());
        }
        Ok(person_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_writes_nothing() {
        let output = tempfile::tempdir().unwrap();
        let target = output.path().join("out");
        let materializer = DryRunMaterializer::new(&target);

        let dir = materializer
            .materialize("person_2", &[Path::new("/photos/a.jpg")])
            .unwrap();

        assert_eq!(dir, target.join("person_2"));
        assert!(!target.exists());
    }
}
