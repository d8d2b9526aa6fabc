use std::path::{Path, PathBuf};

/// Writes out the images of one selected group.
///
/// `dir_name` is the per-person folder name (e.g. `person_3`). Returns the
/// location the group was written to.
pub trait GroupMaterializer: Send {
    fn materialize(
        &self,
        dir_name: &str,
        images: &[&Path],
    ) -> Result<PathBuf, Box<dyn std::error::Error>>;
}
