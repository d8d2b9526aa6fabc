use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::shared::constants::{DEFAULT_RESIZE_HEIGHT, DEFAULT_RESIZE_PREFIX, DEFAULT_RESIZE_WIDTH};
use crate::shared::image_files::list_images;

/// Writes a `<prefix><name>` copy of every image in a directory, scaled to
/// exactly `width`×`height`.
pub struct ResizeImagesUseCase {
    width: u32,
    height: u32,
    prefix: String,
}

impl Default for ResizeImagesUseCase {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_WIDTH, DEFAULT_RESIZE_HEIGHT, DEFAULT_RESIZE_PREFIX)
    }
}

impl ResizeImagesUseCase {
    pub fn new(width: u32, height: u32, prefix: impl Into<String>) -> Self {
        Self {
            width,
            height,
            prefix: prefix.into(),
        }
    }

    /// Returns the paths written. Files that fail to decode or encode are
    /// logged and skipped; files already carrying the prefix are left alone.
    pub fn execute(&self, dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Invalid resize target {}x{}", self.width, self.height).into());
        }
        if self.prefix.is_empty() {
            return Err("Resize prefix must not be empty".into());
        }

        let mut written = Vec::new();
        for path in list_images(dir)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(&self.prefix) {
                continue;
            }
            let output = dir.join(format!("{}{name}", self.prefix));
            match self.resize_one(&path, &output) {
                Ok(()) => {
                    log::debug!("Resized {} -> {}", path.display(), output.display());
                    written.push(output);
                }
                Err(e) => log::warn!("Skipping {}: {e}", path.display()),
            }
        }

        log::info!(
            "Resized {} images in {} to {}x{}",
            written.len(),
            dir.display(),
            self.width,
            self.height
        );
        Ok(written)
    }

    fn resize_one(&self, input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let img = image::open(input)?.to_rgb8();
        let resized = image::imageops::resize(&img, self.width, self.height, FilterType::Triangle);
        resized.save(output)?;
        Ok(())
    }
}
