use image::RgbImage;

use crate::extraction::domain::face_box::FaceBox;

/// Domain interface for locating faces in a decoded image.
///
/// Boxes come back sorted by confidence, highest first.
pub trait FaceDetector: Send {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
