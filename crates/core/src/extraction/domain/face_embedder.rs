use image::RgbImage;

/// Domain interface for embedding a face crop into descriptor space.
pub trait FaceEmbedder: Send {
    fn embed(&mut self, face: &RgbImage) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
