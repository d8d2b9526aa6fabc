use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::extraction::domain::descriptor_extractor::{DescriptorExtractor, ExtractionError};
use crate::extraction::domain::face_detector::FaceDetector;
use crate::extraction::domain::face_embedder::FaceEmbedder;

/// Decode → detect → square crop → embed, one image at a time.
pub struct FaceDescriptorExtractor {
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
}

impl FaceDescriptorExtractor {
    pub fn new(detector: Box<dyn FaceDetector>, embedder: Box<dyn FaceEmbedder>) -> Self {
        Self { detector, embedder }
    }
}

impl DescriptorExtractor for FaceDescriptorExtractor {
    fn extract(&mut self, image_path: &Path) -> Result<Vec<Vec<f64>>, ExtractionError> {
        let image = load_rgb(image_path)?;
        let model_err = |source| ExtractionError::Model {
            path: image_path.to_path_buf(),
            source,
        };

        let faces = self.detector.detect(&image).map_err(model_err)?;
        log::debug!("{} faces in {}", faces.len(), image_path.display());

        let mut embeddings = Vec::with_capacity(faces.len());
        for face in &faces {
            let Some((x, y, w, h)) = face.square_crop(image.width(), image.height()) else {
                continue;
            };
            let crop = image::imageops::crop_imm(&image, x, y, w, h).to_image();
            let embedding = self.embedder.embed(&crop).map_err(model_err)?;
            embeddings.push(embedding.into_iter().map(f64::from).collect());
        }
        Ok(embeddings)
    }
}

fn load_rgb(path: &Path) -> Result<RgbImage, ExtractionError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| ExtractionError::UnreadableImage {
            path: PathBuf::from(path),
            source: Box::new(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::domain::face_box::FaceBox;
    use std::fs;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubDetector {
        faces: Vec<FaceBox>,
        fail: bool,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _image: &RgbImage) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("detector session failed".into());
            }
            Ok(self.faces.clone())
        }
    }

    /// Embeds a crop as `[width, height, red of top-left pixel]`.
    struct StubEmbedder {
        seen: Arc<Mutex<Vec<(u32, u32)>>>,
    }

    impl FaceEmbedder for StubEmbedder {
        fn embed(&mut self, face: &RgbImage) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
            self.seen.lock().unwrap().push((face.width(), face.height()));
            Ok(vec![
                face.width() as f32,
                face.height() as f32,
                face.get_pixel(0, 0)[0] as f32,
            ])
        }
    }

    fn face(x1: f64, y1: f64, x2: f64, y2: f64) -> FaceBox {
        FaceBox {
            x1,
            y1,
            x2,
            y2,
            confidence: 0.9,
        }
    }

    type Seen = Arc<Mutex<Vec<(u32, u32)>>>;

    fn extractor(faces: Vec<FaceBox>, fail: bool) -> (FaceDescriptorExtractor, Seen) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let extractor = FaceDescriptorExtractor::new(
            Box::new(StubDetector { faces, fail }),
            Box::new(StubEmbedder { seen: seen.clone() }),
        );
        (extractor, seen)
    }

    fn write_image(dir: &Path) -> PathBuf {
        let path = dir.join("photo.png");
        let mut img = RgbImage::from_pixel(100, 80, image::Rgb([10, 20, 30]));
        img.put_pixel(40, 20, image::Rgb([200, 0, 0]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_one_embedding_per_face_in_detection_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path());
        let (mut extractor, seen) =
            extractor(vec![face(40.0, 20.0, 60.0, 40.0), face(0.0, 0.0, 30.0, 30.0)], false);

        let embeddings = extractor.extract(&path).unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![20.0, 20.0, 200.0]);
        assert_eq!(embeddings[1], vec![30.0, 30.0, 10.0]);
        assert_eq!(*seen.lock().unwrap(), vec![(20, 20), (30, 30)]);
    }

    #[test]
    fn test_no_faces_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path());
        let (mut extractor, _) = extractor(vec![], false);
        assert!(extractor.extract(&path).unwrap().is_empty());
    }

    #[test]
    fn test_face_outside_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path());
        let (mut extractor, _) = extractor(vec![face(500.0, 500.0, 520.0, 520.0)], false);
        assert!(extractor.extract(&path).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_image_is_per_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"not a jpeg").unwrap();
        let (mut extractor, _) = extractor(vec![], false);

        let err = extractor.extract(&path).unwrap_err();
        assert!(err.is_per_image());
    }

    #[test]
    fn test_detector_failure_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path());
        let (mut extractor, _) = extractor(vec![], true);

        let err = extractor.extract(&path).unwrap_err();
        assert!(!err.is_per_image());
    }
}
