//! ArcFace face embedder using ONNX Runtime.
//!
//! Produces L2-normalized 512-d embeddings, so Euclidean distance between
//! two faces lies in `[0, 2]`.
use std::path::Path;

use image::RgbImage;

use crate::extraction::domain::face_embedder::FaceEmbedder;
use crate::extraction::infrastructure::execution_provider::open_session;

const INPUT_SIZE: u32 = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: ort::session::Session,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: open_session(model_path)?,
        })
    }
}

impl FaceEmbedder for ArcFaceEmbedder {
    fn embed(&mut self, face: &RgbImage) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let tensor = preprocess(face);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(face: &RgbImage) -> ndarray::Array4<f32> {
    let size = INPUT_SIZE as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    let src_w = face.width();
    let src_h = face.height();
    if src_w == 0 || src_h == 0 {
        return tensor;
    }

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as u32).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as u32).min(src_w - 1);
            let pixel = face.get_pixel(src_x, src_y);
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_l2_normalize_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_preprocess_shape() {
        let face = RgbImage::from_pixel(50, 70, image::Rgb([128, 128, 128]));
        assert_eq!(preprocess(&face).shape(), &[1, 3, 112, 112]);
    }

    #[rstest]
    #[case::mid(127, (127.0 - 127.5) / 127.5)]
    #[case::max(255, 1.0)]
    #[case::min(0, -1.0)]
    fn test_preprocess_normalization(#[case] value: u8, #[case] expected: f32) {
        let face = RgbImage::from_pixel(10, 10, image::Rgb([value, value, value]));
        let tensor = preprocess(&face);
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 0.01);
        assert!((tensor[[0, 2, 111, 111]] - expected).abs() < 0.01);
    }

    #[test]
    fn test_preprocess_keeps_channel_order() {
        let face = RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 128]));
        let tensor = preprocess(&face);
        assert!((tensor[[0, 0, 5, 5]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 1, 5, 5]] + 1.0).abs() < 0.01);
    }
}
