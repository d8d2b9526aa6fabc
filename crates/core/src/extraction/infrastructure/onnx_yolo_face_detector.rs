//! YOLO face detector using ONNX Runtime via `ort`.
//!
//! Boxes come straight out of confidence filtering and NMS. Still photos
//! need no tracking.
use std::path::Path;

use image::RgbImage;

use crate::extraction::domain::face_box::FaceBox;
use crate::extraction::domain::face_detector::FaceDetector;
use crate::extraction::infrastructure::execution_provider::open_session;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Letterbox padding value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxYoloFaceDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloFaceDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloFaceDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let lb = letterbox(image, self.input_size);

        let input_value = ort::value::Tensor::from_array(lb.tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut boxes =
            parse_detections(data, &shape, self.confidence, lb.scale, lb.pad_x, lb.pad_y)?;
        Ok(nms(&mut boxes, NMS_IOU_THRESH))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

struct Letterbox {
    tensor: ndarray::Array4<f32>,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

/// Letterbox-resize an image to `target_size` × `target_size`, NCHW float32.
fn letterbox(image: &RgbImage, target_size: u32) -> Letterbox {
    let fw = image.width() as f64;
    let fh = image.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_VALUE,
    );

    let src_w = image.width();
    let src_h = image.height();

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h {
        let src_y = ((y as f64 / scale) as u32).min(src_h - 1);
        for x in 0..new_w {
            let src_x = ((x as f64 / scale) as u32).min(src_w - 1);
            let pixel = image.get_pixel(src_x, src_y);
            let ty = (pad_y + y) as usize;
            let tx = (pad_x + x) as usize;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = pixel[c] as f32 / 255.0;
            }
        }
    }

    Letterbox {
        tensor,
        scale,
        pad_x,
        pad_y,
    }
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Decode raw YOLO output into boxes in source image coordinates.
///
/// Accepts `[1, features, detections]` (transposed) and
/// `[1, detections, features]` layouts. Rows are `[cx, cy, w, h, conf, ...]`.
fn parse_detections(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Ok(Vec::new());
    }
    if data.len() < num_dets * num_feats {
        return Err(format!(
            "YOLO output has {} values, expected {}",
            data.len(),
            num_dets * num_feats
        )
        .into());
    }

    let feature = |det: usize, f: usize| -> f64 {
        if transposed {
            data[f * num_dets + det] as f64
        } else {
            data[det * num_feats + f] as f64
        }
    };

    let mut boxes = Vec::new();
    for i in 0..num_dets {
        let conf = feature(i, 4);
        if conf < confidence {
            continue;
        }
        let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
        boxes.push(FaceBox {
            x1: ((cx - w / 2.0) - pad_x as f64) / scale,
            y1: ((cy - h / 2.0) - pad_y as f64) / scale,
            x2: ((cx + w / 2.0) - pad_x as f64) / scale,
            y2: ((cy + h / 2.0) - pad_y as f64) / scale,
            confidence: conf,
        });
    }
    Ok(boxes)
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(boxes: &mut [FaceBox], iou_thresh: f64) -> Vec<FaceBox> {
    boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceBox> = Vec::new();
    for candidate in boxes.iter() {
        if keep.iter().all(|k| k.iou(candidate) <= iou_thresh) {
            keep.push(*candidate);
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> FaceBox {
        FaceBox {
            x1,
            y1,
            x2,
            y2,
            confidence,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, new 640x320, pad_y 160
        let image = RgbImage::from_pixel(200, 100, image::Rgb([128, 128, 128]));
        let lb = letterbox(&image, 640);

        assert_eq!(lb.tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let image = RgbImage::from_pixel(100, 50, image::Rgb([255, 0, 255]));
        let lb = letterbox(&image, 640);

        let y = lb.pad_y as usize + 1;
        let x = lb.pad_x as usize + 1;
        assert!((lb.tensor[[0, 0, y, x]] - 1.0).abs() < 0.01);
        assert!(lb.tensor[[0, 1, y, x]].abs() < 0.01);
        assert!((lb.tensor[[0, 0, 0, 0]] - PAD_VALUE).abs() < 0.01);
    }

    /// Row-major output with six candidate rows, two of them real.
    fn row_major_output() -> Vec<f32> {
        let mut data = vec![0.0f32; 6 * 5];
        data[..5].copy_from_slice(&[100.0, 100.0, 40.0, 60.0, 0.9]);
        data[5..10].copy_from_slice(&[300.0, 300.0, 40.0, 40.0, 0.7]);
        data
    }

    #[test]
    fn test_parse_detections_row_major() {
        let boxes = parse_detections(&row_major_output(), &[1, 6, 5], 0.8, 2.0, 0, 20).unwrap();

        assert_eq!(boxes.len(), 1);
        assert_relative_eq!(boxes[0].x1, 40.0);
        assert_relative_eq!(boxes[0].y1, 25.0);
        assert_relative_eq!(boxes[0].x2, 60.0);
        assert_relative_eq!(boxes[0].y2, 55.0);
        assert_relative_eq!(boxes[0].confidence, 0.9f32 as f64);
    }

    #[test]
    fn test_parse_detections_transposed_matches_row_major() {
        let row_major = row_major_output();
        let mut transposed = vec![0.0f32; 5 * 6];
        for det in 0..6 {
            for f in 0..5 {
                transposed[f * 6 + det] = row_major[det * 5 + f];
            }
        }

        let a = parse_detections(&row_major, &[1, 6, 5], 0.5, 1.0, 0, 0).unwrap();
        let b = parse_detections(&transposed, &[1, 5, 6], 0.5, 1.0, 0, 0).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_detections_rejects_bad_shape() {
        assert!(parse_detections(&[0.0; 10], &[10], 0.5, 1.0, 0, 0).is_err());
        assert!(parse_detections(&[0.0; 4], &[1, 6, 5], 0.5, 1.0, 0, 0).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut boxes = vec![
            face(0.0, 0.0, 100.0, 100.0, 0.8),
            face(5.0, 5.0, 105.0, 105.0, 0.9),
        ];
        let kept = nms(&mut boxes, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping_in_confidence_order() {
        let mut boxes = vec![
            face(0.0, 0.0, 50.0, 50.0, 0.6),
            face(200.0, 200.0, 250.0, 250.0, 0.95),
        ];
        let kept = nms(&mut boxes, 0.3);
        assert_eq!(kept.len(), 2);
        assert_relative_eq!(kept[0].confidence, 0.95);
    }

    #[test]
    fn test_nms_empty_input() {
        let mut boxes: Vec<FaceBox> = Vec::new();
        assert!(nms(&mut boxes, 0.3).is_empty());
    }
}
