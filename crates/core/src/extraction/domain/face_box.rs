/// Axis-aligned face bounding box in source image pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

impl FaceBox {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let area_a = self.width() * self.height();
        let area_b = other.width() * other.height();
        inter / (area_a + area_b - inter)
    }

    /// Square `(x, y, side_w, side_h)` centred on the box, clamped to the image.
    ///
    /// Returns `None` when the clamped crop is empty.
    pub fn square_crop(&self, image_w: u32, image_h: u32) -> Option<(u32, u32, u32, u32)> {
        let cx = (self.x1 + self.x2) / 2.0;
        let cy = (self.y1 + self.y2) / 2.0;
        let half = self.width().max(self.height()) / 2.0;

        let x1 = (cx - half).max(0.0).round() as u32;
        let y1 = (cy - half).max(0.0).round() as u32;
        let x2 = ((cx + half).round().max(0.0) as u32).min(image_w);
        let y2 = ((cy + half).round().max(0.0) as u32).min(image_h);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1, y1, x2 - x1, y2 - y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face(x1: f64, y1: f64, x2: f64, y2: f64) -> FaceBox {
        FaceBox {
            x1,
            y1,
            x2,
            y2,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_iou_no_overlap() {
        assert_eq!(face(0.0, 0.0, 10.0, 10.0).iou(&face(20.0, 20.0, 30.0, 30.0)), 0.0);
    }

    #[test]
    fn test_iou_perfect_overlap() {
        let b = face(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(b.iou(&b), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = face(0.0, 0.0, 10.0, 10.0);
        let b = face(5.0, 5.0, 15.0, 15.0);
        assert_relative_eq!(a.iou(&b), 25.0 / 175.0);
    }

    #[test]
    fn test_square_crop_uses_longer_side() {
        let crop = face(40.0, 30.0, 60.0, 70.0).square_crop(200, 200).unwrap();
        assert_eq!(crop, (30, 30, 40, 40));
    }

    #[test]
    fn test_square_crop_clamped_at_edges() {
        let crop = face(-10.0, -10.0, 20.0, 20.0).square_crop(100, 100).unwrap();
        assert_eq!(crop, (0, 0, 20, 20));

        let crop = face(90.0, 90.0, 110.0, 110.0).square_crop(100, 100).unwrap();
        assert_eq!(crop, (90, 90, 10, 10));
    }

    #[test]
    fn test_square_crop_outside_image_is_none() {
        assert!(face(150.0, 150.0, 160.0, 160.0).square_crop(100, 100).is_none());
    }
}
