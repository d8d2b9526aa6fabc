pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Application directory name used under the platform cache/config roots.
pub const APP_DIR_NAME: &str = "FaceSort";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Distance cutoffs tried in order, loosest last. Sized for 128-d face-api
/// descriptors, the usual content of a `--descriptors` file.
pub const DEFAULT_THRESHOLD_TIERS: &[f64] = &[0.3, 0.4, 0.6];

/// Cutoffs for L2-normalised embeddings such as ArcFace, where distance is
/// `sqrt(2 - 2 cos)`. The loosest tier accepts cosine similarity above ~0.4.
pub const UNIT_EMBEDDING_THRESHOLD_TIERS: &[f64] = &[0.9, 1.0, 1.1];

/// Groups smaller than this are not written out.
pub const DEFAULT_MIN_GROUP_SIZE: usize = 2;

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_OUTPUT_DIR_PREFIX: &str = "person_";

pub const DEFAULT_IDENTITY_SEPARATOR: char = '_';
pub const DEFAULT_IDENTITY_MIN_COUNT: usize = 1;

pub const DEFAULT_RESIZE_WIDTH: u32 = 200;
pub const DEFAULT_RESIZE_HEIGHT: u32 = 300;
pub const DEFAULT_RESIZE_PREFIX: &str = "resized_";
