pub mod arcface_embedder;
pub mod descriptor_file;
pub mod execution_provider;
pub mod face_descriptor_extractor;
pub mod onnx_yolo_face_detector;
