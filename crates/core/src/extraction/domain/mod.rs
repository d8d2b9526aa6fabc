pub mod descriptor_extractor;
pub mod face_box;
pub mod face_detector;
pub mod face_embedder;
