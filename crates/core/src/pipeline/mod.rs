pub mod pipeline_logger;
pub mod resize_images_use_case;
pub mod sort_config;
pub mod sort_photos_use_case;
