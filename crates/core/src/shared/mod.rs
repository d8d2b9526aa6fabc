pub mod constants;
pub mod descriptor;
pub mod image_files;
pub mod model_resolver;
