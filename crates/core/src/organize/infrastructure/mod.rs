pub mod directory_materializer;
pub mod dry_run_materializer;
