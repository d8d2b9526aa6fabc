pub mod group_materializer;
