pub mod embedding_distance;
pub mod group;
pub mod group_size_policy;
pub mod grouping_config;
pub mod grouping_error;
pub mod identity_frequency;
pub mod online_grouper;
pub mod tier_matcher;
