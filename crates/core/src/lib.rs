pub mod extraction;
pub mod grouping;
pub mod organize;
pub mod pipeline;
pub mod shared;
