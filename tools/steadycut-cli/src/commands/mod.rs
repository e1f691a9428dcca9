pub mod info;
pub mod jobs;
pub mod plan;
pub mod validate;
