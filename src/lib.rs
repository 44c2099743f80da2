pub mod height_pipeline;
pub mod logger;
