pub mod client;
pub mod download;
pub mod listing;
pub mod models;
pub mod presign;

// Re-export types for convenient access from other modules
pub use download::S3Body;
pub use models::{S3Config, S3ObjectStore};
