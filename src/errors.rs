use thiserror::Error;

/// Failures reported by an [`ObjectStorePort`](crate::ports::ObjectStorePort) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to list objects with prefix '{prefix}': {message}")]
    List { prefix: String, message: String },

    #[error("Failed to fetch object '{key}': {message}")]
    Fetch { key: String, message: String },

    #[error("Failed to presign object '{key}': {message}")]
    Presign { key: String, message: String },

    #[error("Listing for prefix '{prefix}' reported more pages but returned no continuation token")]
    Pagination { prefix: String },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Request cancelled")]
    Cancelled,
}

/// Folder derivation is all-or-nothing: any page failure aborts the whole request.
#[derive(Debug, Error)]
pub enum FolderError {
    #[error("Failed to enumerate bucket keys: {0}")]
    Enumeration(#[from] StoreError),
}

/// The only way an archive build fails as a whole: the container could not be closed.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to finalize archive: {0}")]
    Finalize(#[from] zip::result::ZipError),
}

#[derive(Debug, Error)]
pub enum BucketBrowserError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Folder error: {0}")]
    Folders(#[from] FolderError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
