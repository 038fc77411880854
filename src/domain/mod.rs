use serde::{Deserialize, Serialize};
use std::fmt;

/// One call to the store's paginated listing.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ListRequest {
    pub prefix: String,
    pub delimiter: Option<String>,
    pub continuation: Option<String>,
}

impl ListRequest {
    /// Full-space enumeration below `prefix`: no delimiter grouping.
    pub fn recursive(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            delimiter: None,
            continuation: None,
        }
    }

    /// Copy of this request positioned at the given cursor.
    pub fn with_continuation(&self, token: Option<String>) -> Self {
        Self {
            continuation: token,
            ..self.clone()
        }
    }
}

/// A batch of keys as returned by the store.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub common_prefixes: Vec<String>,
    pub next_continuation: Option<String>,
    pub is_truncated: bool,
}

/// Result of a prefix-scoped listing, shaped for a folder-navigation UI.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct ObjectListing {
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

/// Keys and folder prefixes to bundle into one archive.
///
/// Either field may be omitted from JSON input, but an explicit `null` is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ArchiveRequest {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub folders: Vec<String>,
}

impl ArchiveRequest {
    pub fn new(keys: Vec<String>, folders: Vec<String>) -> Self {
        Self { keys, folders }
    }

    /// Append another request's keys and folders after this one's.
    pub fn merge(&mut self, other: ArchiveRequest) {
        self.keys.extend(other.keys);
        self.folders.extend(other.folders);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.folders.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Expanding a requested folder prefix failed; `SkippedKey::key` holds the prefix.
    FolderExpansion,
    /// The object body could not be fetched or read.
    Fetch,
    /// The container rejected the entry (e.g. an invalid name).
    EntryCreate,
    /// Writing into the container's destination failed.
    EntryWrite,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::FolderExpansion => "folder expansion failed",
            SkipReason::Fetch => "fetch failed",
            SkipReason::EntryCreate => "entry creation failed",
            SkipReason::EntryWrite => "entry write failed",
        };
        f.write_str(label)
    }
}

/// A key (or folder prefix) left out of an archive, with the cause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedKey {
    pub key: String,
    pub reason: SkipReason,
    pub detail: String,
}

impl SkippedKey {
    pub fn new(key: &str, reason: SkipReason, detail: impl fmt::Display) -> Self {
        Self {
            key: key.to_string(),
            reason,
            detail: detail.to_string(),
        }
    }
}

/// Outcome of a finished archive build.
#[derive(Debug)]
pub struct ArchiveSummary<W> {
    /// The writer handed back by the container once its central directory is written.
    pub writer: W,
    /// Entry names in the order they were written.
    pub written: Vec<String>,
    pub skipped: usize,
    pub cancelled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: String,
}
