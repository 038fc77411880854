//! Bundle selected keys and folders of the bucket into one ZIP archive.
//!
//! Per-object problems never fail the build: each one is reported to the
//! caller's [`SkipSink`] and the key is left out. The container is always
//! finalized, even when it ends up empty.

use crate::app::CancelToken;
use crate::app::listing::list_all_keys;
use crate::app::stream_output::StreamOutput;
use crate::domain::{ArchiveRequest, ArchiveSummary, SkipReason, SkippedKey};
use crate::errors::{ArchiveError, StoreError};
use crate::ports::{ObjectBody, ObjectStorePort};
use crate::utils::skip_sink::SkipSink;
use std::collections::HashSet;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tempfile::SpooledTempFile;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

/// Entry name used for the optional list of skipped keys.
pub const SKIPPED_MANIFEST_ENTRY: &str = "_skipped_keys.txt";

pub const DEFAULT_SPOOL_MEMORY_LIMIT: usize = 8 * 1024 * 1024;

const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Append a text entry listing every skipped key and why.
    pub skipped_manifest: bool,
    /// Bytes held in memory before spilling to a temp file, both for an object
    /// body and for the compressed entry waiting to be sent.
    pub spool_memory_limit: usize,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            skipped_manifest: false,
            spool_memory_limit: DEFAULT_SPOOL_MEMORY_LIMIT,
        }
    }
}

/// Insertion-ordered set of keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedKeys {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ResolvedKeys {
    /// Returns false if the key was already present.
    pub fn insert(&mut self, key: String) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key.clone());
        self.order.push(key);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Explicit keys first, then each folder's keys in store order, without duplicates.
///
/// A folder whose listing fails is reported through `on_skip` and left out.
/// Expansion stops early once `cancel` is tripped.
pub fn resolve_keys<F>(
    store: &dyn ObjectStorePort,
    request: &ArchiveRequest,
    cancel: &CancelToken,
    mut on_skip: F,
) -> ResolvedKeys
where
    F: FnMut(SkippedKey),
{
    let mut resolved = ResolvedKeys::default();
    for key in &request.keys {
        resolved.insert(key.clone());
    }

    for folder in &request.folders {
        match list_all_keys(store, folder, cancel) {
            Ok(keys) => {
                for key in keys {
                    resolved.insert(key);
                }
            }
            Err(StoreError::Cancelled) => break,
            Err(e) => on_skip(SkippedKey::new(folder, SkipReason::FolderExpansion, e)),
        }
    }

    resolved
}

/// Why an entry did not make it into the container.
enum EntryFailure {
    Skipped(SkippedKey),
    Cancelled,
}

impl From<SkippedKey> for EntryFailure {
    fn from(skipped: SkippedKey) -> Self {
        EntryFailure::Skipped(skipped)
    }
}

/// Object body that stops yielding bytes once the build is cancelled.
struct CancellableBody<'a> {
    inner: ObjectBody,
    cancel: &'a CancelToken,
}

impl Read for CancellableBody<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancel.is_cancelled() {
            // Not `Interrupted`: io::copy would retry that kind.
            return Err(io::Error::other("archive cancelled"));
        }
        self.inner.read(buf)
    }
}

/// Stream every resolved key of `request` into `writer` as a ZIP container.
///
/// Entries are written one at a time in [`resolve_keys`] order, and each
/// finished entry is flushed to `writer` before the next key is fetched. Each
/// object body is dropped before the next key is fetched, and cancellation
/// also abandons the body being read. When writing to `writer` fails, the
/// destination is treated as gone: no further objects are fetched and the
/// container is closed with what it has.
///
/// # Errors
/// Returns an error only if the container's central directory cannot be written.
pub fn build_archive<W: Write>(
    store: &dyn ObjectStorePort,
    request: &ArchiveRequest,
    writer: W,
    options: &ArchiveOptions,
    sink: &dyn SkipSink,
    cancel: &CancelToken,
) -> Result<ArchiveSummary<W>, ArchiveError> {
    let mut skipped: Vec<SkippedKey> = Vec::new();
    let mut record = |entry: SkippedKey| {
        sink.record(&entry);
        skipped.push(entry);
    };

    let resolved = resolve_keys(store, request, cancel, &mut record);

    let mut zip = ZipWriter::new(StreamOutput::new(writer, options.spool_memory_limit));
    zip.set_flush_on_finish_file(true);
    let mut written = Vec::with_capacity(resolved.len());
    let mut cancelled = false;
    let mut output_failed = false;

    for key in resolved.iter() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        match write_entry(store, &mut zip, key, options, cancel) {
            Ok(()) => written.push(key.clone()),
            Err(EntryFailure::Cancelled) => {
                cancelled = true;
                break;
            }
            Err(EntryFailure::Skipped(entry)) => {
                output_failed = entry.reason == SkipReason::EntryWrite;
                record(entry);
                if output_failed {
                    cancelled = true;
                    break;
                }
            }
        }
    }
    if !cancelled && cancel.is_cancelled() {
        cancelled = true;
    }

    if options.skipped_manifest && !skipped.is_empty() && !output_failed {
        if resolved.contains(SKIPPED_MANIFEST_ENTRY) {
            let entry = SkippedKey::new(
                SKIPPED_MANIFEST_ENTRY,
                SkipReason::EntryCreate,
                "name already used by an archived key",
            );
            sink.record(&entry);
            skipped.push(entry);
        } else if let Err(e) = write_manifest(&mut zip, &skipped) {
            let entry = classify_zip_error(SKIPPED_MANIFEST_ENTRY, e);
            sink.record(&entry);
            skipped.push(entry);
        }
    }

    let writer = zip.finish()?.into_inner().map_err(ZipError::Io)?;
    Ok(ArchiveSummary {
        writer,
        written,
        skipped: skipped.len(),
        cancelled,
    })
}

fn entry_options(size: u64) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(size >= ZIP64_THRESHOLD)
}

/// I/O errors come from the destination; anything else is a problem with the entry itself.
fn classify_zip_error(key: &str, err: ZipError) -> SkippedKey {
    match err {
        ZipError::Io(e) => SkippedKey::new(key, SkipReason::EntryWrite, e),
        other => SkippedKey::new(key, SkipReason::EntryCreate, other),
    }
}

fn write_entry<W: Write + Seek>(
    store: &dyn ObjectStorePort,
    zip: &mut ZipWriter<W>,
    key: &str,
    options: &ArchiveOptions,
    cancel: &CancelToken,
) -> Result<(), EntryFailure> {
    let body = match store.fetch(key) {
        Ok(body) => body,
        Err(StoreError::Cancelled) => return Err(EntryFailure::Cancelled),
        Err(e) => return Err(SkippedKey::new(key, SkipReason::Fetch, e).into()),
    };
    let mut body = CancellableBody {
        inner: body,
        cancel,
    };

    // Stage the whole body first so a failed read never leaves a partial entry.
    let mut spool = SpooledTempFile::new(options.spool_memory_limit);
    let copied = io::copy(&mut body, &mut spool);
    drop(body);
    let size = match copied {
        Ok(size) => size,
        Err(_) if cancel.is_cancelled() => return Err(EntryFailure::Cancelled),
        Err(e) => {
            return Err(
                SkippedKey::new(key, SkipReason::Fetch, format!("reading body: {e}")).into(),
            );
        }
    };
    spool
        .seek(SeekFrom::Start(0))
        .map_err(|e| SkippedKey::new(key, SkipReason::Fetch, format!("spooling body: {e}")))?;

    if key.ends_with('/') {
        zip.add_directory(key, entry_options(0))
            .map_err(|e| classify_zip_error(key, e))?;
        return Ok(());
    }

    zip.start_file(key, entry_options(size))
        .map_err(|e| classify_zip_error(key, e))?;
    io::copy(&mut spool, zip).map_err(|e| SkippedKey::new(key, SkipReason::EntryWrite, e))?;
    Ok(())
}

fn write_manifest<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    skipped: &[SkippedKey],
) -> Result<(), ZipError> {
    let mut text = String::new();
    for entry in skipped {
        text.push_str(&format!(
            "{}\t{}: {}\n",
            entry.key, entry.reason, entry.detail
        ));
    }
    zip.start_file(SKIPPED_MANIFEST_ENTRY, entry_options(text.len() as u64))?;
    zip.write_all(text.as_bytes())?;
    Ok(())
}
