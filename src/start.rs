use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

use crate::app::{AppCore, ArchiveOptions, CancelToken};
use crate::args::{ArchiveArgs, Args, Command};
use crate::domain::{ArchiveRequest, SkippedKey};
use crate::errors::BucketBrowserError;
use crate::infra::S3ObjectStore;
use crate::infra::interrupt_adapter::CtrlcInterruptor;
use crate::utils::log_utils::Logger;
use crate::utils::skip_sink::{LoggingSkipSink, RecordingSkipSink};

/// What the `archive` command prints once the zip file is closed.
#[derive(Debug, Serialize)]
pub struct ArchiveReport {
    pub output: String,
    pub entries: usize,
    pub skipped: Vec<SkippedKey>,
    pub cancelled: bool,
}

/// Connect to the configured bucket and run the selected command.
///
/// # Errors
/// Returns an error if configuration, the store connection, or the command fails.
pub fn run_app(args: &Args) -> anyhow::Result<()> {
    let logger = Logger::new(args.verbose);
    let config = args
        .s3_config()
        .map_err(BucketBrowserError::Config)
        .context("Failed to load storage configuration")?;
    logger.info(&format!(
        "Using bucket '{}' at {}",
        config.bucket, config.endpoint
    ));

    let cancel = CancelToken::new();
    let store = S3ObjectStore::new(config, args.verbose)
        .context("Failed to create storage client")?
        .with_cancel(cancel.clone());
    let core = AppCore::new(Arc::new(store));

    if let Err(e) = CtrlcInterruptor::install(&cancel) {
        logger.warn(&format!("Ctrl+C will not cancel cleanly: {e}"));
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_command(&core, &args.command, &logger, &cancel, &mut out)
}

/// Run one command against `core`, writing its JSON result to `out`.
///
/// An archive written to `-` goes to `out` instead, and its JSON report to stderr.
///
/// # Errors
/// Returns an error if the command fails as a whole. Archive builds only fail
/// when the output file cannot be created or closed.
pub fn run_command<O: Write>(
    core: &AppCore,
    command: &Command,
    logger: &Logger,
    cancel: &CancelToken,
    out: &mut O,
) -> anyhow::Result<()> {
    match command {
        Command::List { prefix, delimiter } => {
            logger.info(&format!("Listing prefix '{prefix}' (delimiter '{delimiter}')"));
            let listing = core
                .list_objects(prefix, delimiter, cancel)
                .context("Failed to list objects")?;
            write_json(out, &listing)
        }
        Command::Folders => {
            let folders = core.derive_folders(cancel).context("Failed to list all folders")?;
            logger.info(&format!("Derived {} folders", folders.len()));
            write_json(out, &serde_json::json!({ "folders": folders }))
        }
        Command::Presign {
            object_key,
            expires,
        } => {
            let presigned = core
                .presign_url(object_key, Duration::from_secs(*expires))
                .context("Failed to generate presigned URL")?;
            write_json(out, &presigned)
        }
        Command::Archive(archive) => {
            let request = load_archive_request(archive).context("Invalid archive request")?;
            if archive.writes_to_stdout() {
                let report = run_archive(core, archive, &request, logger, cancel, &mut *out)?;
                return write_json(&mut std::io::stderr(), &report);
            }
            let file = File::create(&archive.output)
                .with_context(|| format!("Failed to create '{}'", archive.output.display()))?;
            let report =
                run_archive(core, archive, &request, logger, cancel, BufWriter::new(file))?;
            write_json(out, &report)
        }
    }
}

fn run_archive<W: Write>(
    core: &AppCore,
    archive: &ArchiveArgs,
    request: &ArchiveRequest,
    logger: &Logger,
    cancel: &CancelToken,
    writer: W,
) -> anyhow::Result<ArchiveReport> {
    if request.is_empty() {
        logger.info("Archive request has no keys or folders; writing an empty archive");
    }

    let options = ArchiveOptions {
        skipped_manifest: archive.skipped_manifest,
        spool_memory_limit: archive.spool_memory_limit,
    };
    let recorder = RecordingSkipSink::forwarding_to(Arc::new(LoggingSkipSink::new(logger)));

    let summary = core
        .build_archive(request, writer, &options, &recorder, cancel)
        .context("Failed to write archive")?;
    let mut writer = summary.writer;
    writer
        .flush()
        .with_context(|| format!("Failed to flush '{}'", archive.output.display()))?;

    if summary.cancelled {
        logger.warn("Archive was cancelled; the file holds the entries written so far");
    }
    logger.info(&format!(
        "Wrote {} entries to {} ({} skipped)",
        summary.written.len(),
        archive.output.display(),
        summary.skipped
    ));

    Ok(ArchiveReport {
        output: archive.output.display().to_string(),
        entries: summary.written.len(),
        skipped: recorder.entries(),
        cancelled: summary.cancelled,
    })
}

/// Command-line keys and folders, followed by those from `--request-json` if given.
///
/// # Errors
/// Returns an error if the JSON file cannot be read, is malformed, or holds `null` for a field.
pub fn load_archive_request(archive: &ArchiveArgs) -> Result<ArchiveRequest, BucketBrowserError> {
    let mut request = ArchiveRequest::new(archive.keys.clone(), archive.folders.clone());
    if let Some(path) = &archive.request_json {
        let file = File::open(path)?;
        let from_file: ArchiveRequest = serde_json::from_reader(BufReader::new(file))?;
        request.merge(from_file);
    }
    Ok(request)
}

fn write_json<O: Write, T: Serialize>(out: &mut O, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Failed to encode output")?;
    writeln!(out).context("Failed to write output")?;
    Ok(())
}
