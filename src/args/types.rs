use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::validators::{check_endpoint, check_readable_file, resolve_value_or_file, validate};
use crate::app::archive::DEFAULT_SPOOL_MEMORY_LIMIT;
use crate::app::DEFAULT_PRESIGN_LIFETIME;
use crate::infra::S3Config;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// S3-compatible endpoint URL, e.g. https://storage.yandexcloud.net
    #[arg(long, env = "S3_ENDPOINT", value_parser = check_endpoint)]
    pub endpoint: String,

    /// Region name passed to request signing
    #[arg(long, env = "S3_REGION")]
    pub region: String,

    /// Bucket name, or a path to a file containing it
    #[arg(long, env = "S3_BUCKET_NAME")]
    pub bucket: String,

    /// Access key ID, or a path to a file containing it
    #[arg(long, env = "S3_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: String,

    /// Secret access key, or a path to a file containing it
    #[arg(long, env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: String,

    /// Print extra stuff (use -v -v or --verbose --verbose for even more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List files and sub-folders below a prefix
    List {
        /// Only keys starting with this prefix
        #[arg(long, default_value = "")]
        prefix: String,
        /// Group keys into folders on this delimiter (usually "/"); empty lists recursively
        #[arg(long, default_value = "")]
        delimiter: String,
    },
    /// Print every folder path implied by the bucket's keys
    Folders,
    /// Print a time-limited download URL for one object
    Presign {
        #[arg(long)]
        object_key: String,
        /// Lifetime of the URL in seconds
        #[arg(long, default_value_t = DEFAULT_PRESIGN_LIFETIME.as_secs())]
        expires: u64,
    },
    /// Bundle keys and folders into one zip file
    Archive(ArchiveArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
pub struct ArchiveArgs {
    /// Object key to include. Can be used multiple times.
    #[arg(short = 'k', long = "key")]
    pub keys: Vec<String>,

    /// Folder prefix whose keys are all included. Can be used multiple times.
    #[arg(short = 'f', long = "folder")]
    pub folders: Vec<String>,

    /// JSON file of the form {"keys": [...], "folders": [...]}
    #[arg(long, value_parser = check_readable_file)]
    pub request_json: Option<PathBuf>,

    /// Where to write the zip file; `-` streams it to stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Add a text entry listing keys that could not be archived
    #[arg(long)]
    pub skipped_manifest: bool,

    /// Bytes of each object held in memory before spilling to a temp file
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_SPOOL_MEMORY_LIMIT)]
    pub spool_memory_limit: usize,
}

impl ArchiveArgs {
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}

impl Args {
    /// Validate the arguments for the selected command, without modifying the Args
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid for the selected command.
    pub fn validate(&self) -> Result<(), String> {
        validate(self)
    }

    /// Build the store configuration, reading any values given as file paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced file cannot be read or is empty.
    pub fn s3_config(&self) -> Result<S3Config, String> {
        Ok(S3Config {
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            bucket: resolve_value_or_file(&self.bucket)?,
            access_key_id: resolve_value_or_file(&self.access_key_id)?,
            secret_access_key: resolve_value_or_file(&self.secret_access_key)?,
        })
    }
}
