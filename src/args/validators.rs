use home::home_dir;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{Args, Command};
use crate::app::MAX_PRESIGN_LIFETIME;

/// Validate the args for the selected command
///
/// # Errors
///
/// Returns an error if the arguments are invalid for the selected command.
pub fn validate(args: &Args) -> Result<(), String> {
    for (flag, value) in [
        ("--region", &args.region),
        ("--bucket", &args.bucket),
        ("--access-key-id", &args.access_key_id),
        ("--secret-access-key", &args.secret_access_key),
    ] {
        if value.trim().is_empty() {
            return Err(format!("{flag} must not be empty"));
        }
    }

    match &args.command {
        Command::Presign {
            object_key,
            expires,
        } => {
            if object_key.is_empty() {
                return Err("--object-key must not be empty".to_string());
            }
            if *expires == 0 || *expires > MAX_PRESIGN_LIFETIME.as_secs() {
                return Err(format!(
                    "--expires must be between 1 and {} seconds",
                    MAX_PRESIGN_LIFETIME.as_secs()
                ));
            }
        }
        Command::Archive(archive) => {
            if archive.spool_memory_limit == 0 {
                return Err("--spool-memory-limit must be at least 1".to_string());
            }
            if !archive.writes_to_stdout() {
                check_output_parent(&archive.output)?;
            }
        }
        Command::List { .. } | Command::Folders => {}
    }
    Ok(())
}

/// Checks that an endpoint is an http(s) URL
///
/// # Returns
///
/// * `Result<String, String>` - The endpoint without a trailing slash, or an error message
pub fn check_endpoint(endpoint: &str) -> Result<String, String> {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed.trim_end_matches('/').to_string())
    } else {
        Err(format!(
            "The endpoint '{endpoint}' must start with http:// or https://"
        ))
    }
}

fn expand_home(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.starts_with("~") {
        let home = home_dir().ok_or_else(|| "Home directory could not be determined.".to_string())?;
        Ok(home.join(path.strip_prefix("~").unwrap_or(path.as_path())))
    } else {
        Ok(path)
    }
}

/// Checks if a file is readable
///
/// # Returns
///
/// * `Result<PathBuf, String>` - The validated PathBuf or an error message
pub fn check_readable_file(file: &str) -> Result<PathBuf, String> {
    let xpath = expand_home(file)?;

    if xpath.is_file() && fs::metadata(&xpath).is_ok() {
        Ok(xpath)
    } else {
        Err(format!("The file '{file}' is not readable."))
    }
}

/// Use `raw` directly, unless it names a readable file, in which case use the file's trimmed contents
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is empty.
pub fn resolve_value_or_file(raw: &str) -> Result<String, String> {
    let path = expand_home(raw)?;
    if !path.is_file() {
        return Ok(raw.to_string());
    }

    let value = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read '{}': {e}", path.display()))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("The file '{}' is empty.", path.display()));
    }
    Ok(value.to_string())
}

/// Load `KEY=value` lines from `path` into the process environment.
/// Variables that are already set keep their value.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_env_file(path: &Path) -> Result<(), String> {
    dotenvy::from_path(path).map_err(|e| format!("Failed to load '{}': {e}", path.display()))
}

fn check_output_parent(output: &Path) -> Result<(), String> {
    if output.as_os_str().is_empty() {
        return Err("--output must not be empty".to_string());
    }
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(format!(
            "The parent directory of '{}' does not exist.",
            output.display()
        )),
        _ => Ok(()),
    }
}
