// Public modules
pub mod types;
mod validators;

// Re-export everything from the submodules
pub use types::*;
pub use validators::*;

use clap::Parser;
use std::path::Path;
use std::process;

use crate::utils::log_utils::Logger;

/// Parse command line arguments and perform validation
///
/// # Returns
///
/// * `Args` - The validated arguments
///
/// Exits the process with status 1 if validation fails.
#[must_use]
pub fn args_checks() -> Args {
    // A `.env` file in the working directory supplies the S3_* variables
    let env_file = Path::new(".env");
    let env_loaded = env_file.is_file().then(|| load_env_file(env_file));

    let args = Args::parse();
    match env_loaded {
        Some(Ok(())) => Logger::new(args.verbose).info("Loaded environment from .env"),
        Some(Err(e)) => Logger::new(args.verbose).warn(&e),
        None => Logger::new(args.verbose).info("No .env file found, using environment variables"),
    }

    if let Err(e) = args.validate() {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    args
}
