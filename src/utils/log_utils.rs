//! Logging utilities for the application
//!
//! Everything goes to stderr so that stdout carries only command output.

/// Log levels for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Info level, one verbose flag (-v)
    Info = 1,
    /// Debug level, two verbose flags (-v -v)
    Debug = 2,
}

/// Logger for application messages
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    /// Current verbosity level
    verbosity: u8,
}

impl Logger {
    /// Create a new logger with the specified verbosity
    pub fn new(verbosity: u8) -> Self {
        Self { verbosity }
    }

    /// Log at info level (verbose >= 1)
    pub fn info(&self, msg: &str) {
        log(msg, self.verbosity, LogLevel::Info);
    }

    /// Warnings are always displayed
    pub fn warn(&self, msg: &str) {
        eprintln!("warn: {msg}");
    }
}

fn enabled(verbosity: u8, level: LogLevel) -> bool {
    verbosity >= level as u8
}

/// Log a message if the verbosity level is at least the specified level
///
/// # Arguments
///
/// * `msg` - The message to log
/// * `verbosity` - The current verbosity level (1 = info, 2+ = debug)
/// * `level` - The minimum level required for this message to be logged
pub fn log(msg: &str, verbosity: u8, level: LogLevel) {
    if enabled(verbosity, level) {
        match level {
            LogLevel::Info => eprintln!("info: {msg}"),
            LogLevel::Debug => eprintln!("dbg: {msg}"),
        }
    }
}

/// Log at debug level (verbose >= 2)
pub fn debug(msg: &str, verbosity: u8) {
    log(msg, verbosity, LogLevel::Debug)
}
