pub mod app;
pub mod args;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod ports;
pub mod start;
pub mod testing;
pub mod utils {
    pub mod log_utils;
    pub mod skip_sink;
}

pub use args::Args;
pub use start::run_app;
