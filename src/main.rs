use bucket_browser::{args, run_app};

fn main() {
    // Parse and validate command-line arguments
    let args = args::args_checks();

    if let Err(e) = run_app(&args) {
        eprintln!("Application error: {e:#}");
        std::process::exit(1);
    }
}
