//! Ink compiler CLI entry point

fn main() {
    // Logging setup lives in cli::run so the --trace flag can pick the
    // default filter level.
    inkc::cli::run();
}
