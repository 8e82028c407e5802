//! xtract CLI binary
//!
//! All logic is in the library; main.rs only invokes cli::run().

fn main() {
    // cli::run() prints every error itself and returns the exit code
    if let Err(code) = xtract::cli::run() {
        std::process::exit(code.as_i32());
    }
}
