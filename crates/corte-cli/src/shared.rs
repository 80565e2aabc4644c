use std::fmt::Display;
use std::path::Path;

use corte::CorteConfig;
use tracing_subscriber::EnvFilter;

use crate::page_range::parse_page_range;

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print an error to stderr and map it to exit code 1.
pub fn fail(e: impl Display) -> i32 {
    eprintln!("Error: {e}");
    1
}

/// Load the configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<CorteConfig, i32> {
    match path {
        Some(path) => CorteConfig::load(path).map_err(fail),
        None => Ok(CorteConfig::default()),
    }
}

/// Read a whole input file with a user-friendly error message.
pub fn read_file(file: &Path) -> Result<Vec<u8>, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    std::fs::read(file).map_err(|e| fail(format!("{}: {e}", file.display())))
}

/// Write an output file, reporting failures on stderr.
pub fn write_file(file: &Path, bytes: &[u8]) -> Result<(), i32> {
    std::fs::write(file, bytes).map_err(|e| fail(format!("{}: {e}", file.display())))
}

/// Resolve an optional page range string into 0-indexed page indices.
///
/// If `pages` is `None`, returns all pages (0..page_count).
pub fn resolve_pages(pages: Option<&str>, page_count: usize) -> Result<Vec<usize>, i32> {
    match pages {
        Some(range) => parse_page_range(range, page_count).map_err(fail),
        None => Ok((0..page_count).collect()),
    }
}
