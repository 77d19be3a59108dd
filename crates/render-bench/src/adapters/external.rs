//! Factories for external HTML-to-PDF renderers driven as subprocesses

use crate::adapters::subprocess::SubprocessAdapter;
use std::path::PathBuf;

/// Executables tried, in order, for the headless Chromium backend
const CHROMIUM_CANDIDATES: &[&str] = &["chromium", "chromium-browser", "google-chrome", "google-chrome-stable"];

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// First candidate found on `PATH`, or the first candidate name so that setup
/// reports it as missing
fn find_executable(candidates: &[&str]) -> PathBuf {
    candidates
        .iter()
        .find_map(|name| which::which(name).ok())
        .unwrap_or_else(|| PathBuf::from(candidates[0]))
}

/// Creates a subprocess adapter for wkhtmltopdf (WebKit-based)
pub fn create_wkhtmltopdf_adapter() -> SubprocessAdapter {
    SubprocessAdapter::new(
        "wkhtmltopdf",
        "wkhtmltopdf",
        args(&["--quiet", "--page-size", "A4", "{input}", "{output}"]),
        vec![],
    )
}

/// Creates a subprocess adapter for WeasyPrint (CSS paged media)
pub fn create_weasyprint_adapter() -> SubprocessAdapter {
    SubprocessAdapter::new("weasyprint", "weasyprint", args(&["{input}", "{output}"]), vec![])
}

/// Creates a subprocess adapter for headless Chromium's print-to-PDF
pub fn create_chromium_adapter() -> SubprocessAdapter {
    SubprocessAdapter::new(
        "chromium-headless",
        find_executable(CHROMIUM_CANDIDATES),
        args(&[
            "--headless",
            "--disable-gpu",
            "--no-pdf-header-footer",
            "--print-to-pdf={output}",
            "{input}",
        ]),
        vec![],
    )
}

/// Creates a subprocess adapter for Pandoc (HTML reader, default PDF engine)
pub fn create_pandoc_adapter() -> SubprocessAdapter {
    SubprocessAdapter::new(
        "pandoc",
        "pandoc",
        args(&["--from", "html", "--output", "{output}", "{input}"]),
        vec![],
    )
}
