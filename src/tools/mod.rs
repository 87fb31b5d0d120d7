//! Subprocess drivers for the external tools the pipeline shells out to:
//! `pdfcpu`, `gs`, `pdftotext`, `pdftoppm`, `tesseract`, `convert`, and
//! (optionally) `clamscan`.
//!
//! Every tool is resolved to an absolute path once at startup via
//! [`verify_binaries`] and the resolved path is what every later `Command`
//! invocation uses, never the bare name.

mod clamscan;
mod convert;
mod gs;
mod pdfcpu;
mod pdftoppm;
mod pdftotext;
mod tesseract;

pub use clamscan::scan_and_remove;
pub use convert::{recolor_dark_pass_one, recolor_dark_pass_two};
pub use gs::repair_pdf;
pub use pdfcpu::{extract_pages, optimize_pdf, pdf_info, validate_pdf};
pub use pdftoppm::render_pages_to_png;
pub use pdftotext::extract_text;
pub use tesseract::ocr_page;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ToolError;

/// The binaries required when ClamAV scanning is enabled.
pub const REQUIRED_BINARIES: &[&str] = &[
    "pdfcpu",
    "gs",
    "pdftotext",
    "convert",
    "pdftoppm",
    "tesseract",
    "clamscan",
];

/// The binaries required when `--no-clam` is passed.
pub const REQUIRED_BINARIES_NO_CLAM: &[&str] = &["pdfcpu", "gs", "pdftotext", "convert", "pdftoppm", "tesseract"];

/// Resolved absolute paths for every required binary, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ResolvedBinaries(HashMap<String, PathBuf>);

impl ResolvedBinaries {
    pub fn path(&self, name: &str) -> &PathBuf {
        self.0
            .get(name)
            .unwrap_or_else(|| panic!("binary '{name}' was not verified at startup"))
    }
}

/// Run `binary` with `args`, capturing stdout/stderr, mapping a non-zero
/// exit or spawn failure into a [`ToolError`].
pub(crate) async fn run_captured(
    binary_name: &str,
    binary_path: &PathBuf,
    args: &[&std::ffi::OsStr],
) -> Result<String, ToolError> {
    let output = tokio::process::Command::new(binary_path)
        .args(args)
        .output()
        .await
        .map_err(|source| ToolError::Spawn {
            binary: binary_name.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::NonZeroExit {
            binary: binary_name.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Locate every binary in `names` on `PATH`, failing fast on the first miss.
pub fn verify_binaries(names: &[&str]) -> Result<ResolvedBinaries, ToolError> {
    let mut resolved = HashMap::new();
    for name in names {
        let path = which::which(name).map_err(|_| ToolError::BinaryNotFound((*name).to_string()))?;
        tracing::info!(binary = *name, path = %path.display(), "verified binary");
        resolved.insert((*name).to_string(), path);
    }
    Ok(ResolvedBinaries(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_binaries_list_matches_no_clam_minus_clamscan() {
        let mut with_clam: Vec<&str> = REQUIRED_BINARIES.iter().copied().filter(|b| *b != "clamscan").collect();
        let mut without_clam: Vec<&str> = REQUIRED_BINARIES_NO_CLAM.to_vec();
        with_clam.sort();
        without_clam.sort();
        assert_eq!(with_clam, without_clam);
    }

    #[test]
    fn verify_binaries_fails_fast_on_unknown_name() {
        let result = verify_binaries(&["definitely-not-a-real-binary-name"]);
        assert!(result.is_err());
    }
}
