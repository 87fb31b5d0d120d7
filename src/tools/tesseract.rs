//! `tesseract SRC DEST -l eng --psm 1`
//!
//! Grounded on `original_source/pipeline.go` (`performOcrOnPdf`). `DEST` is
//! passed without an extension; tesseract appends `.txt` itself.

use std::path::Path;

use tokio::sync::Semaphore;

use crate::error::ToolError;
use crate::tools::ResolvedBinaries;

pub async fn ocr_page(
    binaries: &ResolvedBinaries,
    gate: &Semaphore,
    source_png: &Path,
    dest_without_extension: &Path,
) -> Result<(), ToolError> {
    let binary = binaries.path("tesseract");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    super::run_captured(
        "tesseract",
        binary,
        &[
            source_png.as_os_str(),
            dest_without_extension.as_os_str(),
            std::ffi::OsStr::new("-l"),
            std::ffi::OsStr::new("eng"),
            std::ffi::OsStr::new("--psm"),
            std::ffi::OsStr::new("1"),
        ],
    )
    .await?;
    Ok(())
}
