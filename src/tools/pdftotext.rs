//! `pdftotext PDF_PATH OUTPUT_PATH`
//!
//! Grounded on `original_source/pipeline.go` (`extractPlainTextFromPdf`).

use std::path::Path;

use tokio::sync::Semaphore;

use crate::error::ToolError;
use crate::tools::ResolvedBinaries;

/// Extract the embedded text layer of `pdf_path` into `output_path`.
pub async fn extract_text(
    binaries: &ResolvedBinaries,
    gate: &Semaphore,
    pdf_path: &Path,
    output_path: &Path,
) -> Result<(), ToolError> {
    let binary = binaries.path("pdftotext");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    super::run_captured(
        "pdftotext",
        binary,
        &[pdf_path.as_os_str(), output_path.as_os_str()],
    )
    .await?;
    Ok(())
}
