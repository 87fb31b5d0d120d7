//! `pdfcpu extract`, `pdfcpu validate`, `pdfcpu info -json`.
//!
//! Grounded on `original_source/pipeline.go` (`extractPagesFromPdf`) and
//! `original_source/processor.go` (`analyze_pdf_path`).

use std::path::Path;

use tokio::sync::Semaphore;

use crate::error::ToolError;
use crate::model::PdfInfo;
use crate::tools::ResolvedBinaries;

/// `pdfcpu extract -mode page PDF_PATH OUTPUT_DIR`
pub async fn extract_pages(
    binaries: &ResolvedBinaries,
    gate: &Semaphore,
    pdf_path: &Path,
    output_dir: &Path,
) -> Result<(), ToolError> {
    let binary = binaries.path("pdfcpu");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    super::run_captured(
        "pdfcpu",
        binary,
        &[
            std::ffi::OsStr::new("extract"),
            std::ffi::OsStr::new("-mode"),
            std::ffi::OsStr::new("page"),
            pdf_path.as_os_str(),
            output_dir.as_os_str(),
        ],
    )
    .await?;
    Ok(())
}

/// `pdfcpu validate -verbose PDF_PATH`, returning (page_count, has_fonts).
pub async fn validate_pdf(
    binaries: &ResolvedBinaries,
    gate: &Semaphore,
    pdf_path: &Path,
) -> Result<(u32, bool), ToolError> {
    let binary = binaries.path("pdfcpu");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    let stdout = super::run_captured(
        "pdfcpu",
        binary,
        &[std::ffi::OsStr::new("validate"), std::ffi::OsStr::new("-verbose"), pdf_path.as_os_str()],
    )
    .await?;

    let mut page_count = 0u32;
    let mut has_fonts = false;
    for line in stdout.lines() {
        if let Some(rest) = line.trim().strip_prefix("pages:") {
            page_count = rest.trim().parse().unwrap_or(0);
        }
        if line.contains("fonts:") {
            has_fonts = true;
        }
    }
    Ok((page_count, has_fonts))
}

/// `pdfcpu optimize PDF_PATH`, run in place after a document validates.
pub async fn optimize_pdf(binaries: &ResolvedBinaries, gate: &Semaphore, pdf_path: &Path) -> Result<(), ToolError> {
    let binary = binaries.path("pdfcpu");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    super::run_captured("pdfcpu", binary, &[std::ffi::OsStr::new("optimize"), pdf_path.as_os_str()]).await?;
    Ok(())
}

/// `pdfcpu info -json PDF_PATH`, decoded into [`PdfInfo`].
pub async fn pdf_info(binaries: &ResolvedBinaries, gate: &Semaphore, pdf_path: &Path) -> Result<PdfInfo, ToolError> {
    let binary = binaries.path("pdfcpu");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    let stdout = super::run_captured(
        "pdfcpu",
        binary,
        &[std::ffi::OsStr::new("info"), std::ffi::OsStr::new("-json"), pdf_path.as_os_str()],
    )
    .await?;

    #[derive(serde::Deserialize)]
    struct Envelope {
        #[serde(rename = "Infos")]
        infos: Vec<PdfInfo>,
    }

    let envelope: Envelope = serde_json::from_str(&stdout).map_err(|e| ToolError::UnparseableOutput {
        binary: "pdfcpu".to_string(),
        reason: e.to_string(),
    })?;

    envelope.infos.into_iter().next().ok_or_else(|| ToolError::UnparseableOutput {
        binary: "pdfcpu".to_string(),
        reason: "info -json returned no Infos entries".to_string(),
    })
}
