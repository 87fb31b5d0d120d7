//! `gs -o REPAIRED -sDEVICE=pdfwrite -dPDFSETTINGS=/prepress SOURCE`
//!
//! Ghostscript is used to rewrite a PDF that `pdfcpu validate` rejects.
//! The exact invocation wasn't present in the retrieved source (only the
//! `gs` gate and required-binary entry were); this is the standard
//! Ghostscript repair-rewrite recipe.

use std::path::Path;

use tokio::sync::Semaphore;

use crate::error::ToolError;
use crate::tools::ResolvedBinaries;

pub async fn repair_pdf(
    binaries: &ResolvedBinaries,
    gate: &Semaphore,
    source: &Path,
    repaired: &Path,
) -> Result<(), ToolError> {
    let binary = binaries.path("gs");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");

    let output_flag = format!("-o{}", repaired.display());

    super::run_captured(
        "gs",
        binary,
        &[
            std::ffi::OsStr::new(&output_flag),
            std::ffi::OsStr::new("-sDEVICE=pdfwrite"),
            std::ffi::OsStr::new("-dPDFSETTINGS=/prepress"),
            std::ffi::OsStr::new("-dBATCH"),
            std::ffi::OsStr::new("-dNOPAUSE"),
            source.as_os_str(),
        ],
    )
    .await?;
    Ok(())
}
