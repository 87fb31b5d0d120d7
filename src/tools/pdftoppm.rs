//! `pdftoppm -r 369 -png -freetype yes -aa yes -aaVector yes -thinlinemode solid SRC DEST_PREFIX`
//!
//! Grounded on `original_source/pipeline.go` (`convertPageToPng`). pdftoppm
//! appends `-1` before the extension for a single-page render; the caller
//! renames the result to the expected path.

use std::path::Path;

use tokio::fs;
use tokio::sync::Semaphore;

use crate::error::ToolError;
use crate::tools::ResolvedBinaries;

pub async fn render_pages_to_png(
    binaries: &ResolvedBinaries,
    gate: &Semaphore,
    pdf_path: &Path,
    output_original_png: &Path,
) -> Result<(), ToolError> {
    let binary = binaries.path("pdftoppm");
    let prefix = output_original_png.with_extension("");

    {
        let _permit = gate.acquire().await.expect("gate semaphore never closed");
        super::run_captured(
            "pdftoppm",
            binary,
            &[
                std::ffi::OsStr::new("-r"),
                std::ffi::OsStr::new("369"),
                std::ffi::OsStr::new("-png"),
                std::ffi::OsStr::new("-freetype"),
                std::ffi::OsStr::new("yes"),
                std::ffi::OsStr::new("-aa"),
                std::ffi::OsStr::new("yes"),
                std::ffi::OsStr::new("-aaVector"),
                std::ffi::OsStr::new("yes"),
                std::ffi::OsStr::new("-thinlinemode"),
                std::ffi::OsStr::new("solid"),
                pdf_path.as_os_str(),
                prefix.as_os_str(),
            ],
        )
        .await?;
    }

    let rendered = {
        let mut p = prefix.clone();
        let file_name = format!("{}-1.png", prefix.file_name().and_then(|s| s.to_str()).unwrap_or_default());
        p.set_file_name(file_name);
        p
    };
    fs::rename(&rendered, output_original_png).await?;
    Ok(())
}
