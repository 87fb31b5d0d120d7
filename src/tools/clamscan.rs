//! `clamscan --infected --remove PATH`
//!
//! Grounded on `original_source/processor.go` (`scan_path_with_clam_av`).
//! Returns whether an action was taken (file removed or threat found), so
//! the caller can mark the document quarantined.

use std::path::Path;

use tokio::sync::Semaphore;

use crate::error::ToolError;
use crate::tools::ResolvedBinaries;

pub async fn scan_and_remove(binaries: &ResolvedBinaries, gate: &Semaphore, path: &Path) -> Result<bool, ToolError> {
    let binary = binaries.path("clamscan");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    let stdout = super::run_captured("clamscan", binary, &[
        std::ffi::OsStr::new("--infected"),
        std::ffi::OsStr::new("--remove"),
        path.as_os_str(),
    ])
    .await?;

    Ok(stdout.contains("Removed") || stdout.contains("FOUND"))
}
