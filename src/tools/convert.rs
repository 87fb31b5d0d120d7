//! Two-pass dark-mode recolor via ImageMagick's `convert`.
//!
//! Grounded on `original_source/pipeline.go` (`generateDarkThumbnails`):
//! pass one remaps the light background/foreground palette onto the PNG,
//! pass two flattens white highlights back over the result, both in place.

use std::path::Path;

use tokio::sync::Semaphore;

use crate::error::ToolError;
use crate::tools::ResolvedBinaries;

/// `convert LIGHT -channel rgba -matte -fill rgba(250,226,203,1) -fuzz 45% -opaque rgba(76,76,76,1) -flatten DARK`
pub async fn recolor_dark_pass_one(
    binaries: &ResolvedBinaries,
    gate: &Semaphore,
    light_original: &Path,
    dark_original: &Path,
) -> Result<(), ToolError> {
    let binary = binaries.path("convert");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    super::run_captured(
        "convert",
        binary,
        &[
            light_original.as_os_str(),
            std::ffi::OsStr::new("-channel"),
            std::ffi::OsStr::new("rgba"),
            std::ffi::OsStr::new("-matte"),
            std::ffi::OsStr::new("-fill"),
            std::ffi::OsStr::new("rgba(250,226,203,1)"),
            std::ffi::OsStr::new("-fuzz"),
            std::ffi::OsStr::new("45%"),
            std::ffi::OsStr::new("-opaque"),
            std::ffi::OsStr::new("rgba(76,76,76,1)"),
            std::ffi::OsStr::new("-flatten"),
            dark_original.as_os_str(),
        ],
    )
    .await?;
    Ok(())
}

/// `convert DARK -channel rgba -matte -fill rgba(40,40,86,1) -fuzz 12% -opaque white -flatten DARK`
pub async fn recolor_dark_pass_two(binaries: &ResolvedBinaries, gate: &Semaphore, dark_original: &Path) -> Result<(), ToolError> {
    let binary = binaries.path("convert");
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    super::run_captured(
        "convert",
        binary,
        &[
            dark_original.as_os_str(),
            std::ffi::OsStr::new("-channel"),
            std::ffi::OsStr::new("rgba"),
            std::ffi::OsStr::new("-matte"),
            std::ffi::OsStr::new("-fill"),
            std::ffi::OsStr::new("rgba(40,40,86,1)"),
            std::ffi::OsStr::new("-fuzz"),
            std::ffi::OsStr::new("12%"),
            std::ffi::OsStr::new("-opaque"),
            std::ffi::OsStr::new("white"),
            std::ffi::OsStr::new("-flatten"),
            dark_original.as_os_str(),
        ],
    )
    .await?;
    Ok(())
}
