//! Error types at module boundaries.

use std::path::PathBuf;

use thiserror::Error;

/// Failures invoking or interpreting an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("required binary `{0}` not found on PATH")]
    BinaryNotFound(String),

    #[error("`{binary}` exited with status {status}: {stderr}")]
    NonZeroExit {
        binary: String,
        status: i32,
        stderr: String,
    },

    #[error("failed to spawn `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse output of `{binary}`: {reason}")]
    UnparseableOutput { binary: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures decoding, validating or encoding an image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{path}: not a PNG (bad signature)")]
    BadSignature { path: PathBuf },

    #[error("{path}: missing IHDR chunk")]
    MissingIhdr { path: PathBuf },

    #[error("{path}: IHDR length {length} != 13")]
    BadIhdrLength { path: PathBuf, length: u32 },

    #[error("{path}: multiple IHDR chunks")]
    MultipleIhdr { path: PathBuf },

    #[error("{path}: missing IDAT chunk")]
    MissingIdat { path: PathBuf },

    #[error("{path}: missing or malformed IEND chunk")]
    BadIend { path: PathBuf },

    #[error("{path}: chunk lengths exceed file size")]
    TruncatedChunks { path: PathBuf },

    #[error(transparent)]
    Decode(#[from] image::ImageError),

    #[error("jpeg encode failed: {reason}")]
    UnparseableEncode { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no ingestion source was specified (one of download-pdf-url, import-pdf-path, import-directory, import-csv, import-xlsx is required)")]
    NoIngestionSource,
}

/// Top-level pipeline failures, one variant per stage-local fatality.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("pdf analysis failed for {path}: {reason}")]
    PdfAnalysis { path: PathBuf, reason: String },

    #[error("document {identifier} abandoned: {reason}")]
    DocumentAbandoned { identifier: String, reason: String },

    #[error("download of {url} failed after {attempts} attempts: {reason}")]
    DownloadExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("file {path} quarantined by antivirus")]
    Quarantined { path: PathBuf },
}
