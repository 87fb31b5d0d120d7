//! Command-line flags. One flat struct, mirroring the original flag table.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "declass-pipeline")]
#[command(about = "Staged concurrent PDF ingestion pipeline for declassified documents")]
#[command(version)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// URL of a PDF to download (must be http(s), <= 369MB, application/pdf)
    #[arg(long)]
    pub download_pdf_url: Option<String>,

    /// Relative path to a PDF to process (< 369MB)
    #[arg(long)]
    pub import_pdf_path: Option<PathBuf>,

    /// Directory that will have all .pdf files imported recursively
    #[arg(long)]
    pub import_directory: Option<PathBuf>,

    /// Path to a CSV/PSV/TSV manifest of URLs and metadata
    #[arg(long)]
    pub import_csv: Option<PathBuf>,

    /// Column header correlating to a download URL (CSV)
    #[arg(long)]
    pub csv_column_url: Option<String>,
    /// Column header correlating to a local path (CSV)
    #[arg(long)]
    pub csv_column_path: Option<String>,
    /// Column header correlating to a record number (CSV)
    #[arg(long)]
    pub csv_column_record_number: Option<String>,
    /// Column header correlating to a title (CSV)
    #[arg(long)]
    pub csv_column_title: Option<String>,

    /// Path to an XLSX manifest of URLs and metadata (sheet 1)
    #[arg(long)]
    pub import_xlsx: Option<PathBuf>,

    /// Column header correlating to a download URL (XLSX)
    #[arg(long)]
    pub xlsx_column_url: Option<String>,
    /// Column header correlating to a local path (XLSX)
    #[arg(long)]
    pub xlsx_column_path: Option<String>,
    /// Column header correlating to a record number (XLSX)
    #[arg(long)]
    pub xlsx_column_record_number: Option<String>,
    /// Column header correlating to a title (XLSX)
    #[arg(long)]
    pub xlsx_column_title: Option<String>,

    /// Comma-separated header names to carry through as free-form metadata
    #[arg(long)]
    pub csv_metadata_columns: Option<String>,

    /// Disable ClamAV antivirus scanning of downloaded files
    #[arg(long)]
    pub no_clam: bool,

    /// Title of the document
    #[arg(long)]
    pub pdf_title: Option<String>,

    /// JSON object of free-form string->string metadata
    #[arg(long)]
    pub metadata_json: Option<String>,

    /// Output directory for the apario-reader-compatible database tree
    #[arg(long)]
    pub database_directory: Option<PathBuf>,

    /// Number of rows to concurrently process (also the per-stage channel depth)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Memory allocation for CSV buffer in bytes
    #[arg(long)]
    pub buffer: Option<usize>,

    /// Semaphore limiter for `tesseract`
    #[arg(long)]
    pub tesseract: Option<usize>,
    /// Semaphore limiter for downloading PDFs
    #[arg(long)]
    pub download: Option<usize>,
    /// Semaphore limiter for `pdfcpu`
    #[arg(long)]
    pub pdfcpu: Option<usize>,
    /// Semaphore limiter for `gs`
    #[arg(long)]
    pub gs: Option<usize>,
    /// Semaphore limiter for `pdftotext`
    #[arg(long)]
    pub pdftotext: Option<usize>,
    /// Semaphore limiter for `convert`
    #[arg(long)]
    pub convert: Option<usize>,
    /// Semaphore limiter for `pdftoppm`
    #[arg(long)]
    pub pdftoppm: Option<usize>,
    /// Semaphore limiter for converting PNG to JPEG
    #[arg(long)]
    pub png2jpg: Option<usize>,
    /// Semaphore limiter for resizing images
    #[arg(long)]
    pub resize: Option<usize>,
    /// Semaphore limiter for file checksums
    #[arg(long)]
    pub shafile: Option<usize>,
    /// Semaphore limiter for watermarking
    #[arg(long)]
    pub watermark: Option<usize>,
    /// Semaphore limiter for dark-mode image conversion
    #[arg(long)]
    pub darkimage: Option<usize>,
    /// Semaphore limiter for writing file metadata
    #[arg(long)]
    pub filedata: Option<usize>,
    /// Semaphore limiter for string checksums
    #[arg(long)]
    pub shastring: Option<usize>,
    /// Semaphore limiter for writing JSON files
    #[arg(long)]
    pub wjsonfile: Option<usize>,

    /// JPEG quality percentage (1-100)
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// Encode JPEGs progressively
    #[arg(long)]
    pub progressive: Option<bool>,

    /// Directory to write debug/info/error log files to
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Enable verbose (debug-level) console logging
    #[arg(short, long)]
    pub verbose: bool,
}
