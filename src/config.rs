//! Runtime configuration: YAML file, overlaid by CLI flags.
//!
//! Mirrors the flag set and defaults of the original program's flag table
//! (tesseract=1, pdfcpu/gs/convert=3, download=1, the 17/36/369 I/O gates,
//! jpeg-quality=71, progressive=true, limit=1, buffer=128KiB).

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::ConfigError;

fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Per-tool semaphore sizes (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub tesseract: usize,
    pub pdftotext: usize,
    pub pdftoppm: usize,
    pub pdfcpu: usize,
    pub gs: usize,
    pub convert: usize,
    pub download: usize,
    pub png2jpg: usize,
    pub resize: usize,
    pub shafile: usize,
    pub watermark: usize,
    pub darkimage: usize,
    pub filedata: usize,
    pub shastring: usize,
    pub wjsonfile: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            tesseract: 1,
            pdftotext: cpu_count(),
            pdftoppm: cpu_count(),
            pdfcpu: 3,
            gs: 3,
            convert: 3,
            download: 1,
            png2jpg: 17,
            resize: 17,
            shafile: 36,
            watermark: 36,
            darkimage: 36,
            filedata: 369,
            shastring: 369,
            wjsonfile: 369,
        }
    }
}

/// Column-name mapping for a tabular (CSV/XLSX) manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub url: Option<String>,
    pub path: Option<String>,
    pub record_number: Option<String>,
    pub title: Option<String>,
    pub metadata_columns: Vec<String>,
}

/// Fully resolved runtime settings: defaults, overlaid by YAML file,
/// overlaid by CLI flags that were actually passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_directory: PathBuf,
    pub log_directory: PathBuf,

    pub download_pdf_url: Option<String>,
    pub import_pdf_path: Option<PathBuf>,
    pub import_directory: Option<PathBuf>,
    pub import_csv: Option<PathBuf>,
    pub import_xlsx: Option<PathBuf>,
    pub csv_columns: ColumnMapping,
    pub xlsx_columns: ColumnMapping,

    pub pdf_title: Option<String>,
    pub metadata_json: Option<String>,

    pub no_clam: bool,

    pub limit: usize,
    pub buffer_bytes: usize,

    pub gates: GateConfig,

    pub jpeg_quality: u8,
    pub progressive_jpeg: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_directory: PathBuf::from("./database"),
            log_directory: PathBuf::from("./logs"),
            download_pdf_url: None,
            import_pdf_path: None,
            import_directory: None,
            import_csv: None,
            import_xlsx: None,
            csv_columns: ColumnMapping::default(),
            xlsx_columns: ColumnMapping::default(),
            pdf_title: None,
            metadata_json: None,
            no_clam: false,
            limit: 1,
            buffer_bytes: 128 * 1024,
            gates: GateConfig::default(),
            jpeg_quality: 71,
            progressive_jpeg: true,
        }
    }
}

impl Settings {
    /// Load defaults, overlay an optional YAML file, overlay CLI flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut settings = match &cli.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Settings::default(),
        };
        settings.apply_cli(cli);
        settings.ensure_directories()?;
        Ok(settings)
    }

    fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.database_directory {
            self.database_directory = v.clone();
        }
        if let Some(v) = &cli.log {
            self.log_directory = v.clone();
        }
        if let Some(v) = &cli.download_pdf_url {
            self.download_pdf_url = Some(v.clone());
        }
        if let Some(v) = &cli.import_pdf_path {
            self.import_pdf_path = Some(v.clone());
        }
        if let Some(v) = &cli.import_directory {
            self.import_directory = Some(v.clone());
        }
        if let Some(v) = &cli.import_csv {
            self.import_csv = Some(v.clone());
        }
        if let Some(v) = &cli.import_xlsx {
            self.import_xlsx = Some(v.clone());
        }
        if let Some(v) = &cli.csv_column_url {
            self.csv_columns.url = Some(v.clone());
        }
        if let Some(v) = &cli.csv_column_path {
            self.csv_columns.path = Some(v.clone());
        }
        if let Some(v) = &cli.csv_column_record_number {
            self.csv_columns.record_number = Some(v.clone());
        }
        if let Some(v) = &cli.csv_column_title {
            self.csv_columns.title = Some(v.clone());
        }
        if let Some(v) = &cli.xlsx_column_url {
            self.xlsx_columns.url = Some(v.clone());
        }
        if let Some(v) = &cli.xlsx_column_path {
            self.xlsx_columns.path = Some(v.clone());
        }
        if let Some(v) = &cli.xlsx_column_record_number {
            self.xlsx_columns.record_number = Some(v.clone());
        }
        if let Some(v) = &cli.xlsx_column_title {
            self.xlsx_columns.title = Some(v.clone());
        }
        if let Some(v) = &cli.csv_metadata_columns {
            let cols: Vec<String> = v.split(',').map(|s| s.trim().to_string()).collect();
            self.csv_columns.metadata_columns = cols.clone();
            self.xlsx_columns.metadata_columns = cols;
        }
        if cli.no_clam {
            self.no_clam = true;
        }
        if let Some(v) = &cli.pdf_title {
            self.pdf_title = Some(v.clone());
        }
        if let Some(v) = &cli.metadata_json {
            self.metadata_json = Some(v.clone());
        }
        if let Some(v) = cli.limit {
            self.limit = v;
        }
        if let Some(v) = cli.buffer {
            self.buffer_bytes = v;
        }
        if let Some(v) = cli.tesseract {
            self.gates.tesseract = v;
        }
        if let Some(v) = cli.download {
            self.gates.download = v;
        }
        if let Some(v) = cli.pdfcpu {
            self.gates.pdfcpu = v;
        }
        if let Some(v) = cli.gs {
            self.gates.gs = v;
        }
        if let Some(v) = cli.pdftotext {
            self.gates.pdftotext = v;
        }
        if let Some(v) = cli.convert {
            self.gates.convert = v;
        }
        if let Some(v) = cli.pdftoppm {
            self.gates.pdftoppm = v;
        }
        if let Some(v) = cli.png2jpg {
            self.gates.png2jpg = v;
        }
        if let Some(v) = cli.resize {
            self.gates.resize = v;
        }
        if let Some(v) = cli.shafile {
            self.gates.shafile = v;
        }
        if let Some(v) = cli.watermark {
            self.gates.watermark = v;
        }
        if let Some(v) = cli.darkimage {
            self.gates.darkimage = v;
        }
        if let Some(v) = cli.filedata {
            self.gates.filedata = v;
        }
        if let Some(v) = cli.shastring {
            self.gates.shastring = v;
        }
        if let Some(v) = cli.wjsonfile {
            self.gates.wjsonfile = v;
        }
        if let Some(v) = cli.jpeg_quality {
            self.jpeg_quality = v;
        }
        if let Some(v) = cli.progressive {
            self.progressive_jpeg = v;
        }
    }

    fn ensure_directories(&self) -> Result<(), ConfigError> {
        for dir in [&self.database_directory, &self.log_directory] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn has_ingestion_source(&self) -> bool {
        self.download_pdf_url.is_some()
            || self.import_pdf_path.is_some()
            || self.import_directory.is_some()
            || self.import_csv.is_some()
            || self.import_xlsx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_gate_table() {
        let gates = GateConfig::default();
        assert_eq!(gates.tesseract, 1);
        assert_eq!(gates.download, 1);
        assert_eq!(gates.pdfcpu, 3);
        assert_eq!(gates.gs, 3);
        assert_eq!(gates.convert, 3);
        assert_eq!(gates.png2jpg, 17);
        assert_eq!(gates.shafile, 36);
        assert_eq!(gates.filedata, 369);
    }

    #[test]
    fn default_settings_have_no_ingestion_source() {
        let settings = Settings::default();
        assert!(!settings.has_ingestion_source());
    }
}
