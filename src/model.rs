//! Core data model: Document, ResultData, Page, PendingPage.
//!
//! Field shapes follow the record/manifest JSON contract in spec §6 and the
//! struct layout in `original_source/data.go`. Per-language gematria scores
//! are intentionally omitted from `Page` (see DESIGN.md Open Questions).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The PDF-info block as reported by `pdfcpu info -json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfInfo {
    pub source: String,
    pub version: String,
    pub pages: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default)]
    pub modification_date: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub tagged: bool,
    #[serde(default)]
    pub hybrid: bool,
    #[serde(default)]
    pub linearized: bool,
}

/// The document-level record, written to `record.json`. Immutable after its
/// first write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultData {
    pub identifier: String,
    pub url: Option<String>,
    pub data_dir: PathBuf,
    pub pdf_path: PathBuf,
    pub url_checksum: String,
    #[serde(default)]
    pub pdf_checksum: String,
    pub ocr_text_path: PathBuf,
    pub extracted_text_path: PathBuf,
    pub record_path: PathBuf,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub info: PdfInfo,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ResultData {
    /// The canonical pages directory for this document.
    pub fn pages_dir(&self) -> PathBuf {
        self.data_dir.join("pages")
    }
}

/// A committed page, owned by a Document's page map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub identifier: String,
    pub document_identifier: String,
    pub page_number: u32,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub ocr_text: String,
}

/// A document in progress. Mutated only by the aggregator, under the
/// document's named lock.
#[derive(Debug, Clone)]
pub struct Document {
    pub identifier: String,
    pub url: Option<String>,
    pub total_pages: u32,
    pub metadata: HashMap<String, String>,
    pub pages: HashMap<u32, Page>,
}

impl Document {
    pub fn new(identifier: String, url: Option<String>) -> Self {
        Self {
            identifier,
            url,
            total_pages: 0,
            metadata: HashMap::new(),
            pages: HashMap::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_pages > 0 && self.pages.len() as u32 == self.total_pages
    }
}

/// One {light,dark} size bucket of PNG/JPEG paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeVariants {
    pub original: PathBuf,
    pub large: PathBuf,
    pub medium: PathBuf,
    pub small: PathBuf,
    pub social: PathBuf,
}

/// PNG and JPEG path sets for both light and dark variants of a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagePaths {
    pub png_light: SizeVariants,
    pub png_dark: SizeVariants,
    pub jpeg_light: SizeVariants,
    pub jpeg_dark: SizeVariants,
}

/// The unit flowing through the pipeline. Copied between stages; each
/// worker receives its own snapshot, amends it, and persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPage {
    pub identifier: String,
    pub record_identifier: String,
    pub page_number: u32,
    pub pdf_path: PathBuf,
    pub pages_dir: PathBuf,
    pub ocr_text_path: PathBuf,
    pub manifest_path: PathBuf,
    pub images: ImagePaths,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub cryptonyms: Vec<String>,
    #[serde(default)]
    pub dates: Vec<chrono::DateTime<chrono::Utc>>,
}

/// Zero-pad a 1-based page number to six digits, per the path contract.
pub fn pad_page_number(page_number: u32) -> String {
    format!("{page_number:06}")
}

/// Build the full set of image paths for a page under `pages_dir`.
pub fn build_image_paths(pages_dir: &Path, page_number: u32) -> ImagePaths {
    let padded = pad_page_number(page_number);
    let variant = |shade: &str, size: &str, ext: &str| -> PathBuf {
        pages_dir.join(format!("page.{shade}.{padded}.{size}.{ext}"))
    };
    let sizes = |shade: &str, ext: &str| SizeVariants {
        original: variant(shade, "original", ext),
        large: variant(shade, "large", ext),
        medium: variant(shade, "medium", ext),
        small: variant(shade, "small", ext),
        social: variant(shade, "social", ext),
    };
    ImagePaths {
        png_light: sizes("light", "png"),
        png_dark: sizes("dark", "png"),
        jpeg_light: sizes("light", "jpg"),
        jpeg_dark: sizes("dark", "jpg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_padding_is_six_digits() {
        assert_eq!(pad_page_number(1), "000001");
        assert_eq!(pad_page_number(123456), "123456");
    }

    #[test]
    fn image_paths_cover_all_ten_png_and_jpeg_variants() {
        let paths = build_image_paths(Path::new("/db/abc/pages"), 2);
        assert_eq!(
            paths.png_light.original,
            PathBuf::from("/db/abc/pages/page.light.000002.original.png")
        );
        assert_eq!(
            paths.jpeg_dark.small,
            PathBuf::from("/db/abc/pages/page.dark.000002.small.jpg")
        );
        assert_eq!(
            paths.png_light.social,
            PathBuf::from("/db/abc/pages/page.light.000002.social.png")
        );
    }

    #[test]
    fn document_completion_requires_matching_total() {
        let mut doc = Document::new("doc1".into(), None);
        assert!(!doc.is_complete());
        doc.total_pages = 2;
        doc.pages.insert(
            1,
            Page {
                identifier: "p1".into(),
                document_identifier: "doc1".into(),
                page_number: 1,
                metadata: HashMap::new(),
                ocr_text: String::new(),
            },
        );
        assert!(!doc.is_complete());
        doc.pages.insert(
            2,
            Page {
                identifier: "p2".into(),
                document_identifier: "doc1".into(),
                page_number: 2,
                metadata: HashMap::new(),
                ocr_text: String::new(),
            },
        );
        assert!(doc.is_complete());
    }
}
