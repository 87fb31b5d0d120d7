//! Seed-record producers: each source adapter produces a [`ResultData`] and
//! hands it to the pipeline's entry channel.
//!
//! Grounded on `original_source/record.go` (`processRecord`, minus the
//! dataset-specific column aliasing — see DESIGN.md Open Questions) and
//! `original_source/worker.go` (`downloadFile`/`tryDownloadFile`/
//! `cryptoRandInt`).

pub mod directory;
pub mod download;
pub mod file;
pub mod manifest;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::ids::IdentifierMint;
use crate::model::ResultData;
use crate::pipeline::PipelineContext;

/// Shape every ingestion source builds before the pipeline sees it.
pub struct SeedRecord {
    pub pdf_path: PathBuf,
    pub url: Option<String>,
    pub title: Option<String>,
    pub metadata: HashMap<String, String>,
}

fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-512 over a file's bytes, gated the same as the Go original's
/// `FileSha512` (`sem_shafile`).
async fn sha512_file_hex(gate: &tokio::sync::Semaphore, path: &Path) -> std::io::Result<String> {
    use sha2::{Digest, Sha512};
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    let bytes = tokio::fs::read(path).await?;
    let mut hasher = Sha512::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Derive a safe on-disk basename from a URL's last path segment, falling
/// back to `document.pdf` if the URL has no usable segment.
fn file_name_from_url(url: &str) -> String {
    let last_segment = url.rsplit('/').next().unwrap_or("").split(['?', '#']).next().unwrap_or("");
    if last_segment.is_empty() {
        "document.pdf".to_string()
    } else {
        last_segment.replace(std::path::MAIN_SEPARATOR, "_")
    }
}

/// Build the on-disk `ResultData` shell for a seed record: allocate an
/// identifier, create the record directory, compute the fixed path set.
pub async fn build_result_data(mint: &IdentifierMint, database_directory: &Path, seed: SeedRecord) -> std::io::Result<ResultData> {
    let key = seed.url.clone().unwrap_or_else(|| seed.pdf_path.display().to_string());
    let url_checksum = sha256_hex(&key);
    let identifier = mint.mint(6).await;
    let data_dir = database_directory.join(&url_checksum);
    tokio::fs::create_dir_all(&data_dir).await?;

    let file_name = match (&seed.url, seed.pdf_path.file_name()) {
        (Some(url), _) => file_name_from_url(url),
        (None, Some(n)) => n.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "_"),
        (None, None) => "document.pdf".to_string(),
    };

    Ok(ResultData {
        identifier,
        url: seed.url,
        data_dir: data_dir.clone(),
        pdf_path: data_dir.join(file_name),
        url_checksum,
        pdf_checksum: String::new(),
        ocr_text_path: data_dir.join("ocr.txt"),
        extracted_text_path: data_dir.join("extracted.txt"),
        record_path: data_dir.join("record.json"),
        total_pages: 0,
        info: Default::default(),
        metadata: seed.metadata,
    })
}

/// Build a `ResultData` for `seed` and populate its PDF: download it if the
/// seed carries a URL, otherwise copy it in from its local source path.
pub async fn admit(ctx: &PipelineContext, database_directory: &Path, seed: SeedRecord) -> Result<ResultData, PipelineError> {
    let source_path = seed.pdf_path.clone();
    let url = seed.url.clone();
    let mut record = build_result_data(&ctx.mint, database_directory, seed).await?;

    match &url {
        Some(url) => {
            download::download_file(&ctx.http_client, &ctx.gates.download, url, &record.pdf_path, &mut ctx.cancel.clone()).await?;
        }
        None => {
            tokio::fs::copy(&source_path, &record.pdf_path).await?;
        }
    }

    record.pdf_checksum = sha512_file_hex(&ctx.gates.shafile, &record.pdf_path).await?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_result_data_creates_record_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mint = IdentifierMint::new();
        let seed = SeedRecord {
            pdf_path: PathBuf::from("some/doc.pdf"),
            url: Some("https://example.test/doc.pdf".into()),
            title: Some("Title".into()),
            metadata: HashMap::new(),
        };
        let record = build_result_data(&mint, dir.path(), seed).await.unwrap();
        assert!(record.data_dir.exists());
        assert_eq!(record.data_dir, dir.path().join(&record.url_checksum));
    }
}
