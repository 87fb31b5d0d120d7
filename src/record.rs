//! Manifest JSON writers and the file-has-data idempotence check every
//! worker runs before redoing expensive work.
//!
//! Grounded on `original_source/worker.go` (`WriteResultDataToJson`,
//! `WritePendingPageToJson`, `fileHasData`), both gated (`wjsonfile`,
//! `filedata`) and both 4-space-indented.

use std::path::Path;

use regex::Regex;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

use crate::error::PipelineError;
use crate::model::{PendingPage, ResultData};

/// Write `record` to `result_data.record_path`, truncating any prior
/// contents, 4-space indented.
pub async fn write_result_data(gate: &Semaphore, record: &ResultData) -> Result<(), PipelineError> {
    write_json_indented(gate, &record.record_path, record).await
}

/// Write `page` to `page.manifest_path`, truncating any prior contents,
/// 4-space indented.
pub async fn write_pending_page(gate: &Semaphore, page: &PendingPage) -> Result<(), PipelineError> {
    write_json_indented(gate, &page.manifest_path, page).await
}

async fn write_json_indented<T: Serialize>(gate: &Semaphore, path: &Path, value: &T) -> Result<(), PipelineError> {
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, serde_json::ser::PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(&buffer).await?;
    file.flush().await?;
    Ok(())
}

/// Does `path` already contain usable output from a prior run? Empty or
/// near-empty (fewer than 4 alphanumeric characters) files are treated as
/// absent so a worker retries rather than trusting a truncated write.
pub async fn file_has_data(gate: &Semaphore, path: &Path) -> Result<bool, PipelineError> {
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    if contents.len() < 20 {
        let non_alnum = Regex::new("[^a-zA-Z0-9]+").unwrap();
        let filtered = non_alnum.replace_all(&contents, "");
        Ok(filtered.len() > 3)
    } else {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn sample_record(dir: &Path) -> ResultData {
        ResultData {
            identifier: "2026ABCDEF".into(),
            url: Some("https://example.test/doc.pdf".into()),
            data_dir: dir.to_path_buf(),
            pdf_path: dir.join("doc.pdf"),
            url_checksum: "abc".into(),
            pdf_checksum: String::new(),
            ocr_text_path: dir.join("ocr.txt"),
            extracted_text_path: dir.join("extracted.txt"),
            record_path: dir.join("record.json"),
            total_pages: 1,
            info: Default::default(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn write_result_data_produces_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let record = sample_record(dir.path());
        let gate = Semaphore::new(1);
        write_result_data(&gate, &record).await.unwrap();
        let contents = tokio::fs::read_to_string(&record.record_path).await.unwrap();
        assert!(contents.contains("    \"identifier\""));
    }

    #[tokio::test]
    async fn file_has_data_false_when_missing() {
        let gate = Semaphore::new(1);
        let missing = PathBuf::from("/nonexistent/path/for/test.txt");
        assert!(!file_has_data(&gate, &missing).await.unwrap());
    }

    #[tokio::test]
    async fn file_has_data_false_for_short_non_alnum_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.txt");
        tokio::fs::write(&path, "...").await.unwrap();
        let gate = Semaphore::new(1);
        assert!(!file_has_data(&gate, &path).await.unwrap());
    }

    #[tokio::test]
    async fn file_has_data_true_for_long_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        tokio::fs::write(&path, "a".repeat(40)).await.unwrap();
        let gate = Semaphore::new(1);
        assert!(file_has_data(&gate, &path).await.unwrap());
    }
}
