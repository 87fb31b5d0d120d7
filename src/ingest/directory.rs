//! Recursively walk a directory for `.pdf` files, each becoming a seed
//! record.
//!
//! Grounded on `original_source/worker.go` (`DirHasPDFs`) for the
//! suffix-match convention; full recursive walk is new (the original only
//! checks a single directory level before skipping re-extraction).

use std::path::{Path, PathBuf};

use crate::ingest::file::seed_from_path;
use crate::ingest::SeedRecord;

/// Collect every `.pdf` file under `root`, recursively.
pub async fn walk_pdfs(root: &Path) -> std::io::Result<Vec<SeedRecord>> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if is_pdf(&path) {
                found.push(seed_from_path(&path, None));
            }
        }
    }

    Ok(found)
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("pdf")).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_pdfs_recursively() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4").await.unwrap();
        let nested = dir.path().join("nested");
        tokio::fs::create_dir(&nested).await.unwrap();
        tokio::fs::write(nested.join("b.pdf"), b"%PDF-1.4").await.unwrap();
        tokio::fs::write(nested.join("c.txt"), b"not a pdf").await.unwrap();

        let mut found: Vec<PathBuf> = walk_pdfs(dir.path()).await.unwrap().into_iter().map(|s| s.pdf_path).collect();
        found.sort();

        assert_eq!(found, vec![dir.path().join("a.pdf"), nested.join("b.pdf")]);
    }
}
