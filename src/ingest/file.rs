//! Import a single local PDF file.
//!
//! Grounded on `original_source/processor.go` (`process_import_pdf`, a stub
//! in the retrieved source); the copy-into-record-directory behavior here
//! mirrors `processRecord`'s `q_file_pdf` handling in `record.go`.

use std::collections::HashMap;
use std::path::Path;

use crate::ingest::SeedRecord;

pub fn seed_from_path(path: &Path, title: Option<String>) -> SeedRecord {
    SeedRecord {
        pdf_path: path.to_path_buf(),
        url: None,
        title,
        metadata: HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_carries_path_and_title() {
        let seed = seed_from_path(Path::new("/tmp/doc.pdf"), Some("Title".into()));
        assert_eq!(seed.pdf_path, Path::new("/tmp/doc.pdf"));
        assert_eq!(seed.title.as_deref(), Some("Title"));
        assert!(seed.url.is_none());
    }
}
