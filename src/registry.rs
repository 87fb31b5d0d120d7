//! In-memory lookups the aggregator needs across the fan-out/fan-in
//! boundary: ResultData by document identifier, and documents under
//! construction.
//!
//! Grounded on `original_source/data.go`'s `map_ResultData`/`map_Document`
//! concurrent maps. Mutation of a single document's entry is always made
//! under that document's named exclusive lock (see `lockers.rs`), so the
//! plain `tokio::sync::Mutex` guarding each map only needs to be held for the
//! duration of one lookup or insert.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::model::{Document, Page, ResultData};

#[derive(Default)]
pub struct Registries {
    resultdatas: Mutex<HashMap<String, ResultData>>,
    documents: Mutex<HashMap<String, Document>>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document's record once it has been validated.
    pub async fn insert_result_data(&self, data: ResultData) {
        self.resultdatas.lock().await.insert(data.identifier.clone(), data);
    }

    pub async fn get_result_data(&self, identifier: &str) -> Option<ResultData> {
        self.resultdatas.lock().await.get(identifier).cloned()
    }

    /// Fold `page` into the in-progress document for `record.identifier`,
    /// creating the document on first page. Returns the completed Document,
    /// removing it from the registry, once every page has arrived.
    ///
    /// Caller must hold the document's exclusive named lock: two concurrent
    /// callers for the same identifier would otherwise both observe an
    /// incomplete document and neither would emit it.
    pub async fn upsert_document_page(&self, record: &ResultData, page: Page) -> Option<Document> {
        let mut docs = self.documents.lock().await;
        let document = docs
            .entry(record.identifier.clone())
            .or_insert_with(|| Document::new(record.identifier.clone(), record.url.clone()));
        document.total_pages = record.total_pages;
        document.metadata = record.metadata.clone();
        document.pages.insert(page.page_number, page);

        if document.is_complete() {
            docs.remove(&record.identifier)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_record(identifier: &str, total_pages: u32) -> ResultData {
        ResultData {
            identifier: identifier.to_string(),
            url: None,
            data_dir: PathBuf::from("/db/abc"),
            pdf_path: PathBuf::from("/db/abc/source.pdf"),
            url_checksum: String::new(),
            pdf_checksum: String::new(),
            ocr_text_path: PathBuf::new(),
            extracted_text_path: PathBuf::new(),
            record_path: PathBuf::new(),
            total_pages,
            info: Default::default(),
            metadata: HashMap::new(),
        }
    }

    fn sample_page(document_identifier: &str, page_number: u32) -> Page {
        Page {
            identifier: format!("p{page_number}"),
            document_identifier: document_identifier.to_string(),
            page_number,
            metadata: HashMap::new(),
            ocr_text: String::new(),
        }
    }

    #[tokio::test]
    async fn document_emitted_only_once_every_page_has_arrived() {
        let registries = Registries::new();
        let record = sample_record("doc1", 2);

        let first = registries.upsert_document_page(&record, sample_page("doc1", 1)).await;
        assert!(first.is_none());

        let second = registries.upsert_document_page(&record, sample_page("doc1", 2)).await;
        let document = second.expect("document should complete on second page");
        assert_eq!(document.pages.len(), 2);
    }

    #[tokio::test]
    async fn result_data_lookup_round_trips() {
        let registries = Registries::new();
        registries.insert_result_data(sample_record("doc2", 1)).await;
        let found = registries.get_result_data("doc2").await;
        assert!(found.is_some());
        assert!(registries.get_result_data("missing").await.is_none());
    }
}
