//! Page to document roll-up: the fan-in counterpart to the per-page
//! fan-out in `pipeline::workers`.
//!
//! Grounded on `original_source/receivers.go`'s `receiveCompletedPendingPage`
//! dispatch loop and `original_source/aggregator.go`'s `aggregatePendingPage`.
//! The retrieved `aggregatePendingPage` is itself a stub: it emits an empty,
//! pageless `Document` for every completed page with no bookkeeping at all.
//! The accumulate-until-every-page-has-arrived behavior below is this
//! implementation's completion of that function, not a direct port.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use tracing::{error, warn};

use crate::model::{Document, Page, PendingPage};
use crate::pipeline::stages::run_stage;
use crate::pipeline::PipelineContext;

const WRITE_RETRY_INTERVAL: Duration = Duration::from_millis(333);
const WRITE_TIMEOUT: Duration = Duration::from_secs(999);

/// Keep offering `document` to `tx` on a fixed tick, bounded by an overall
/// deadline. Protects against a stuck downstream reader without blocking the
/// aggregator forever.
async fn send_with_retry(tx: &mpsc::Sender<Document>, document: Document) {
    let identifier = document.identifier.clone();
    let outcome = timeout(WRITE_TIMEOUT, async {
        let mut ticker = interval(WRITE_RETRY_INTERVAL);
        loop {
            ticker.tick().await;
            match tx.try_send(document.clone()) {
                Ok(()) => return,
                Err(mpsc::error::TrySendError::Full(_)) => continue,
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
        }
    })
    .await;

    if outcome.is_err() {
        error!(identifier, "timed out writing compiled document downstream, abandoning");
    }
}

async fn worker_aggregate(ctx: PipelineContext, tx_next: mpsc::Sender<Document>, pp: PendingPage) {
    let Some(record) = ctx.registries.get_result_data(&pp.record_identifier).await else {
        warn!(
            page_identifier = %pp.identifier,
            record_identifier = %pp.record_identifier,
            "no record registered for completed page, dropping"
        );
        return;
    };

    let lock = ctx.lockers.document.get(&pp.record_identifier).await;
    let _guard = lock.write().await;

    let page = Page {
        identifier: pp.identifier.clone(),
        document_identifier: pp.record_identifier.clone(),
        page_number: pp.page_number,
        metadata: Default::default(),
        ocr_text: String::new(),
    };

    if let Some(document) = ctx.registries.upsert_document_page(&record, page).await {
        send_with_retry(&tx_next, document).await;
    }
}

/// Spawn the aggregator's dispatch loop, consuming `CompletedPage` messages
/// and producing onto the `CompiledDocument` channel.
pub fn spawn(ctx: PipelineContext, rx: mpsc::Receiver<PendingPage>, tx: mpsc::Sender<Document>) -> tokio::task::JoinHandle<()> {
    let cancel = ctx.cancel.clone();
    tokio::spawn(run_stage(rx, cancel, move |item| {
        let ctx = ctx.clone();
        let tx = tx.clone();
        async move { worker_aggregate(ctx, tx, item).await }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GateConfig, Settings};
    use crate::gates::Gates;
    use crate::ids::IdentifierMint;
    use crate::lockers::Lockers;
    use crate::registry::Registries;
    use crate::tools::ResolvedBinaries;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn test_context() -> PipelineContext {
        let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        PipelineContext {
            settings: Arc::new(Settings::default()),
            gates: Gates::new(&GateConfig::default()),
            lockers: Arc::new(Lockers::new()),
            registries: Arc::new(Registries::new()),
            binaries: Arc::new(ResolvedBinaries::default()),
            mint: IdentifierMint::new(),
            http_client: reqwest::Client::new(),
            cancel: cancel_rx,
        }
    }

    fn sample_record(identifier: &str, total_pages: u32) -> crate::model::ResultData {
        crate::model::ResultData {
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

    fn sample_page(record_identifier: &str, page_number: u32) -> PendingPage {
        PendingPage {
            identifier: format!("p{page_number}"),
            record_identifier: record_identifier.to_string(),
            page_number,
            pdf_path: PathBuf::new(),
            pages_dir: PathBuf::new(),
            ocr_text_path: PathBuf::new(),
            manifest_path: PathBuf::new(),
            images: Default::default(),
            language: String::new(),
            cryptonyms: Vec::new(),
            dates: Vec::new(),
        }
    }

    #[tokio::test]
    async fn document_is_emitted_once_all_pages_arrive() {
        let ctx = test_context();
        ctx.registries.insert_result_data(sample_record("doc1", 2)).await;

        let (tx, mut rx) = mpsc::channel(4);

        worker_aggregate(ctx.clone(), tx.clone(), sample_page("doc1", 1)).await;
        assert!(rx.try_recv().is_err());

        worker_aggregate(ctx.clone(), tx.clone(), sample_page("doc1", 2)).await;
        let document = rx.try_recv().expect("document should have been emitted");
        assert_eq!(document.identifier, "doc1");
        assert_eq!(document.pages.len(), 2);
    }

    #[tokio::test]
    async fn missing_record_is_dropped_without_panicking() {
        let ctx = test_context();
        let (tx, mut rx) = mpsc::channel(4);
        worker_aggregate(ctx, tx, sample_page("unknown", 1)).await;
        assert!(rx.try_recv().is_err());
    }
}
