//! Process lifecycle: admit ingestion sources, drive the pipeline to
//! completion, and shut it down cleanly on SIGINT/SIGTERM.
//!
//! Grounded on spec §5/§9 directly: the retrieved source has no equivalent
//! graceful-shutdown controller to imitate (see DESIGN.md Open Questions), so
//! this follows the teacher's channel/cancellation-token idiom
//! (`watch::Receiver<bool>` checked by every long-lived task) applied to the
//! shutdown sequence the spec describes.

use std::path::PathBuf;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::aggregator;
use crate::ingest::SeedRecord;
use crate::model::Document;
use crate::pipeline::workers::PipelineHandles;
use crate::pipeline::PipelineContext;

/// Summary returned once every admitted document has either completed or the
/// run was canceled.
pub struct RunOutcome {
    pub documents_admitted: usize,
    pub documents_completed: usize,
    pub canceled: bool,
}

/// Spawn a task that flips `cancel_tx` to `true` on SIGINT or SIGTERM.
fn spawn_signal_watcher(cancel_tx: watch::Sender<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(err) => {
                    error!(%err, "failed to install SIGTERM handler");
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => info!("received SIGINT, shutting down"),
                _ = terminate.recv() => info!("received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            if ctrl_c.await.is_err() {
                return;
            }
            info!("received Ctrl-C, shutting down");
        }

        let _ = cancel_tx.send(true);
    })
}

/// Feed `seeds` into the pipeline, counting how many were actually admitted
/// (a seed whose download/copy fails never enters the count or the
/// pipeline). Closes `imported_row_tx` once every seed has been attempted,
/// which drains the whole downstream chain in forward order once in-flight
/// work finishes.
async fn admit_all(ctx: &PipelineContext, database_directory: &PathBuf, seeds: Vec<SeedRecord>, imported_row_tx: mpsc::Sender<crate::model::ResultData>) -> usize {
    let mut admitted = 0usize;
    for seed in seeds {
        if *ctx.cancel.borrow() {
            break;
        }
        match crate::ingest::admit(ctx, database_directory, seed).await {
            Ok(record) => {
                admitted += 1;
                if imported_row_tx.send(record).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(%err, "failed to admit ingestion source, skipping");
            }
        }
    }
    admitted
}

/// Run the full pipeline to completion: spawn the aggregator, admit every
/// seed record, then drive the CompiledDocument stream until either the
/// admitted count is reached or cancellation fires.
pub async fn run(ctx: PipelineContext, handles: PipelineHandles, database_directory: PathBuf, seeds: Vec<SeedRecord>, cancel_tx: watch::Sender<bool>) -> RunOutcome {
    let signal_handle = spawn_signal_watcher(cancel_tx);

    let PipelineHandles {
        stage_handles,
        imported_row_tx,
        completed_page_rx,
        compiled_document_tx,
        mut compiled_document_rx,
    } = handles;

    let aggregator_handle = aggregator::spawn(ctx.clone(), completed_page_rx, compiled_document_tx);

    let admitted = admit_all(&ctx, &database_directory, seeds, imported_row_tx).await;
    info!(admitted, "finished admitting ingestion sources");

    let mut completed = 0usize;
    let mut canceled = false;
    let mut cancel = ctx.cancel.clone();

    while completed < admitted {
        tokio::select! {
            biased;
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    canceled = true;
                    break;
                }
            }
            document = compiled_document_rx.recv() => {
                match document {
                    Some(document) => {
                        completed += 1;
                        log_completed_document(&document, completed, admitted);
                    }
                    None => break,
                }
            }
        }
    }

    drop(compiled_document_rx);
    for handle in stage_handles {
        let _ = handle.await;
    }
    let _ = aggregator_handle.await;
    signal_handle.abort();

    RunOutcome {
        documents_admitted: admitted,
        documents_completed: completed,
        canceled,
    }
}

fn log_completed_document(document: &Document, completed: usize, total: usize) {
    info!(identifier = %document.identifier, pages = document.pages.len(), completed, total, "document compiled");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GateConfig, Settings};
    use crate::gates::Gates;
    use crate::ids::IdentifierMint;
    use crate::lockers::Lockers;
    use crate::pipeline::{build_channels, workers};
    use crate::registry::Registries;
    use crate::tools::ResolvedBinaries;
    use std::sync::Arc;

    fn test_context(cancel_rx: watch::Receiver<bool>) -> PipelineContext {
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

    #[tokio::test]
    async fn run_completes_with_zero_admitted_sources() {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let ctx = test_context(cancel_rx);
        let channels = build_channels(4);
        let handles = workers::spawn_all(ctx.clone(), channels);
        let dir = tempfile::tempdir().unwrap();

        let outcome = run(ctx, handles, dir.path().to_path_buf(), Vec::new(), cancel_tx).await;

        assert_eq!(outcome.documents_admitted, 0);
        assert_eq!(outcome.documents_completed, 0);
        assert!(!outcome.canceled);
    }
}
