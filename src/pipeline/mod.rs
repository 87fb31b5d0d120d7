//! The twelve-stage channel pipeline: bounded mpsc per stage, one dispatcher
//! per stage that spawns a worker task per received message.
//!
//! Grounded on `original_source/data.go` (the `ch_*` channel declarations)
//! and `original_source/receivers.go` (the near-identical `receive*`
//! dispatch loops, each `select!`-ing against context cancellation and
//! spawning its stage's worker function per message).

pub mod stages;
pub mod workers;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::config::Settings;
use crate::gates::Gates;
use crate::ids::IdentifierMint;
use crate::lockers::Lockers;
use crate::model::{PendingPage, ResultData};
use crate::registry::Registries;
use crate::tools::ResolvedBinaries;

/// Shared, cheaply-cloned state every stage worker needs.
#[derive(Clone)]
pub struct PipelineContext {
    pub settings: Arc<Settings>,
    pub gates: Arc<Gates>,
    pub lockers: Arc<Lockers>,
    pub registries: Arc<Registries>,
    pub binaries: Arc<ResolvedBinaries>,
    pub mint: IdentifierMint,
    pub http_client: reqwest::Client,
    pub cancel: watch::Receiver<bool>,
}

/// One bounded mpsc channel per stage, matching `ch_ImportedRow` through
/// `ch_CompiledDocument`. `ch_GenerateSocial`, `ch_CompileDarkPDF`, and
/// `ch_CompileSocialCard` are not modeled: they are reserved/unimplemented in
/// the source this was grounded on and have no counterpart here.
pub struct Channels {
    pub imported_row: (mpsc::Sender<ResultData>, mpsc::Receiver<ResultData>),
    pub extract_text: (mpsc::Sender<ResultData>, mpsc::Receiver<ResultData>),
    pub extract_pages: (mpsc::Sender<ResultData>, mpsc::Receiver<ResultData>),
    pub generate_png: (mpsc::Sender<PendingPage>, mpsc::Receiver<PendingPage>),
    pub generate_light: (mpsc::Sender<PendingPage>, mpsc::Receiver<PendingPage>),
    pub generate_dark: (mpsc::Sender<PendingPage>, mpsc::Receiver<PendingPage>),
    pub perform_ocr: (mpsc::Sender<PendingPage>, mpsc::Receiver<PendingPage>),
    pub convert_to_jpg: (mpsc::Sender<PendingPage>, mpsc::Receiver<PendingPage>),
    pub analyze_text: (mpsc::Sender<PendingPage>, mpsc::Receiver<PendingPage>),
    pub analyze_cryptonyms: (mpsc::Sender<PendingPage>, mpsc::Receiver<PendingPage>),
    pub completed_page: (mpsc::Sender<PendingPage>, mpsc::Receiver<PendingPage>),
    pub compiled_document: (mpsc::Sender<crate::model::Document>, mpsc::Receiver<crate::model::Document>),
}

/// Build every stage channel with the configured buffer depth.
pub fn build_channels(buffer: usize) -> Channels {
    let buffer = buffer.max(1);
    Channels {
        imported_row: mpsc::channel(buffer),
        extract_text: mpsc::channel(buffer),
        extract_pages: mpsc::channel(buffer),
        generate_png: mpsc::channel(buffer),
        generate_light: mpsc::channel(buffer),
        generate_dark: mpsc::channel(buffer),
        perform_ocr: mpsc::channel(buffer),
        convert_to_jpg: mpsc::channel(buffer),
        analyze_text: mpsc::channel(buffer),
        analyze_cryptonyms: mpsc::channel(buffer),
        completed_page: mpsc::channel(buffer),
        compiled_document: mpsc::channel(buffer),
    }
}
