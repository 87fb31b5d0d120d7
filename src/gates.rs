//! Named counting semaphores, one per external tool or I/O-bound operation.
//!
//! Distinct from channel depth: channels are backpressure between stages,
//! gates are the actual parallelism cap on a given subprocess or operation.
//! A worker must acquire before `exec` and release after; cancellation while
//! waiting on `acquire` must not leak a permit.

use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::config::GateConfig;

/// One named semaphore per gate in the spec §4.4 table.
pub struct Gates {
    pub tesseract: Semaphore,
    pub pdftotext: Semaphore,
    pub pdftoppm: Semaphore,
    pub pdfcpu: Semaphore,
    pub gs: Semaphore,
    pub convert: Semaphore,
    pub download: Semaphore,
    pub png2jpg: Semaphore,
    pub resize: Semaphore,
    pub shafile: Semaphore,
    pub watermark: Semaphore,
    pub darkimage: Semaphore,
    pub filedata: Semaphore,
    pub shastring: Semaphore,
    pub wjsonfile: Semaphore,
}

impl Gates {
    pub fn new(config: &GateConfig) -> Arc<Self> {
        Arc::new(Self {
            tesseract: Semaphore::new(config.tesseract.max(1)),
            pdftotext: Semaphore::new(config.pdftotext.max(1)),
            pdftoppm: Semaphore::new(config.pdftoppm.max(1)),
            pdfcpu: Semaphore::new(config.pdfcpu.max(1)),
            gs: Semaphore::new(config.gs.max(1)),
            convert: Semaphore::new(config.convert.max(1)),
            download: Semaphore::new(config.download.max(1)),
            png2jpg: Semaphore::new(config.png2jpg.max(1)),
            resize: Semaphore::new(config.resize.max(1)),
            shafile: Semaphore::new(config.shafile.max(1)),
            watermark: Semaphore::new(config.watermark.max(1)),
            darkimage: Semaphore::new(config.darkimage.max(1)),
            filedata: Semaphore::new(config.filedata.max(1)),
            shastring: Semaphore::new(config.shastring.max(1)),
            wjsonfile: Semaphore::new(config.wjsonfile.max(1)),
        })
    }
}

/// Acquire a permit, observant of cancellation: if the cancellation signal
/// fires first, return `None` without holding a permit.
pub async fn acquire_cancelable<'a>(
    sem: &'a Semaphore,
    cancel: &mut tokio::sync::watch::Receiver<bool>,
) -> Option<SemaphorePermit<'a>> {
    tokio::select! {
        permit = sem.acquire() => permit.ok(),
        _ = cancel.changed() => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gate_sizes_match_config() {
        let gates = Gates::new(&GateConfig::default());
        assert_eq!(gates.tesseract.available_permits(), 1);
        assert_eq!(gates.download.available_permits(), 1);
        assert_eq!(gates.pdfcpu.available_permits(), 3);
        assert_eq!(gates.filedata.available_permits(), 369);
    }

    #[tokio::test]
    async fn acquire_cancelable_returns_none_on_cancellation() {
        let sem = Semaphore::new(0);
        let (tx, mut rx) = tokio::sync::watch::channel(false);
        let handle = tokio::spawn(async move { acquire_cancelable(&sem, &mut rx).await });
        tx.send(true).unwrap();
        // sem never has permits, so the only way this resolves is cancellation
        let result = handle.await.unwrap();
        assert!(result.is_none());
    }
}
