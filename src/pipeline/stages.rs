//! Generic stage-runner dispatch loop: receive from one channel, spawn a
//! worker task per message, select against cancellation.
//!
//! Grounded on `original_source/receivers.go`, where every `receive*`
//! function is this same shape (`select!` over `ctx.Done()` and the channel,
//! `go <worker>(ctx, item)` per message) repeated eleven times.

use std::future::Future;

use tokio::sync::{mpsc, watch};

/// Drive `rx`, spawning `worker(item)` for every message until the channel
/// closes or cancellation fires.
pub async fn run_stage<T, F, Fut>(mut rx: mpsc::Receiver<T>, mut cancel: watch::Receiver<bool>, worker: F)
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let worker = std::sync::Arc::new(worker);
    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    return;
                }
            }
            item = rx.recv() => {
                match item {
                    Some(item) => {
                        let worker = worker.clone();
                        tokio::spawn(async move { worker(item).await });
                    }
                    None => return,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn processes_every_message_then_exits_on_close() {
        let (tx, rx) = mpsc::channel::<u32>(4);
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let handle = tokio::spawn(run_stage(rx, cancel_rx, move |_item: u32| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        for i in 0..5 {
            tx.send(i).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn stops_promptly_on_cancellation() {
        let (_tx, rx) = mpsc::channel::<u32>(4);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_stage(rx, cancel_rx, |_item: u32| async move {}));
        cancel_tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
