//! HTTPS PDF download with bounded, jittered retry.
//!
//! Grounded on `original_source/worker.go` (`downloadFile`, `tryDownloadFile`,
//! `cryptoRandInt`). Retries only on a network timeout; any other error is
//! terminal. Backoff is a uniformly random `[0, 2^attempt)` second sleep.

use std::path::Path;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

use crate::error::PipelineError;

const RETRY_ATTEMPTS: u32 = 33;
const MAX_BYTES: u64 = 369 * 1024 * 1024;

fn random_backoff_seconds(attempt: u32) -> u64 {
    let upper = 1u64 << attempt.min(62);
    if upper <= 1 {
        return 0;
    }
    (OsRng.next_u64()) % upper
}

/// Download `url` into `output`, retrying on timeout up to [`RETRY_ATTEMPTS`]
/// times with random backoff, honoring `cancel` between attempts.
pub async fn download_file(
    client: &reqwest::Client,
    gate: &Semaphore,
    url: &str,
    output: &Path,
    cancel: &mut tokio::sync::watch::Receiver<bool>,
) -> Result<(), PipelineError> {
    let mut last_error: Option<PipelineError> = None;

    for attempt in 0..RETRY_ATTEMPTS {
        match try_download_once(client, gate, url, output).await {
            Ok(()) => return Ok(()),
            Err(err) if is_timeout(&err) => {
                let wait = random_backoff_seconds(attempt);
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(wait)) => {},
                    _ = cancel.changed() => {
                        return Err(PipelineError::DownloadExhausted {
                            url: url.to_string(),
                            attempts: attempt + 1,
                            reason: "canceled".to_string(),
                        });
                    }
                }
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(PipelineError::DownloadExhausted {
        url: url.to_string(),
        attempts: RETRY_ATTEMPTS,
        reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

fn is_timeout(err: &PipelineError) -> bool {
    matches!(err, PipelineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::TimedOut)
}

async fn try_download_once(client: &reqwest::Client, gate: &Semaphore, url: &str, output: &Path) -> Result<(), PipelineError> {
    let _permit = gate.acquire().await.expect("gate semaphore never closed");

    let response = client.get(url).send().await.map_err(reqwest_to_pipeline_error)?;
    let body = response.bytes().await.map_err(reqwest_to_pipeline_error)?;

    if body.len() as u64 > MAX_BYTES {
        return Err(PipelineError::DownloadExhausted {
            url: url.to_string(),
            attempts: 1,
            reason: format!("exceeded {MAX_BYTES} byte cap"),
        });
    }

    let mut file = tokio::fs::File::create(output).await?;
    file.write_all(&body).await?;
    file.flush().await?;
    Ok(())
}

fn reqwest_to_pipeline_error(err: reqwest::Error) -> PipelineError {
    if err.is_timeout() {
        PipelineError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, err.to_string()))
    } else {
        PipelineError::Io(std::io::Error::other(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_zero_for_first_attempt() {
        assert_eq!(random_backoff_seconds(0), 0);
    }

    #[test]
    fn backoff_is_bounded_by_two_pow_attempt() {
        for _ in 0..200 {
            let wait = random_backoff_seconds(3);
            assert!(wait < 8);
        }
    }
}
