use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use crate::delivery::Dispatch;
use crate::errors::WriterError;
use crate::writer::CommitWriter;

/// What to do between failed attempts.
///
/// `Callback` receives the 1-based ordinal of the attempt that just failed;
/// it exists for deterministic tests and caller-supplied backoff.
pub enum RetryPause {
    Sleep(Duration),
    Callback(Box<dyn Fn(u64) + Send + Sync>),
}

impl RetryPause {
    async fn wait(&self, attempt: u64) {
        match self {
            RetryPause::Sleep(duration) => tokio::time::sleep(*duration).await,
            RetryPause::Callback(callback) => callback(attempt),
        }
    }
}

/// Innermost decorator: retries `write` and `commit` against the
/// transactional sink.
///
/// Destination resolution and serialization have already happened by the
/// time a dispatch arrives here, so only the transactional I/O is repeated.
/// After `max_retries` additional attempts the last error surfaces
/// unchanged.
pub struct RetryWriter {
    inner: Box<dyn CommitWriter>,
    max_retries: u64,
    pause: RetryPause,
}

impl RetryWriter {
    pub fn new(inner: Box<dyn CommitWriter>, max_retries: u64, pause: RetryPause) -> Self {
        Self {
            inner,
            max_retries,
            pause,
        }
    }
}

#[async_trait]
impl CommitWriter for RetryWriter {
    async fn write(&mut self, mut dispatch: Dispatch) -> Result<(), WriterError> {
        // The serialization layer has already consumed the typed message;
        // drop any leftover so every attempt forwards the same record.
        dispatch.message = None;
        for attempt in 1..=self.max_retries {
            match self.inner.write(dispatch.to_wire()).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!("write attempt {attempt} failed: {err}");
                    self.pause.wait(attempt).await;
                }
            }
        }
        self.inner.write(dispatch).await
    }

    async fn commit(&mut self) -> Result<(), WriterError> {
        for attempt in 1..=self.max_retries {
            match self.inner.commit().await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!("commit attempt {attempt} failed: {err}");
                    self.pause.wait(attempt).await;
                }
            }
        }
        self.inner.commit().await
    }

    async fn close(&mut self) {
        self.inner.close().await;
    }
}
