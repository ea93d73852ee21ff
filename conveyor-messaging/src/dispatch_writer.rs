use std::sync::Arc;

use async_trait::async_trait;

use crate::delivery::Dispatch;
use crate::discovery::TypeDiscovery;
use crate::errors::WriterError;
use crate::writer::CommitWriter;

/// Outermost writer layer: resolves the destination for each dispatch via
/// type discovery before anything further down sees it. Resolution runs
/// once per dispatch and is never repeated by the retry layer underneath.
pub struct DispatchWriter {
    inner: Box<dyn CommitWriter>,
    discovery: Arc<dyn TypeDiscovery>,
}

impl DispatchWriter {
    pub fn new(inner: Box<dyn CommitWriter>, discovery: Arc<dyn TypeDiscovery>) -> Self {
        Self { inner, discovery }
    }
}

#[async_trait]
impl CommitWriter for DispatchWriter {
    async fn write(&mut self, mut dispatch: Dispatch) -> Result<(), WriterError> {
        let destination = {
            let message = dispatch
                .message
                .as_ref()
                .ok_or_else(|| WriterError::Write("dispatch carries no message".to_string()))?;
            self.discovery.discover(message)?
        };

        dispatch.destination = destination.topic;
        dispatch.message_type = destination.message_type;
        self.inner.write(dispatch).await
    }

    async fn commit(&mut self) -> Result<(), WriterError> {
        self.inner.commit().await
    }

    async fn close(&mut self) {
        self.inner.close().await;
    }
}
