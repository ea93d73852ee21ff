use async_trait::async_trait;
use log::error;

use crate::delivery::Dispatch;
use crate::errors::WriterError;
use crate::serializer::Serializer;
use crate::writer::CommitWriter;

/// Middle writer layer: encodes the typed payload to wire bytes.
///
/// Sits between the dispatch layer (which has already resolved the
/// destination) and the retry layer, so serialization happens exactly once
/// per dispatch regardless of how many write attempts follow.
pub struct SerializationWriter {
    inner: Box<dyn CommitWriter>,
    serializer: Box<dyn Serializer>,
    abort_on_failure: bool,
}

impl SerializationWriter {
    pub fn new(inner: Box<dyn CommitWriter>, serializer: Box<dyn Serializer>) -> Self {
        Self {
            inner,
            serializer,
            abort_on_failure: false,
        }
    }

    /// Treat serialization failures as fatal instead of surfacing an error.
    pub fn abort_when_serialization_fails(mut self) -> Self {
        self.abort_on_failure = true;
        self
    }
}

#[async_trait]
impl CommitWriter for SerializationWriter {
    async fn write(&mut self, mut dispatch: Dispatch) -> Result<(), WriterError> {
        let message = dispatch
            .message
            .take()
            .ok_or_else(|| WriterError::Write("dispatch carries no message".to_string()))?;

        match self.serializer.serialize(message.payload()) {
            Ok(payload) => dispatch.payload = payload,
            Err(source) => {
                let type_name = message.type_name().to_string();
                if self.abort_on_failure {
                    error!("fatal: serialization failed for '{type_name}': {source}");
                    panic!("serialization failed for message type '{type_name}': {source}");
                }
                return Err(WriterError::Serialization { type_name, source });
            }
        }

        self.inner.write(dispatch).await
    }

    async fn commit(&mut self) -> Result<(), WriterError> {
        self.inner.commit().await
    }

    async fn close(&mut self) {
        self.inner.close().await;
    }
}
