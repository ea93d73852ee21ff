use async_trait::async_trait;

use crate::delivery::Dispatch;
use crate::errors::WriterError;

/// Transactional sink capability shared by every layer of the writer stack.
///
/// A pipeline owns exactly one writer stack and drives it from a single
/// worker, so implementations take `&mut self` and need no internal locking.
#[async_trait]
pub trait CommitWriter: Send {
    /// Stage one outbound dispatch.
    async fn write(&mut self, dispatch: Dispatch) -> Result<(), WriterError>;

    /// Finalize all writes issued since the previous commit.
    async fn commit(&mut self) -> Result<(), WriterError>;

    /// Release the underlying resources. Further calls fail with
    /// [`WriterError::Closed`].
    async fn close(&mut self);
}
