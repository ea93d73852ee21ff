use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::delivery::{Delivery, Receipt};
use crate::errors::BrokerError;
use crate::writer::CommitWriter;

/// Handle returned when a reader is opened against a broker.
///
/// Deliveries arrive on a bounded channel; acknowledged receipts flow back
/// on a channel of the same capacity. Dropping the receiver closes the
/// subscription.
#[derive(Debug)]
pub struct BrokerReader {
    pub deliveries: mpsc::Receiver<Delivery>,
    pub acknowledgements: mpsc::Sender<Receipt>,
    pub capacity: usize,
}

/// Boundary trait over the actual broker connection and queue-binding
/// mechanics. The pipeline core only ever sees channels and the
/// transactional writer capability.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Open a durable reader on a named source queue, binding it to the
    /// given topics.
    async fn open_reader(
        &self,
        source_queue: &str,
        bindings: &[String],
    ) -> Result<BrokerReader, BrokerError>;

    /// Open an exclusive, broker-named reader bound to the given topics.
    async fn open_transient_reader(&self, bindings: &[String])
        -> Result<BrokerReader, BrokerError>;

    /// Open the transactional sink the writer stack is layered over.
    async fn open_transactional_writer(&self) -> Result<Box<dyn CommitWriter>, BrokerError>;
}
