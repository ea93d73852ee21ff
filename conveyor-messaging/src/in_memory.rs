//! In-memory broker for development and tests. Deliveries move through
//! bounded channels with the same backpressure the real broker applies;
//! writes, commits, and acknowledged receipts are recorded for inspection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::broker::{BrokerReader, MessageBroker};
use crate::delivery::{Delivery, Dispatch, Receipt};
use crate::errors::{BrokerError, WriterError};
use crate::message::Message;
use crate::writer::CommitWriter;

/// One dispatch as the transactional sink saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub destination: String,
    pub message_type: String,
    pub payload: Vec<u8>,
}

struct QueueChannel {
    sender: mpsc::Sender<Delivery>,
    receiver: Option<mpsc::Receiver<Delivery>>,
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, QueueChannel>,
    acknowledged: Vec<Receipt>,
    written: Vec<WriteRecord>,
    commits: usize,
}

#[derive(Clone)]
pub struct InMemoryBroker {
    capacity: usize,
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Arc::new(Mutex::new(BrokerState::default())),
        }
    }

    /// Publish a raw delivery to a queue, creating the queue on first use.
    pub async fn publish(&self, queue: &str, delivery: Delivery) -> Result<(), BrokerError> {
        let sender = {
            let mut guard = self.state.lock();
            self.ensure_queue(&mut guard, queue).sender.clone()
        };
        sender
            .send(delivery)
            .await
            .map_err(|_| BrokerError::Internal(format!("queue '{queue}' is closed")))
    }

    /// Publish a typed message with a freshly minted receipt.
    pub async fn publish_message(
        &self,
        queue: &str,
        message: Message,
    ) -> Result<Receipt, BrokerError> {
        let receipt = Receipt::generate();
        self.publish(queue, Delivery::from_message(message, receipt.clone()))
            .await?;
        Ok(receipt)
    }

    pub fn acknowledged(&self) -> Vec<Receipt> {
        self.state.lock().acknowledged.clone()
    }

    pub fn written(&self) -> Vec<WriteRecord> {
        self.state.lock().written.clone()
    }

    pub fn commits(&self) -> usize {
        self.state.lock().commits
    }

    fn ensure_queue<'a>(
        &self,
        state: &'a mut BrokerState,
        queue: &str,
    ) -> &'a mut QueueChannel {
        let capacity = self.capacity;
        state
            .queues
            .entry(queue.to_string())
            .or_insert_with(|| {
                let (sender, receiver) = mpsc::channel(capacity);
                QueueChannel {
                    sender,
                    receiver: Some(receiver),
                }
            })
    }

    fn open(&self, queue: &str, bindings: &[String]) -> Result<BrokerReader, BrokerError> {
        let mut guard = self.state.lock();
        let channel = self.ensure_queue(&mut guard, queue);
        let sender = channel.sender.clone();
        let deliveries = channel
            .receiver
            .take()
            .ok_or_else(|| BrokerError::ReaderTaken(queue.to_string()))?;

        // Bindings alias additional publish keys onto the same queue.
        for binding in bindings {
            guard
                .queues
                .entry(binding.clone())
                .or_insert_with(|| QueueChannel {
                    sender: sender.clone(),
                    receiver: None,
                });
        }
        drop(guard);

        let (ack_sender, mut ack_receiver) = mpsc::channel::<Receipt>(self.capacity);
        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(receipt) = ack_receiver.recv().await {
                state.lock().acknowledged.push(receipt);
            }
        });

        Ok(BrokerReader {
            deliveries,
            acknowledgements: ack_sender,
            capacity: self.capacity,
        })
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn open_reader(
        &self,
        source_queue: &str,
        bindings: &[String],
    ) -> Result<BrokerReader, BrokerError> {
        self.open(source_queue, bindings)
    }

    async fn open_transient_reader(
        &self,
        bindings: &[String],
    ) -> Result<BrokerReader, BrokerError> {
        let queue = format!("transient-{}", Uuid::new_v4());
        self.open(&queue, bindings)
    }

    async fn open_transactional_writer(&self) -> Result<Box<dyn CommitWriter>, BrokerError> {
        Ok(Box::new(InMemoryWriter {
            state: self.state.clone(),
            closed: false,
        }))
    }
}

struct InMemoryWriter {
    state: Arc<Mutex<BrokerState>>,
    closed: bool,
}

#[async_trait]
impl CommitWriter for InMemoryWriter {
    async fn write(&mut self, dispatch: Dispatch) -> Result<(), WriterError> {
        if self.closed {
            return Err(WriterError::Closed);
        }
        self.state.lock().written.push(WriteRecord {
            destination: dispatch.destination,
            message_type: dispatch.message_type,
            payload: dispatch.payload,
        });
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), WriterError> {
        if self.closed {
            return Err(WriterError::Closed);
        }
        self.state.lock().commits += 1;
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_open_reader() {
        let broker = InMemoryBroker::new(8);
        let mut reader = broker.open_reader("projector", &[]).await.unwrap();

        broker
            .publish_message("projector", Message::new("orders.placed", 5u32))
            .await
            .unwrap();

        let delivery = reader.deliveries.recv().await.unwrap();
        assert_eq!(delivery.message_type, "orders.placed");
    }

    #[tokio::test]
    async fn second_reader_on_same_queue_is_rejected() {
        let broker = InMemoryBroker::new(8);
        broker.open_reader("projector", &[]).await.unwrap();

        let err = broker.open_reader("projector", &[]).await.unwrap_err();
        assert!(matches!(err, BrokerError::ReaderTaken(_)));
    }

    #[tokio::test]
    async fn bindings_route_to_the_same_reader() {
        let broker = InMemoryBroker::new(8);
        let bindings = vec!["orders".to_string()];
        let mut reader = broker.open_reader("projector", &bindings).await.unwrap();

        broker
            .publish_message("orders", Message::new("orders.placed", 1u32))
            .await
            .unwrap();

        let delivery = reader.deliveries.recv().await.unwrap();
        assert_eq!(delivery.message_type, "orders.placed");
    }

    #[tokio::test]
    async fn acknowledged_receipts_are_recorded() {
        let broker = InMemoryBroker::new(8);
        let reader = broker.open_reader("projector", &[]).await.unwrap();

        reader
            .acknowledgements
            .send(Receipt::new("receipt-1"))
            .await
            .unwrap();
        // Give the collector task a chance to drain the channel.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(broker.acknowledged(), vec![Receipt::new("receipt-1")]);
    }

    #[tokio::test]
    async fn closed_writer_rejects_operations() {
        let broker = InMemoryBroker::new(8);
        let mut writer = broker.open_transactional_writer().await.unwrap();

        writer.close().await;
        assert!(matches!(
            writer.write(Dispatch::default()).await,
            Err(WriterError::Closed)
        ));
        assert!(matches!(writer.commit().await, Err(WriterError::Closed)));
    }
}
