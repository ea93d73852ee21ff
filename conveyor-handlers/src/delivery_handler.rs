use conveyor_messaging::{
    ApplicationResult, CommitWriter, Delivery, Dispatch, Message, Receipt, WriterError,
};
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::application::Application;

/// The batching engine: consumes transformed deliveries, invokes business
/// logic, writes results through the commit-writer stack, commits at batch
/// boundaries, and forwards the last receipt of each batch.
///
/// A batch is everything buffered since the previous flush, detected by a
/// non-blocking receive coming up empty. The input has exactly one producer
/// (the transformation worker), so the boundary is deterministic for a
/// quiesced source.
///
/// Writer errors propagate out of [`listen`](Self::listen) unhandled; retry
/// belongs to the writer stack, and a failing commit terminates the run.
pub struct DeliveryHandler {
    input: mpsc::Receiver<Delivery>,
    output: mpsc::Sender<Receipt>,
    writer: Box<dyn CommitWriter>,
    application: Box<dyn Application>,
}

impl DeliveryHandler {
    pub fn new(
        input: mpsc::Receiver<Delivery>,
        output: mpsc::Sender<Receipt>,
        writer: Box<dyn CommitWriter>,
        application: Box<dyn Application>,
    ) -> Self {
        Self {
            input,
            output,
            writer,
            application,
        }
    }

    /// Run until the input queue closes and drains. The output queue closes
    /// when the handler returns.
    pub async fn listen(mut self) -> Result<(), WriterError> {
        let mut pending: Option<Receipt> = None;

        loop {
            match self.input.try_recv() {
                Ok(delivery) => self.process(delivery, &mut pending).await?,
                Err(TryRecvError::Empty) => {
                    self.flush(&mut pending).await?;
                    match self.input.recv().await {
                        Some(delivery) => self.process(delivery, &mut pending).await?,
                        None => break,
                    }
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }

        self.flush(&mut pending).await
    }

    async fn process(
        &mut self,
        delivery: Delivery,
        pending: &mut Option<Receipt>,
    ) -> Result<(), WriterError> {
        let Delivery {
            message_type,
            payload,
            message,
            receipt,
        } = delivery;

        // Undecoded deliveries carry their raw bytes through as the message.
        let message = message.unwrap_or_else(|| Message::new(message_type, payload));

        match self.application.handle(message).await {
            ApplicationResult::Absent => {}
            ApplicationResult::Single(message) => {
                self.writer.write(Dispatch::from_message(message)).await?;
            }
            ApplicationResult::Many(messages) => {
                for message in messages {
                    self.writer.write(Dispatch::from_message(message)).await?;
                }
            }
        }

        *pending = Some(receipt);
        Ok(())
    }

    async fn flush(&mut self, pending: &mut Option<Receipt>) -> Result<(), WriterError> {
        let Some(receipt) = pending.take() else {
            return Ok(());
        };

        debug!("batch boundary reached; committing");
        self.writer.commit().await?;
        if self.output.send(receipt).await.is_err() {
            warn!("acknowledgement queue closed; receipt discarded");
        }
        Ok(())
    }
}
