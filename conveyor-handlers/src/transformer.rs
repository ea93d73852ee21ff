use conveyor_messaging::Delivery;
use log::debug;
use tokio::sync::mpsc;

/// One stage of the transformation chain. Returning `None` drops the
/// delivery and short-circuits the remaining stages.
pub trait Transformer: Send {
    fn transform(&mut self, delivery: Delivery) -> Option<Delivery>;
}

/// Single-worker pump that applies the transformation chain between two
/// bounded queues of equal capacity. A full output queue blocks the worker,
/// which in turn leaves deliveries pending at the input; closure of the
/// input propagates to the output by dropping the sender.
pub struct TransformationHandler {
    input: mpsc::Receiver<Delivery>,
    output: mpsc::Sender<Delivery>,
    transformers: Vec<Box<dyn Transformer>>,
}

impl TransformationHandler {
    pub fn new(
        input: mpsc::Receiver<Delivery>,
        output: mpsc::Sender<Delivery>,
        transformers: Vec<Box<dyn Transformer>>,
    ) -> Self {
        Self {
            input,
            output,
            transformers,
        }
    }

    /// Consume the input queue until it closes.
    pub async fn listen(mut self) {
        while let Some(delivery) = self.input.recv().await {
            let mut current = Some(delivery);
            for stage in &mut self.transformers {
                match current.take() {
                    Some(delivery) => current = stage.transform(delivery),
                    None => break,
                }
            }

            if let Some(delivery) = current {
                if self.output.send(delivery).await.is_err() {
                    debug!("transformation output closed; stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_messaging::Receipt;

    struct Tag(&'static str);

    impl Transformer for Tag {
        fn transform(&mut self, mut delivery: Delivery) -> Option<Delivery> {
            delivery.message_type.push_str(self.0);
            Some(delivery)
        }
    }

    struct DropWhen(&'static str);

    impl Transformer for DropWhen {
        fn transform(&mut self, delivery: Delivery) -> Option<Delivery> {
            if delivery.message_type.contains(self.0) {
                None
            } else {
                Some(delivery)
            }
        }
    }

    fn delivery(message_type: &str, receipt: &str) -> Delivery {
        Delivery::new(message_type, Vec::new(), Receipt::new(receipt))
    }

    #[tokio::test]
    async fn stages_run_in_registration_order() {
        let (input_tx, input_rx) = mpsc::channel(4);
        let (output_tx, mut output_rx) = mpsc::channel(4);
        let handler = TransformationHandler::new(
            input_rx,
            output_tx,
            vec![Box::new(Tag(".a")), Box::new(Tag(".b"))],
        );

        input_tx.send(delivery("event", "r1")).await.unwrap();
        drop(input_tx);
        handler.listen().await;

        let transformed = output_rx.recv().await.unwrap();
        assert_eq!(transformed.message_type, "event.a.b");
        assert!(output_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropped_delivery_short_circuits_later_stages() {
        let (input_tx, input_rx) = mpsc::channel(4);
        let (output_tx, mut output_rx) = mpsc::channel(4);
        let handler = TransformationHandler::new(
            input_rx,
            output_tx,
            vec![Box::new(DropWhen("skip")), Box::new(Tag(".seen"))],
        );

        input_tx.send(delivery("skip-me", "r1")).await.unwrap();
        input_tx.send(delivery("keep-me", "r2")).await.unwrap();
        drop(input_tx);
        handler.listen().await;

        let survivor = output_rx.recv().await.unwrap();
        assert_eq!(survivor.message_type, "keep-me.seen");
        assert_eq!(survivor.receipt, Receipt::new("r2"));
        assert!(output_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn output_closes_after_input_closes() {
        let (input_tx, input_rx) = mpsc::channel(1);
        let (output_tx, mut output_rx) = mpsc::channel(1);
        let handler = TransformationHandler::new(input_rx, output_tx, Vec::new());

        drop(input_tx);
        handler.listen().await;

        assert!(output_rx.recv().await.is_none());
    }
}
