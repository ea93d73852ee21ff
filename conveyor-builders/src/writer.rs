use std::sync::Arc;
use std::time::Duration;

use conveyor_messaging::{
    BrokerError, CommitWriter, DispatchWriter, JsonSerializer, MessageBroker, RetryPause,
    RetryWriter, SerializationWriter, TypeDiscovery,
};

/// Configures the outbound half of a pipeline: the commit-writer stack in
/// its fixed order, outermost first: Dispatch, Serialize, Retry, then the
/// broker's transactional sink. Only the transactional I/O beneath the
/// retry layer is repeated on failure.
pub struct CompositeWriterBuilder {
    broker: Arc<dyn MessageBroker>,
    discovery: Arc<dyn TypeDiscovery>,
    retry_sleep: Duration,
    retry_callback: Option<Box<dyn Fn(u64) + Send + Sync>>,
    max_retries: u64,
    abort_on_serialization_failure: bool,
}

impl CompositeWriterBuilder {
    pub fn new(broker: Arc<dyn MessageBroker>, discovery: Arc<dyn TypeDiscovery>) -> Self {
        Self {
            broker,
            discovery,
            retry_sleep: Duration::from_secs(5),
            retry_callback: None,
            max_retries: 0,
            abort_on_serialization_failure: false,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u64) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_after_sleep(mut self, sleep: Duration) -> Self {
        self.retry_sleep = sleep;
        self
    }

    /// Pause via a callback instead of sleeping; takes precedence over
    /// [`retry_after_sleep`](Self::retry_after_sleep) when both are set.
    pub fn retry_after_callback(mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.retry_callback = Some(Box::new(callback));
        self
    }

    pub fn abort_when_serialization_fails(mut self) -> Self {
        self.abort_on_serialization_failure = true;
        self
    }

    pub async fn build(self) -> Result<Box<dyn CommitWriter>, BrokerError> {
        let Self {
            broker,
            discovery,
            retry_sleep,
            retry_callback,
            max_retries,
            abort_on_serialization_failure,
        } = self;

        let writer = broker.open_transactional_writer().await?;
        let writer = Self::layer_retry(writer, max_retries, retry_sleep, retry_callback);
        let writer = Self::layer_serialize(writer, abort_on_serialization_failure);
        let writer = Self::layer_dispatch(writer, discovery);
        Ok(writer)
    }

    fn layer_retry(
        inner: Box<dyn CommitWriter>,
        max_retries: u64,
        retry_sleep: Duration,
        retry_callback: Option<Box<dyn Fn(u64) + Send + Sync>>,
    ) -> Box<dyn CommitWriter> {
        if let Some(callback) = retry_callback {
            return Box::new(RetryWriter::new(
                inner,
                max_retries,
                RetryPause::Callback(callback),
            ));
        }

        if retry_sleep.is_zero() {
            return inner;
        }

        Box::new(RetryWriter::new(
            inner,
            max_retries,
            RetryPause::Sleep(retry_sleep),
        ))
    }

    fn layer_serialize(inner: Box<dyn CommitWriter>, abort_on_failure: bool) -> Box<dyn CommitWriter> {
        let mut writer = SerializationWriter::new(inner, Box::new(JsonSerializer::new()));
        if abort_on_failure {
            writer = writer.abort_when_serialization_fails();
        }
        Box::new(writer)
    }

    fn layer_dispatch(
        inner: Box<dyn CommitWriter>,
        discovery: Arc<dyn TypeDiscovery>,
    ) -> Box<dyn CommitWriter> {
        Box::new(DispatchWriter::new(inner, discovery))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conveyor_messaging::in_memory::WriteRecord;
    use conveyor_messaging::{
        BrokerReader, Dispatch, InMemoryBroker, Message, StaticDiscovery, WriterError,
    };
    use parking_lot::Mutex;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct OrderPlaced {
        order_id: u64,
    }

    /// Outbound-only broker whose sink refuses the first `failures` writes.
    struct FlakyBroker {
        failures: u64,
    }

    #[async_trait]
    impl MessageBroker for FlakyBroker {
        async fn open_reader(
            &self,
            _source_queue: &str,
            _bindings: &[String],
        ) -> Result<BrokerReader, BrokerError> {
            Err(BrokerError::Internal("outbound only".to_string()))
        }

        async fn open_transient_reader(
            &self,
            _bindings: &[String],
        ) -> Result<BrokerReader, BrokerError> {
            Err(BrokerError::Internal("outbound only".to_string()))
        }

        async fn open_transactional_writer(&self) -> Result<Box<dyn CommitWriter>, BrokerError> {
            Ok(Box::new(FlakySink {
                failures: self.failures,
                calls: 0,
            }))
        }
    }

    struct FlakySink {
        failures: u64,
        calls: u64,
    }

    #[async_trait]
    impl CommitWriter for FlakySink {
        async fn write(&mut self, _dispatch: Dispatch) -> Result<(), WriterError> {
            self.calls += 1;
            if self.calls <= self.failures {
                Err(WriterError::Write(format!("attempt {} refused", self.calls)))
            } else {
                Ok(())
            }
        }

        async fn commit(&mut self) -> Result<(), WriterError> {
            Ok(())
        }

        async fn close(&mut self) {}
    }

    #[tokio::test]
    async fn stack_resolves_serializes_and_commits() {
        let broker = Arc::new(InMemoryBroker::new(8));
        let discovery = Arc::new(StaticDiscovery::new().route("orders.placed", "orders"));

        let mut writer = CompositeWriterBuilder::new(broker.clone(), discovery)
            .with_max_retries(3)
            .retry_after_callback(|_| {})
            .build()
            .await
            .unwrap();

        writer
            .write(Dispatch::from_message(Message::new(
                "orders.placed",
                OrderPlaced { order_id: 21 },
            )))
            .await
            .unwrap();
        writer.commit().await.unwrap();

        assert_eq!(
            broker.written(),
            vec![WriteRecord {
                destination: "orders".to_string(),
                message_type: "orders.placed".to_string(),
                payload: br#"{"order_id":21}"#.to_vec(),
            }]
        );
        assert_eq!(broker.commits(), 1);
    }

    #[tokio::test]
    async fn callback_wins_when_sleep_is_also_configured() {
        let broker = Arc::new(FlakyBroker { failures: 2 });
        let discovery = Arc::new(StaticDiscovery::new().route("orders.placed", "orders"));
        let ordinals = Arc::new(Mutex::new(Vec::new()));
        let recorded = ordinals.clone();

        // An hour-long sleep would stall the run; completing at all proves
        // the callback pauses instead.
        let mut writer = CompositeWriterBuilder::new(broker, discovery)
            .with_max_retries(3)
            .retry_after_sleep(Duration::from_secs(3600))
            .retry_after_callback(move |attempt| recorded.lock().push(attempt))
            .build()
            .await
            .unwrap();

        writer
            .write(Dispatch::from_message(Message::new(
                "orders.placed",
                OrderPlaced { order_id: 3 },
            )))
            .await
            .unwrap();

        assert_eq!(*ordinals.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn zero_sleep_without_callback_skips_the_retry_layer() {
        let broker = Arc::new(InMemoryBroker::new(8));
        let discovery = Arc::new(StaticDiscovery::new().route("orders.placed", "orders"));

        // Builds and writes without pausing; behaviorally identical to the
        // layered stack when the sink never fails.
        let mut writer = CompositeWriterBuilder::new(broker.clone(), discovery)
            .retry_after_sleep(Duration::ZERO)
            .build()
            .await
            .unwrap();

        writer
            .write(Dispatch::from_message(Message::new(
                "orders.placed",
                OrderPlaced { order_id: 1 },
            )))
            .await
            .unwrap();
        writer.commit().await.unwrap();

        assert_eq!(broker.commits(), 1);
    }
}
