use std::sync::Arc;

use conveyor_handlers::{FailurePolicy, JsonDecoder, TransformationHandler, Transformer, TypeRegistry};
use conveyor_messaging::{BrokerError, BrokerReader, Delivery, MessageBroker, Receipt};
use log::error;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

/// Configures the inbound half of a pipeline: source queue or bindings, the
/// registered message types, decode-failure policies, and user transformer
/// stages.
pub struct CompositeReaderBuilder {
    broker: Arc<dyn MessageBroker>,
    source_queue: String,
    bindings: Vec<String>,
    registry: TypeRegistry,
    transformers: Vec<Box<dyn Transformer>>,
    abort_on_unknown_type: bool,
    abort_on_decode_failure: bool,
}

impl CompositeReaderBuilder {
    pub fn new(broker: Arc<dyn MessageBroker>, source_queue: impl Into<String>) -> Self {
        Self {
            broker,
            source_queue: source_queue.into(),
            bindings: Vec::new(),
            registry: TypeRegistry::new(),
            transformers: Vec::new(),
            abort_on_unknown_type: false,
            abort_on_decode_failure: false,
        }
    }

    /// Register `T` under a logical type name for the decode stage.
    pub fn register_type<T>(mut self, type_name: &str) -> Self
    where
        T: DeserializeOwned + Serialize + Send + 'static,
    {
        self.registry.register::<T>(type_name);
        self
    }

    /// Topics to bind; also the source when no explicit queue was given.
    pub fn register_bindings(mut self, bindings: impl IntoIterator<Item = String>) -> Self {
        self.bindings.extend(bindings);
        self
    }

    pub fn abort_when_type_unknown(mut self) -> Self {
        self.abort_on_unknown_type = true;
        self
    }

    pub fn abort_when_decode_fails(mut self) -> Self {
        self.abort_on_decode_failure = true;
        self
    }

    /// Append a transformer stage; stages run in registration order after
    /// the decode stage.
    pub fn append_transformer(mut self, transformer: Box<dyn Transformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Open the reader and assemble the transformation chain.
    ///
    /// # Panics
    ///
    /// Panics when neither a source queue nor bindings were configured; this
    /// is a fatal configuration error caught before any work begins.
    pub async fn build(self) -> Result<CompositeReader, BrokerError> {
        let reader = self.open_reader().await?;
        let BrokerReader {
            deliveries,
            acknowledgements,
            capacity,
        } = reader;

        let policy = |abort| {
            if abort {
                FailurePolicy::Abort
            } else {
                FailurePolicy::Skip
            }
        };
        let decoder = JsonDecoder::new(
            self.registry,
            policy(self.abort_on_unknown_type),
            policy(self.abort_on_decode_failure),
        );

        let mut stages: Vec<Box<dyn Transformer>> = Vec::with_capacity(self.transformers.len() + 1);
        stages.push(Box::new(decoder));
        stages.extend(self.transformers);

        // Output capacity matches the input so backpressure is symmetric.
        let (transformed_tx, transformed_rx) = mpsc::channel(capacity);
        let transform = TransformationHandler::new(deliveries, transformed_tx, stages);

        Ok(CompositeReader {
            transform,
            deliveries: transformed_rx,
            acknowledgements,
        })
    }

    async fn open_reader(&self) -> Result<BrokerReader, BrokerError> {
        if !self.source_queue.is_empty() {
            return self
                .broker
                .open_reader(&self.source_queue, &self.bindings)
                .await;
        }

        if !self.bindings.is_empty() {
            return self.broker.open_transient_reader(&self.bindings).await;
        }

        error!("unable to open reader: no source queue or bindings specified");
        panic!("unable to open reader: no source queue or bindings specified");
    }
}

/// The assembled inbound half: spawn [`TransformationHandler::listen`] to
/// pump deliveries, consume `deliveries`, and hand `acknowledgements` to the
/// delivery handler.
pub struct CompositeReader {
    pub transform: TransformationHandler,
    pub deliveries: mpsc::Receiver<Delivery>,
    pub acknowledgements: mpsc::Sender<Receipt>,
}
