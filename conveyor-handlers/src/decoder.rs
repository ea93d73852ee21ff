use conveyor_messaging::Delivery;
use log::{error, warn};

use crate::errors::DecodeError;
use crate::registry::TypeRegistry;
use crate::transformer::Transformer;

/// What the decode stage does when a delivery cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Drop the delivery and keep consuming.
    Skip,
    /// Treat the failure as fatal.
    Abort,
}

/// The decode stage: resolves the delivery's logical type name through the
/// registry and parses the payload into a typed message. Runs first in every
/// transformation chain.
pub struct JsonDecoder {
    registry: TypeRegistry,
    on_unknown_type: FailurePolicy,
    on_decode_failure: FailurePolicy,
}

impl JsonDecoder {
    pub fn new(
        registry: TypeRegistry,
        on_unknown_type: FailurePolicy,
        on_decode_failure: FailurePolicy,
    ) -> Self {
        Self {
            registry,
            on_unknown_type,
            on_decode_failure,
        }
    }

    fn reject(&self, policy: FailurePolicy, err: DecodeError) -> Option<Delivery> {
        match policy {
            FailurePolicy::Skip => {
                warn!("dropping delivery: {err}");
                None
            }
            FailurePolicy::Abort => {
                error!("fatal decode failure: {err}");
                panic!("fatal decode failure: {err}");
            }
        }
    }
}

impl Transformer for JsonDecoder {
    fn transform(&mut self, mut delivery: Delivery) -> Option<Delivery> {
        // In-process producers hand over already-decoded deliveries.
        if delivery.message.is_some() {
            return Some(delivery);
        }

        match self.registry.decode(&delivery.message_type, &delivery.payload) {
            Ok(message) => {
                delivery.message = Some(message);
                Some(delivery)
            }
            Err(err @ DecodeError::UnknownType(_)) => self.reject(self.on_unknown_type, err),
            Err(err) => self.reject(self.on_decode_failure, err),
        }
    }
}
