use std::any::Any;
use std::fmt;

use serde::Serialize;

/// A type-erased message payload.
///
/// The blanket implementation covers every `Serialize + Any + Send` value, so
/// application types need no extra trait impls: business logic constructs
/// messages from plain serde structs and the serialization layer encodes them
/// without knowing the concrete type.
pub trait Payload: Any + Send {
    fn as_any(&self) -> &dyn Any;

    fn encode_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T> Payload for T
where
    T: Serialize + Any + Send,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn encode_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A business message: a logical type name paired with its payload.
///
/// The type name is the key used by the type registry on ingress and by
/// type discovery on egress.
pub struct Message {
    type_name: String,
    payload: Box<dyn Payload>,
}

impl Message {
    pub fn new<T: Payload>(type_name: impl Into<String>, payload: T) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Box::new(payload),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn payload(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
