use std::collections::HashMap;

use conveyor_messaging::Message;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::DecodeError;

type DecodeFn = fn(&str, &[u8]) -> Result<Message, DecodeError>;

/// Mapping from logical type name to a decode function registered at
/// startup. Each entry is a monomorphized function pointer, so decoding
/// involves no runtime reflection.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under a logical type name. Last registration wins.
    pub fn register<T>(&mut self, type_name: &str)
    where
        T: DeserializeOwned + Serialize + Send + 'static,
    {
        self.decoders.insert(type_name.to_string(), decode_as::<T>);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.decoders.keys().cloned().collect()
    }

    pub fn decode(&self, type_name: &str, payload: &[u8]) -> Result<Message, DecodeError> {
        let decode = self
            .decoders
            .get(type_name)
            .ok_or_else(|| DecodeError::UnknownType(type_name.to_string()))?;
        decode(type_name, payload)
    }
}

fn decode_as<T>(type_name: &str, payload: &[u8]) -> Result<Message, DecodeError>
where
    T: DeserializeOwned + Serialize + Send + 'static,
{
    let value: T = serde_json::from_slice(payload).map_err(|source| DecodeError::Malformed {
        type_name: type_name.to_string(),
        source,
    })?;
    Ok(Message::new(type_name, value))
}
