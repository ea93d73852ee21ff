use crate::message::Payload;

/// Converts a typed payload to wire bytes.
pub trait Serializer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn serialize(&self, payload: &dyn Payload) -> serde_json::Result<Vec<u8>>;
}

/// Default serializer; payloads become JSON documents.
#[derive(Debug, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize(&self, payload: &dyn Payload) -> serde_json::Result<Vec<u8>> {
        payload.encode_json()
    }
}
