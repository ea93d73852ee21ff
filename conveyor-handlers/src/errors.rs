use thiserror::Error;

/// Errors raised by the decode stage.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The delivery's logical type name has no registered decoder.
    #[error("no decoder registered for message type '{0}'")]
    UnknownType(String),

    /// The payload bytes do not parse as the registered type.
    #[error("failed to decode message type '{type_name}': {source}")]
    Malformed {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
}
