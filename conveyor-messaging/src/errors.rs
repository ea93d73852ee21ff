use thiserror::Error;

/// Errors surfaced by the commit-writer stack.
#[derive(Debug, Error)]
pub enum WriterError {
    /// Encoding a typed payload to wire bytes failed.
    #[error("failed to serialize message type '{type_name}': {source}")]
    Serialization {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Type discovery has no destination for the message's logical type.
    #[error("no destination registered for message type '{0}'")]
    Discovery(String),

    /// The underlying sink rejected a write.
    #[error("write failed: {0}")]
    Write(String),

    /// The underlying sink rejected a commit.
    #[error("commit failed: {0}")]
    Commit(String),

    /// The writer was used after being closed.
    #[error("writer is closed")]
    Closed,
}

/// Errors raised at the broker boundary.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The queue's reader has already been handed out.
    #[error("reader already open for queue: {0}")]
    ReaderTaken(String),

    /// Catch-all for broker implementation failures.
    #[error("internal broker error: {0}")]
    Internal(String),
}
