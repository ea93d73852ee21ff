//! Type discovery: resolution of a destination descriptor from a message's
//! logical type, consulted by the dispatch layer before serialization.

use std::collections::HashMap;

use crate::errors::WriterError;
use crate::message::Message;

/// Where a message should be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub topic: String,
    pub message_type: String,
}

pub trait TypeDiscovery: Send + Sync {
    fn discover(&self, message: &Message) -> Result<Destination, WriterError>;
}

/// Map-backed discovery built at startup.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    routes: HashMap<String, String>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, message_type: impl Into<String>, topic: impl Into<String>) -> Self {
        self.routes.insert(message_type.into(), topic.into());
        self
    }
}

impl TypeDiscovery for StaticDiscovery {
    fn discover(&self, message: &Message) -> Result<Destination, WriterError> {
        let type_name = message.type_name();
        let topic = self
            .routes
            .get(type_name)
            .ok_or_else(|| WriterError::Discovery(type_name.to_string()))?;
        Ok(Destination {
            topic: topic.clone(),
            message_type: type_name.to_string(),
        })
    }
}
