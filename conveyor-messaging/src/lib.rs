mod broker;
mod delivery;
mod dispatch_writer;
mod errors;
pub mod in_memory;
mod message;
mod retry_writer;
mod serialization_writer;
mod serializer;
mod writer;

pub mod discovery;

pub use broker::{BrokerReader, MessageBroker};
pub use delivery::{ApplicationResult, Delivery, Dispatch, Receipt};
pub use discovery::{Destination, StaticDiscovery, TypeDiscovery};
pub use dispatch_writer::DispatchWriter;
pub use errors::{BrokerError, WriterError};
pub use in_memory::InMemoryBroker;
pub use message::{Message, Payload};
pub use retry_writer::{RetryPause, RetryWriter};
pub use serialization_writer::SerializationWriter;
pub use serializer::{JsonSerializer, Serializer};
pub use writer::CommitWriter;
