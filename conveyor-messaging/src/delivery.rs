use std::fmt;

use uuid::Uuid;

use crate::message::Message;

/// Opaque token correlating a delivery with its acknowledgement.
///
/// A receipt passes through every pipeline stage unchanged; the delivery
/// handler emits the last receipt of each batch back to the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Receipt(String);

impl Receipt {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// A fresh receipt for brokers that mint their own tokens.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Receipt {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for Receipt {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// An inbound record: raw wire fields plus the decoded message once the
/// decode stage has run.
#[derive(Debug)]
pub struct Delivery {
    pub message_type: String,
    pub payload: Vec<u8>,
    pub message: Option<Message>,
    pub receipt: Receipt,
}

impl Delivery {
    pub fn new(message_type: impl Into<String>, payload: Vec<u8>, receipt: Receipt) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
            message: None,
            receipt,
        }
    }

    /// A delivery that skips the decode stage, used by in-process producers.
    pub fn from_message(message: Message, receipt: Receipt) -> Self {
        Self {
            message_type: message.type_name().to_string(),
            payload: Vec::new(),
            message: Some(message),
            receipt,
        }
    }
}

/// An outbound record derived from business-logic output.
///
/// A dispatch starts with only the typed message set; the dispatch layer
/// stamps the destination and the serialize layer fills the wire payload.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub message_type: String,
    pub destination: String,
    pub payload: Vec<u8>,
    pub message: Option<Message>,
}

impl Dispatch {
    pub fn from_message(message: Message) -> Self {
        Self {
            message_type: message.type_name().to_string(),
            message: Some(message),
            ..Self::default()
        }
    }

    /// Clones the wire fields for a retried write. The typed message is not
    /// carried: retry sits beneath the serialize layer, which has already
    /// consumed it.
    pub fn to_wire(&self) -> Self {
        Self {
            message_type: self.message_type.clone(),
            destination: self.destination.clone(),
            payload: self.payload.clone(),
            message: None,
        }
    }
}

/// The shape of a business-logic result for one delivery.
///
/// `Absent` yields no writes, `Single` exactly one, `Many` one per element
/// in element order.
#[derive(Debug)]
pub enum ApplicationResult {
    Absent,
    Single(Message),
    Many(Vec<Message>),
}
