mod application;
mod decoder;
mod delivery_handler;
mod errors;
mod registry;
mod transformer;

pub use application::Application;
pub use decoder::{FailurePolicy, JsonDecoder};
pub use delivery_handler::DeliveryHandler;
pub use errors::DecodeError;
pub use registry::TypeRegistry;
pub use transformer::{TransformationHandler, Transformer};
