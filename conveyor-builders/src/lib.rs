mod reader;
mod writer;

pub use reader::{CompositeReader, CompositeReaderBuilder};
pub use writer::CompositeWriterBuilder;
