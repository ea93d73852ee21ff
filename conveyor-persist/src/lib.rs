mod retry;
mod transport;

pub use retry::{DiagnosticSink, LogSink, RetryClient, RetrySignal, SleepSignal};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
