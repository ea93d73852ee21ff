use async_trait::async_trait;
use conveyor_messaging::{ApplicationResult, Message};

/// The business-logic capability invoked once per delivery.
///
/// The returned [`ApplicationResult`] states the outbound shape explicitly:
/// no write, one write, or one write per element in order.
#[async_trait]
pub trait Application: Send {
    async fn handle(&mut self, message: Message) -> ApplicationResult;
}
