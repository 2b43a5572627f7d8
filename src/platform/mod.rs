pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// One update fetched from the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Platform update id, used to advance the polling cursor
    pub id: i64,
    /// Conversation the reply goes back to
    pub chat_id: i64,
    /// Message text; `None` for updates that carry no text
    pub text: Option<String>,
}

/// Fetch/send primitives of a chat platform
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Updates with id >= `offset`, waiting up to `timeout_secs` for new ones.
    async fn fetch_updates(&self, offset: i64, timeout_secs: u32) -> Result<Vec<IncomingMessage>>;

    async fn send_reply(&self, chat_id: i64, text: &str) -> Result<()>;
}
