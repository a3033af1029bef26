//! Core channel trait - implement for any messaging platform.

use async_trait::async_trait;

#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Send a message to a chat.
    async fn send(&self, recipient: &str, message: &str) -> anyhow::Result<()>;

    /// Receive and handle incoming events until shutdown (long-running).
    async fn run(&self) -> anyhow::Result<()>;
}
