use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Alert;
use crate::utils::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound notification channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Plain text message, used for the startup status line.
    async fn send_text(&self, text: &str) -> Result<MessageId>;

    /// Render and send one alert as a single message.
    async fn send_alert(&self, alert: &Alert) -> Result<MessageId>;

    /// Attach one reaction to a message already sent.
    async fn add_reaction(&self, message: &MessageId, emoji: &str) -> Result<()>;
}
