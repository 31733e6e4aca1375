use serde::Serialize;
use std::sync::Arc;

use crate::models::Alert;
use crate::plugins::traits::{MessageId, Notifier};
use crate::utils::error::Result;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReactionOutcome {
    pub emoji: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome of one alert: the message was sent, reactions may have partially failed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmitReport {
    pub message_id: MessageId,
    pub reactions: Vec<ReactionOutcome>,
}

impl EmitReport {
    pub fn failed_reactions(&self) -> usize {
        self.reactions.iter().filter(|r| !r.success).count()
    }
}

pub struct AlertEmitter {
    notifier: Arc<dyn Notifier>,
    reactions: Vec<String>,
}

impl AlertEmitter {
    pub fn new(notifier: Arc<dyn Notifier>, reactions: Vec<String>) -> Self {
        Self { notifier, reactions }
    }

    pub fn notifier_name(&self) -> &str {
        self.notifier.name()
    }

    /// Send the alert once, then attach every reaction in order.
    ///
    /// Only a failed send is an error. Reaction failures are reported in the
    /// returned `EmitReport` and never cause the alert to be resent.
    pub async fn emit(&self, alert: &Alert) -> Result<EmitReport> {
        let message_id = self.notifier.send_alert(alert).await?;

        let mut reactions = Vec::with_capacity(self.reactions.len());
        for emoji in &self.reactions {
            let outcome = match self.notifier.add_reaction(&message_id, emoji).await {
                Ok(()) => ReactionOutcome {
                    emoji: emoji.clone(),
                    success: true,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(message = %message_id, emoji = %emoji, error = %e, "Failed to add reaction");
                    ReactionOutcome {
                        emoji: emoji.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            reactions.push(outcome);
        }

        Ok(EmitReport { message_id, reactions })
    }

    pub async fn send_status(&self, text: &str) -> Result<MessageId> {
        self.notifier.send_text(text).await
    }
}
