use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

use crate::config::DiscordConfig;
use crate::models::{Alert, Tier};
use crate::plugins::traits::{MessageId, Notifier};
use crate::utils::error::{AppError, Result};

const NOTIFIER_NAME: &str = "discord";
const REACTION_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
}

#[derive(Debug)]
enum ReactionFailure {
    RateLimited,
    Failed(AppError),
}

/// Discord bot client posting to a single channel.
pub struct DiscordNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    channel_id: String,
    reaction_retry_delay: Duration,
}

impl DiscordNotifier {
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(DiscordNotifier {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            channel_id: config.channel_id.clone(),
            reaction_retry_delay: Duration::from_millis(750),
        })
    }

    pub fn with_reaction_retry_delay(mut self, delay: Duration) -> Self {
        self.reaction_retry_delay = delay;
        self
    }

    fn get_embed_color(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Aggressive => 0x00c853, // Green, buy now
            Tier::Acceptable => 0xffab00, // Amber
            Tier::Debug => 0x607d8b,
        }
    }

    fn get_emoji(&self, tier: Tier) -> &str {
        match tier {
            Tier::Aggressive => "🔥",
            Tier::Acceptable => "💰",
            Tier::Debug => "🧪",
        }
    }

    fn create_embed(&self, alert: &Alert) -> serde_json::Value {
        let mut title = format!("{} {}", self.get_emoji(alert.tier), alert.title);
        if alert.tier == Tier::Debug {
            title = format!("[DEBUG] {}", title);
        }
        // Discord rejects embed titles over 256 characters
        let title: String = title.chars().take(256).collect();

        let mut fields = vec![json!({
            "name": "💶 Prix",
            "value": format!("**{} €**", alert.price),
            "inline": true
        })];

        if let Some(targets) = &alert.targets {
            fields.push(json!({
                "name": "🎯 Cibles",
                "value": format!(
                    "Agressif: {} €\nAcceptable: {} €\nRevente: {} €",
                    targets.target_aggressive, targets.target_acceptable, targets.resell_value
                ),
                "inline": true
            }));
        }

        fields.push(json!({
            "name": "📱 Modèle",
            "value": alert.variant.to_string(),
            "inline": true
        }));

        fields.push(json!({
            "name": "🏪 Source",
            "value": alert.source,
            "inline": true
        }));

        let mut embed = json!({
            "title": title,
            "color": self.get_embed_color(alert.tier),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "fields": fields,
            "footer": { "text": format!("Resale Sniper · {}", alert.tier.as_str()) }
        });

        if let Some(url) = &alert.url {
            embed["url"] = json!(url.as_str());
        }

        if let Some(image) = &alert.image {
            embed["image"] = json!({ "url": image });
        }

        embed
    }

    fn messages_url(&self) -> String {
        format!("{}/channels/{}/messages", self.api_base, self.channel_id)
    }

    fn reaction_url(&self, message: &MessageId, emoji: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(emoji.as_bytes()).collect();
        format!("{}/{}/reactions/{}/@me", self.messages_url(), message, encoded)
    }

    async fn post_message(&self, payload: serde_json::Value) -> Result<MessageId> {
        let response = self
            .client
            .post(self.messages_url())
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::dispatch(NOTIFIER_NAME, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::dispatch(NOTIFIER_NAME, format!("status {}: {}", status, body)));
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::dispatch(NOTIFIER_NAME, format!("unreadable response: {}", e)))?;

        Ok(MessageId(message.id))
    }

    async fn put_reaction(&self, url: &str) -> std::result::Result<(), ReactionFailure> {
        let response = self
            .client
            .put(url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .header("Content-Length", "0")
            .send()
            .await
            .map_err(|e| ReactionFailure::Failed(AppError::dispatch(NOTIFIER_NAME, e.to_string())))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => Err(ReactionFailure::RateLimited),
            status => Err(ReactionFailure::Failed(AppError::dispatch(
                NOTIFIER_NAME,
                format!("reaction rejected with status {}", status),
            ))),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        NOTIFIER_NAME
    }

    async fn send_text(&self, text: &str) -> Result<MessageId> {
        self.post_message(json!({ "content": text })).await
    }

    async fn send_alert(&self, alert: &Alert) -> Result<MessageId> {
        let payload = json!({ "embeds": [self.create_embed(alert)] });
        self.post_message(payload).await
    }

    async fn add_reaction(&self, message: &MessageId, emoji: &str) -> Result<()> {
        let url = self.reaction_url(message, emoji);
        let strategy = FixedInterval::new(self.reaction_retry_delay).take(REACTION_ATTEMPTS - 1);

        // Only rate limiting is retried; the message itself is never resent
        RetryIf::spawn(
            strategy,
            || self.put_reaction(&url),
            |e: &ReactionFailure| matches!(e, ReactionFailure::RateLimited),
        )
        .await
        .map_err(|e| match e {
            ReactionFailure::RateLimited => AppError::dispatch(NOTIFIER_NAME, "reaction rate limited"),
            ReactionFailure::Failed(err) => err,
        })
    }
}
