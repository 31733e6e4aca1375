use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

// Anti-bot interstitials answer 200 with a challenge page as often as 403.
// Only the challenge itself counts: protected sites load these scripts on
// every normal page too.
const INTERSTITIAL_MARKERS: [&str; 3] = ["captcha-delivery.com/captcha", "cf-challenge", "challenge-form"];

const ANTI_BOT_MARKERS: [&str; 4] = ["captcha-delivery", "datadome", "g-recaptcha", "cf-challenge"];

/// Cookie-keeping HTTP session shared by one source.
pub struct HttpSession {
    source_name: String,
    client: Client,
    consent_url: Option<String>,
    consented: AtomicBool,
}

impl HttpSession {
    pub fn new(source_name: &str, config: &ScraperConfig, consent_url: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            source_name: source_name.to_string(),
            client,
            consent_url,
            consented: AtomicBool::new(false),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn has_consented(&self) -> bool {
        self.consented.load(Ordering::Relaxed)
    }

    /// Visit the consent page once so the session carries its cookies.
    pub async fn ensure_consent(&self) -> Result<()> {
        let Some(consent_url) = self.consent_url.as_deref() else {
            return Ok(());
        };
        if self.has_consented() {
            return Ok(());
        }

        tracing::debug!(source = %self.source_name, url = consent_url, "Acknowledging consent");
        let response = self
            .client
            .get(consent_url)
            .send()
            .await
            .map_err(|e| AppError::unavailable(&self.source_name, format!("consent request failed: {}", e)))?;
        self.check_status(response.status())?;

        self.consented.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Forget the consent so the next query repeats it.
    pub fn reset_consent(&self) {
        self.consented.store(false, Ordering::Relaxed);
    }

    /// Send after consent and return the body of a successful response.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String> {
        self.ensure_consent().await?;

        let response = request
            .send()
            .await
            .map_err(|e| AppError::unavailable(&self.source_name, format!("request failed: {}", e)))?;

        let result = self.read_body(response).await;
        if matches!(result, Err(AppError::SourceBlocked { .. })) {
            self.reset_consent();
        }
        result
    }

    async fn read_body(&self, response: Response) -> Result<String> {
        self.check_status(response.status())?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::unavailable(&self.source_name, format!("failed to read body: {}", e)))?;

        if is_challenge_page(&body) {
            return Err(AppError::blocked(&self.source_name, "anti-automation challenge page"));
        }
        Ok(body)
    }

    fn check_status(&self, status: StatusCode) -> Result<()> {
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::blocked(&self.source_name, format!("status {}", status)));
        }
        if !status.is_success() {
            return Err(AppError::unavailable(&self.source_name, format!("status {}", status)));
        }
        Ok(())
    }
}

/// A challenge served in place of the requested page. JSON payloads never are.
pub fn is_challenge_page(body: &str) -> bool {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return false;
    }
    contains_any(body, &INTERSTITIAL_MARKERS)
}

/// Whether the page loads anti-bot tooling. Only meaningful on a page that
/// yielded nothing.
pub fn mentions_anti_bot(body: &str) -> bool {
    contains_any(body, &ANTI_BOT_MARKERS)
}

fn contains_any(body: &str, markers: &[&str]) -> bool {
    let head: String = body.chars().take(4096).collect::<String>().to_lowercase();
    markers.iter().any(|marker| head.contains(marker))
}
