use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub scheduler: SchedulerConfig,
    pub scraper: ScraperConfig,
    pub sources: Vec<SourceConfig>,
    pub pricing: PricingConfig,
    pub classifier: ClassifierConfig,
    pub seen_store: SeenStoreConfig,
    pub debug: DebugConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub api_base: String,
    pub bot_token: String,
    pub channel_id: String,
    pub reactions: Vec<String>,
    pub status_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub search_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub request_timeout: u64,
    pub blocked_cooldown_passes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Leboncoin(LeboncoinConfig),
    Html(HtmlSourceConfig),
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Leboncoin(c) => &c.name,
            SourceConfig::Html(c) => &c.name,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            SourceConfig::Leboncoin(c) => c.enabled,
            SourceConfig::Html(c) => c.enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeboncoinConfig {
    pub name: String,
    pub enabled: bool,
    pub api_url: String,
    pub site_url: String,
    pub consent_url: Option<String>,
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlSourceConfig {
    pub name: String,
    pub enabled: bool,
    /// Search page URL; `{query}` is replaced by the url-encoded search term.
    pub search_url: String,
    pub site_url: String,
    pub consent_url: Option<String>,
    pub item_selector: String,
    pub id_attribute: Option<String>,
    pub title_selector: String,
    pub price_selector: String,
    pub link_selector: String,
    pub image_selector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub battery_cost: u64,
    pub large_margin: u64,
    pub small_margin: u64,
    pub variants: Vec<VariantPriceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantPriceConfig {
    pub key: String,
    pub resell: u64,
    pub part_cost: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub accessory_keywords: Vec<String>,
    pub untracked_variants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeenStoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    pub enabled: bool,
    pub max_sends: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub directory: Option<PathBuf>,
}

impl AppConfig {
    /// Layered load: built-in defaults, `config/{RUN_MODE}`, `config/local`,
    /// an explicit file, then `SNIPER__*` environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Self::defaults()
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        let s = builder
            .add_source(
                Environment::with_prefix("SNIPER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scheduler.search_terms")
                    .with_list_parse_key("discord.reactions")
                    .with_list_parse_key("classifier.accessory_keywords"),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // The original bot deployment exported these two variables
        config.apply_legacy_env(|name| env::var(name).ok());

        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults overlaid with a TOML document, without environment lookups.
    pub fn from_toml(overrides: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::defaults()
            .add_source(File::from_str(overrides, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.discord.bot_token.is_empty() {
            if let Some(token) = lookup("DISCORD_TOKEN") {
                self.discord.bot_token = token;
            }
        }
        if self.discord.channel_id.is_empty() {
            if let Some(channel_id) = lookup("DISCORD_CHANNEL_ID") {
                self.discord.channel_id = channel_id;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate notification channel
        if self.discord.bot_token.trim().is_empty() {
            return Err(ConfigError::Message("Discord bot_token must be set".into()));
        }

        if self.discord.channel_id.is_empty()
            || !self.discord.channel_id.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::Message("Discord channel_id must be a numeric id".into()));
        }

        if Url::parse(&self.discord.api_base).is_err() {
            return Err(ConfigError::Message("Invalid Discord api_base URL".into()));
        }

        // Validate scheduler configuration
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Message("Scheduler interval_secs must be greater than 0".into()));
        }

        if self.scheduler.search_terms.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Message("Scheduler search_terms must not be empty".into()));
        }

        if self.scraper.request_timeout == 0 {
            return Err(ConfigError::Message("Scraper request_timeout must be greater than 0".into()));
        }

        // Validate sources
        if !self.sources.iter().any(|s| s.enabled()) {
            return Err(ConfigError::Message("At least one source must be enabled".into()));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name()) {
                return Err(ConfigError::Message(format!("Duplicate source name: {}", source.name())));
            }
            self.validate_source(source)?;
        }

        // Validate pricing
        if self.pricing.small_margin > self.pricing.large_margin {
            return Err(ConfigError::Message("Pricing small_margin cannot exceed large_margin".into()));
        }

        let mut keys = HashSet::new();
        for variant in &self.pricing.variants {
            let key = crate::models::normalize_text(&variant.key);
            if key.is_empty() {
                return Err(ConfigError::Message("Pricing variant key must not be empty".into()));
            }
            if !keys.insert(key) {
                return Err(ConfigError::Message(format!("Duplicate pricing variant: {}", variant.key)));
            }
        }

        if self.debug.enabled && self.debug.max_sends == 0 {
            return Err(ConfigError::Message("Debug max_sends must be greater than 0 when enabled".into()));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }

    fn validate_source(&self, source: &SourceConfig) -> Result<(), ConfigError> {
        let urls: Vec<&str> = match source {
            SourceConfig::Leboncoin(c) => {
                if c.limit == 0 {
                    return Err(ConfigError::Message(format!("Source {}: limit must be greater than 0", c.name)));
                }
                vec![&c.api_url, &c.site_url]
            }
            SourceConfig::Html(c) => {
                if !c.search_url.contains("{query}") {
                    return Err(ConfigError::Message(format!(
                        "Source {}: search_url must contain {{query}}",
                        c.name
                    )));
                }
                vec![&c.site_url]
            }
        };

        for url in urls {
            if Url::parse(url).is_err() {
                return Err(ConfigError::Message(format!("Source {}: invalid URL {}", source.name(), url)));
            }
        }

        Ok(())
    }

    /// Search terms with blanks removed.
    pub fn search_terms(&self) -> Vec<String> {
        self.scheduler
            .search_terms
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}
