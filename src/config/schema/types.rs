use crate::coupons::{Category, CategoryRule, default_rules};
use crate::error::ConfigError;
use crate::notifier::MessageFormatter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - resolved at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,

    #[serde(default)]
    pub messaging: MessagingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    /// Ordered keyword table for the categorizer; first match wins.
    #[serde(default = "default_rules")]
    pub category_keywords: Vec<CategoryRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            source: SourceConfig::default(),
            schedule: ScheduleConfig::default(),
            reliability: ReliabilityConfig::default(),
            notifier: NotifierConfig::default(),
            messaging: MessagingConfig::default(),
            store: StoreConfig::default(),
            category_keywords: default_rules(),
        }
    }
}

// ── Source ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_listing_path")]
    pub listing_path: String,
    #[serde(default = "default_page_param")]
    pub page_param: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_listing_selector")]
    pub listing_selector: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Follow each new listing to its detail page and take the first link on this host.
    #[serde(default = "default_detail_link_host")]
    pub detail_link_host: Option<String>,
}

fn default_base_url() -> String {
    "https://www.real.discount".into()
}

fn default_listing_path() -> String {
    "/".into()
}

fn default_page_param() -> String {
    "page".into()
}

fn default_max_pages() -> u32 {
    5
}

fn default_listing_selector() -> String {
    "li".into()
}

fn default_user_agent() -> String {
    concat!("couponwatch/", env!("CARGO_PKG_VERSION")).into()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[allow(clippy::unnecessary_wraps)]
fn default_detail_link_host() -> Option<String> {
    Some("udemy.com".into())
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_path: default_listing_path(),
            page_param: default_page_param(),
            max_pages: default_max_pages(),
            listing_selector: default_listing_selector(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            detail_link_host: default_detail_link_host(),
        }
    }
}

impl SourceConfig {
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            ConfigError::Validation(format!("source.base_url {:?}: {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "source.base_url must be http(s), got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }
}

// ── Schedule ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_scrape_interval_secs")]
    pub scrape_interval_secs: u64,
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

/// One year.
pub const MAX_SCRAPE_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

fn default_scrape_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_true() -> bool {
    true
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scrape_interval_secs: default_scrape_interval_secs(),
            run_on_start: true,
        }
    }
}

// ── Reliability ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

// ── Notifier ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Minimum gap between two consecutive sends.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    #[serde(default = "default_records_per_message")]
    pub records_per_message: usize,
    /// Tera template overriding the built-in message layout.
    #[serde(default)]
    pub message_template: Option<String>,
}

fn default_rate_limit_delay_ms() -> u64 {
    20_000
}

fn default_records_per_message() -> usize {
    1
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            records_per_message: default_records_per_message(),
            message_template: None,
        }
    }
}

// ── Messaging provider ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-category recipient numbers (E.164); others go to the default recipient.
    #[serde(default)]
    pub category_recipients: BTreeMap<Category, String>,
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".into()
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            category_recipients: BTreeMap::new(),
        }
    }
}

// ── Store ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "~/.couponwatch/seen_coupons.json".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl StoreConfig {
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }
}

// ── Validation ──────────────────────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.base_url()?;

        if self.source.max_pages == 0 {
            return Err(ConfigError::Validation(
                "source.max_pages must be >= 1".into(),
            ));
        }
        if !(1..=MAX_SCRAPE_INTERVAL_SECS).contains(&self.schedule.scrape_interval_secs) {
            return Err(ConfigError::Validation(format!(
                "schedule.scrape_interval_secs must be between 1 and {MAX_SCRAPE_INTERVAL_SECS}"
            )));
        }
        if self.notifier.records_per_message == 0 {
            return Err(ConfigError::Validation(
                "notifier.records_per_message must be >= 1".into(),
            ));
        }
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::Validation("store.path must not be empty".into()));
        }

        for rule in &self.category_keywords {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "category_keywords entry for {} has no keywords",
                    rule.category
                )));
            }
        }

        MessageFormatter::new(self.notifier.message_template.as_deref())
            .map_err(|e| ConfigError::Validation(format!("notifier.message_template: {e}")))?;

        Ok(())
    }
}
