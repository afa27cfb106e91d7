//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Admin API credentials of one advertiser's storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub advertiser_id: String,
    pub store_name: String,
    pub access_token: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON log lines (default: plain text)
/// - `CONCURRENCY_LIMIT`: sagas run at once per batch (default: `4`)
/// - `ORDER_CACHE_TTL_SECS`: remote order lookup cache lifetime (default: `600`)
/// - `DATABASE_URL`: selects the Postgres status store when set
/// - `STRIPE_SECRET_KEY`: selects the Stripe payment client when set
/// - `OFFERS_BASE_URL`, `OFFERS_API_TOKEN`: select the campaign API client
///   when both are set
/// - `SHOPIFY_STORES`: `advertiser=store:token` pairs separated by commas;
///   selects the Shopify storefront client when non-empty
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub json_logs: bool,
    pub concurrency_limit: usize,
    pub order_cache_ttl: Duration,
    pub database_url: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub offers_base_url: Option<String>,
    pub offers_api_token: Option<String>,
    pub storefronts: Vec<StorefrontConfig>,
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses `advertiser=store:token` entries, skipping malformed ones.
pub fn parse_storefronts(raw: &str) -> Vec<StorefrontConfig> {
    raw.split(',')
        .filter_map(|entry| {
            let (advertiser_id, store) = entry.trim().split_once('=')?;
            let (store_name, access_token) = store.split_once(':')?;
            if advertiser_id.is_empty() || store_name.is_empty() || access_token.is_empty() {
                return None;
            }
            Some(StorefrontConfig {
                advertiser_id: advertiser_id.to_string(),
                store_name: store_name.to_string(),
                access_token: access_token.to_string(),
            })
        })
        .collect()
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            concurrency_limit: std::env::var("CONCURRENCY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrency_limit),
            order_cache_ttl: std::env::var("ORDER_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.order_cache_ttl),
            database_url: non_empty("DATABASE_URL"),
            stripe_secret_key: non_empty("STRIPE_SECRET_KEY"),
            offers_base_url: non_empty("OFFERS_BASE_URL"),
            offers_api_token: non_empty("OFFERS_API_TOKEN"),
            storefronts: non_empty("SHOPIFY_STORES")
                .map(|raw| parse_storefronts(&raw))
                .unwrap_or_default(),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            json_logs: false,
            concurrency_limit: 4,
            order_cache_ttl: Duration::from_secs(600),
            database_url: None,
            stripe_secret_key: None,
            offers_base_url: None,
            offers_api_token: None,
            storefronts: Vec::new(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("json_logs", &self.json_logs)
            .field("concurrency_limit", &self.concurrency_limit)
            .field("order_cache_ttl", &self.order_cache_ttl)
            .field("database", &self.database_url.is_some())
            .field("stripe", &self.stripe_secret_key.is_some())
            .field("offers", &self.offers_base_url)
            .field("storefronts", &self.storefronts.len())
            .finish()
    }
}
