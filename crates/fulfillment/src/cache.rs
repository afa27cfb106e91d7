//! Read-through cache for remote order lookups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::services::RemoteCommerceService;

/// Default lifetime of a cached lookup.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Key-value cache with per-entry expiry.
///
/// Injected into `OrderLookup` so a shared cache can replace the in-memory
/// one when several processes serve lookups.
#[async_trait]
pub trait OrderLookupCache: Send + Sync {
    /// Returns the live value under `key`, if any.
    async fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Stores `value` under `key` for `ttl`.
    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: serde_json::Value,
    expires_at: Instant,
}

/// In-memory lookup cache. An expired entry reads as a miss and is evicted
/// by that read; every `put` also sweeps all expired entries, so the map
/// only holds live lookups.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderLookupCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryOrderLookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry.
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .write()
            .await
            .retain(|_, entry| entry.expires_at > now);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl OrderLookupCache for InMemoryOrderLookupCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.data.clone());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        let now = Instant::now();
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                expires_at: now + ttl,
            },
        );
    }
}

/// Result of a remote order lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub order: Option<serde_json::Value>,
    /// True when served from the cache.
    pub cached: bool,
}

/// Remote order lookups served through a cache.
///
/// Only found orders are cached; misses always reach the storefront.
#[derive(Clone)]
pub struct OrderLookup {
    commerce: Arc<dyn RemoteCommerceService>,
    cache: Arc<dyn OrderLookupCache>,
    ttl: Duration,
}

impl OrderLookup {
    pub fn new(
        commerce: Arc<dyn RemoteCommerceService>,
        cache: Arc<dyn OrderLookupCache>,
        ttl: Duration,
    ) -> Self {
        Self {
            commerce,
            cache,
            ttl,
        }
    }

    /// Looks up an order in an advertiser's storefront.
    #[tracing::instrument(skip(self))]
    pub async fn lookup(&self, advertiser_id: &str, order_id: &str) -> Result<LookupResult> {
        let key = format!("{advertiser_id}:{order_id}");

        if let Some(order) = self.cache.get(&key).await {
            metrics::counter!("order_lookup_cache_hits_total").increment(1);
            return Ok(LookupResult {
                order: Some(order),
                cached: true,
            });
        }

        metrics::counter!("order_lookup_cache_misses_total").increment(1);
        let order = self.commerce.get_order(advertiser_id, order_id).await?;
        if let Some(order) = &order {
            self.cache.put(&key, order.clone(), self.ttl).await;
        }

        Ok(LookupResult {
            order,
            cached: false,
        })
    }
}
