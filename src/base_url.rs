use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde_json::Value;

const CACHE_CAPACITY: usize = 512;
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

struct CachedUrl {
    value: String,
    fetched_at: Instant,
}

/// Resolves the per-project documentation base URL from the collector's
/// identity endpoint and caches it per encoded API key. Failed lookups are
/// cached as empty strings until the TTL expires; callers treat an empty
/// string as "no documentation link available".
pub struct BaseUrlResolver {
    cache: Mutex<LruCache<String, CachedUrl>>,
    client: reqwest::Client,
    api_url: String,
}

impl BaseUrlResolver {
    pub fn new(api_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        BaseUrlResolver {
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap())),
            client,
            api_url: api_url.into(),
        }
    }

    /// `encoded_api_key` is the `Basic ...` credential also used on the
    /// metrics endpoint. Concurrent misses for the same key may fetch
    /// twice; the last writer wins.
    pub async fn resolve(&self, encoded_api_key: &str) -> String {
        if let Some(cached) = self.lookup(encoded_api_key) {
            return cached;
        }
        let value = self.fetch(encoded_api_key).await;
        let mut cache = self.cache.lock().unwrap();
        cache.put(
            encoded_api_key.to_string(),
            CachedUrl {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        value
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let mut cache = self.cache.lock().unwrap();
        match cache.get(key) {
            Some(entry) if entry.fetched_at.elapsed() < CACHE_TTL => Some(entry.value.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    async fn fetch(&self, encoded_api_key: &str) -> String {
        let url = format!("{}/v1", self.api_url.trim_end_matches('/'));
        let response = match self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, encoded_api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::error!("error while fetching baseUrl: {}", e);
                return String::new();
            }
        };
        if !response.status().is_success() {
            log::error!("failed to fetch baseUrl: {}", response.status());
            return String::new();
        }
        match response.json::<Value>().await {
            Ok(body) => body
                .get("baseUrl")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Err(e) => {
                log::error!("error while reading baseUrl response: {}", e);
                String::new()
            }
        }
    }
}
