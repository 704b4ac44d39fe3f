pub mod coingecko;
pub mod wire;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::cache::TtlCache;

/// Spot quote for one asset.  Fields the upstream omitted stay `None` and
/// render as zero downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Quote {
    pub price_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
}

/// One historical sample: UTC unix millis and a USD price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub ts_ms: i64,
    pub price: f64,
}

/// Where market data comes from.  The hub talks to CoinGecko in production;
/// tests plug in a canned source.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_quotes(&self, ids: &[String]) -> Result<HashMap<String, Quote>>;
    async fn fetch_history(&self, id: &str, window_days: u32) -> Result<Vec<PricePoint>>;
}

/// Outcome of a fetch, as the cache remembers it.  A failed fetch is
/// memoized too (empty value plus message) so a flapping upstream is not
/// hammered on every page refresh.
#[derive(Debug, Clone)]
pub struct CachedFetch<T> {
    pub value: T,
    pub error: Option<String>,
}

/// Memoizing façade over a [`MarketDataSource`].
///
/// Quotes and history have independent TTLs.  Callers may bypass the memo
/// with `reload`, which drops the entry before fetching.
pub struct MarketService {
    source: Arc<dyn MarketDataSource>,
    quotes: TtlCache<String, CachedFetch<HashMap<String, Quote>>>,
    history: TtlCache<(String, u32), CachedFetch<Vec<PricePoint>>>,
}

impl MarketService {
    pub fn new(source: Arc<dyn MarketDataSource>, quote_ttl: Duration, history_ttl: Duration) -> Self {
        Self {
            source,
            quotes: TtlCache::new(quote_ttl),
            history: TtlCache::new(history_ttl),
        }
    }

    /// Spot quotes for a set of ids, memoized per sorted id set.
    pub async fn quotes(&self, ids: &[String], reload: bool) -> CachedFetch<HashMap<String, Quote>> {
        let key = {
            let mut sorted = ids.to_vec();
            sorted.sort();
            sorted.join(",")
        };

        if reload {
            self.quotes.invalidate(&key);
        }
        if let Some(hit) = self.quotes.get(&key) {
            return hit;
        }

        let outcome = match self.source.fetch_quotes(ids).await {
            Ok(map) => CachedFetch { value: map, error: None },
            Err(e) => {
                tracing::warn!("quote fetch failed: {e:#}");
                CachedFetch {
                    value: HashMap::new(),
                    error: Some(format!("Error fetching crypto data: {e:#}")),
                }
            }
        };
        self.quotes.insert(key, outcome.clone());
        outcome
    }

    /// Price history for one id over a trailing window, memoized per (id, days).
    pub async fn history(&self, id: &str, days: u32, reload: bool) -> CachedFetch<Vec<PricePoint>> {
        let key = (id.to_string(), days);

        if reload {
            self.history.invalidate(&key);
        }
        if let Some(hit) = self.history.get(&key) {
            return hit;
        }

        let outcome = match self.source.fetch_history(id, days).await {
            Ok(points) => CachedFetch { value: points, error: None },
            Err(e) => {
                tracing::warn!("history fetch failed for {id}: {e:#}");
                CachedFetch {
                    value: Vec::new(),
                    error: Some(format!("Error fetching historical data: {e:#}")),
                }
            }
        };
        self.history.insert(key, outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        quote_calls: AtomicUsize,
        history_calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                quote_calls: AtomicUsize::new(0),
                history_calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl MarketDataSource for CountingSource {
        async fn fetch_quotes(&self, ids: &[String]) -> Result<HashMap<String, Quote>> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("boom"));
            }
            Ok(ids
                .iter()
                .map(|id| {
                    (
                        id.clone(),
                        Quote {
                            price_usd: Some(50_000.0),
                            volume_24h_usd: Some(1_000_000.0),
                            market_cap_usd: Some(900_000_000_000.0),
                        },
                    )
                })
                .collect())
        }

        async fn fetch_history(&self, _id: &str, _window_days: u32) -> Result<Vec<PricePoint>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("boom"));
            }
            Ok(vec![
                PricePoint { ts_ms: 0, price: 1.0 },
                PricePoint { ts_ms: 60_000, price: 2.0 },
            ])
        }
    }

    fn ids() -> Vec<String> {
        vec!["bitcoin".to_string(), "ethereum".to_string()]
    }

    #[tokio::test]
    async fn repeated_quote_calls_hit_upstream_once() {
        let source = CountingSource::new(false);
        let svc = MarketService::new(source.clone(), Duration::from_secs(60), Duration::from_secs(60));

        let first = svc.quotes(&ids(), false).await;
        let second = svc.quotes(&ids(), false).await;

        assert_eq!(source.quote_calls.load(Ordering::SeqCst), 1);
        assert!(first.error.is_none());
        assert_eq!(
            first.value.get("bitcoin").and_then(|q| q.price_usd),
            second.value.get("bitcoin").and_then(|q| q.price_usd),
        );
    }

    #[tokio::test]
    async fn id_order_does_not_split_the_memo() {
        let source = CountingSource::new(false);
        let svc = MarketService::new(source.clone(), Duration::from_secs(60), Duration::from_secs(60));

        svc.quotes(&ids(), false).await;
        svc.quotes(&["ethereum".to_string(), "bitcoin".to_string()], false).await;

        assert_eq!(source.quote_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_memoized_for_the_ttl() {
        let source = CountingSource::new(true);
        let svc = MarketService::new(source.clone(), Duration::from_secs(60), Duration::from_secs(60));

        let first = svc.quotes(&ids(), false).await;
        let second = svc.quotes(&ids(), false).await;

        assert_eq!(source.quote_calls.load(Ordering::SeqCst), 1);
        assert!(first.value.is_empty());
        assert!(first.error.as_deref().unwrap_or_default().starts_with("Error fetching crypto data:"));
        assert_eq!(first.error, second.error);
    }

    #[tokio::test]
    async fn reload_bypasses_a_live_entry() {
        let source = CountingSource::new(false);
        let svc = MarketService::new(source.clone(), Duration::from_secs(60), Duration::from_secs(60));

        svc.quotes(&ids(), false).await;
        svc.quotes(&ids(), true).await;

        assert_eq!(source.quote_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn history_memoizes_per_window() {
        let source = CountingSource::new(false);
        let svc = MarketService::new(source.clone(), Duration::from_secs(60), Duration::from_secs(60));

        svc.history("bitcoin", 1, false).await;
        svc.history("bitcoin", 1, false).await;
        svc.history("bitcoin", 7, false).await;

        assert_eq!(source.history_calls.load(Ordering::SeqCst), 2);
    }
}
