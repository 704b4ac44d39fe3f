use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};

use crate::market::wire;
use crate::market::{MarketDataSource, PricePoint, Quote};

/// CoinGecko-backed market data source.
///
/// Spot quotes come from `/simple/price` with volume and market cap included;
/// history comes from `/coins/{id}/market_chart/range`.
pub struct CoinGeckoClient {
    client: Client,
    base: String,
}

impl CoinGeckoClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("coingecko: build http client")?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.base, path)).context("coingecko: invalid api base")
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    async fn fetch_quotes(&self, ids: &[String]) -> Result<HashMap<String, Quote>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut url = self.endpoint("simple/price")?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("ids", &ids.join(","));
            qp.append_pair("vs_currencies", "usd");
            qp.append_pair("include_market_cap", "true");
            qp.append_pair("include_24hr_vol", "true");
        }

        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .context("coingecko: request failed")?
            .error_for_status()
            .context("coingecko: non-success status")?;

        let parsed: HashMap<String, wire::PriceEntry> =
            resp.json().await.context("coingecko: parse JSON failed")?;

        // Ids absent from the response simply stay absent; the presenter
        // falls back to zeroes for them.
        Ok(parsed
            .into_iter()
            .map(|(id, entry)| {
                (
                    id,
                    Quote {
                        price_usd: entry.usd,
                        volume_24h_usd: entry.usd_24h_vol,
                        market_cap_usd: entry.usd_market_cap,
                    },
                )
            })
            .collect())
    }

    async fn fetch_history(&self, id: &str, window_days: u32) -> Result<Vec<PricePoint>> {
        let to = Utc::now();
        let from = to - chrono::Duration::days(i64::from(window_days));

        let mut url = self.endpoint(&format!("coins/{id}/market_chart/range"))?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("vs_currency", "usd");
            qp.append_pair("from", &from.timestamp().to_string());
            qp.append_pair("to", &to.timestamp().to_string());
        }

        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .context("coingecko: request failed")?
            .error_for_status()
            .context("coingecko: non-success status")?;

        let chart: wire::MarketChart = resp.json().await.context("coingecko: parse JSON failed")?;

        Ok(chart
            .prices
            .into_iter()
            .map(|(ts_ms, price)| PricePoint {
                ts_ms: ts_ms as i64,
                price,
            })
            .collect())
    }
}
