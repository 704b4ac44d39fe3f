use serde::Deserialize;

/// One asset's entry in a `/simple/price` response.  CoinGecko omits fields
/// it has no data for, so everything is optional.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PriceEntry {
    #[serde(default)]
    pub usd: Option<f64>,
    #[serde(default)]
    pub usd_24h_vol: Option<f64>,
    #[serde(default)]
    pub usd_market_cap: Option<f64>,
}

/// `/coins/{id}/market_chart/range` response.  Each point is
/// `[unix_millis, value]`; timestamps arrive as JSON numbers and may be
/// integer or float formatted, so both halves parse as `f64`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
}
