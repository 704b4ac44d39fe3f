use serde::Serialize;

/// A tracked asset: CoinGecko id plus display name and ticker symbol.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Asset {
    pub id: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

/// The assets the dashboard tracks.  Quotes for all of them are fetched in a
/// single upstream call, so the list doubles as the quote-request id set.
pub const ASSETS: &[Asset] = &[
    Asset { id: "bitcoin", name: "Bitcoin", symbol: "BTC" },
    Asset { id: "ethereum", name: "Ethereum", symbol: "ETH" },
];

/// Look up a tracked asset by its CoinGecko id.
pub fn find(id: &str) -> Option<&'static Asset> {
    ASSETS.iter().find(|a| a.id == id)
}

/// All tracked ids, in declaration order.
pub fn ids() -> Vec<String> {
    ASSETS.iter().map(|a| a.id.to_string()).collect()
}
