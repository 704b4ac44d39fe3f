use serde::Serialize;

use crate::assets::Asset;
use crate::market::Quote;

/// A labelled dashboard metric, value already currency-formatted.
#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

/// Render a USD amount as `$1,234,567.89`: dollar sign, thousands
/// separators, exactly two decimals.  Negative amounts carry a leading `-`.
pub fn format_usd(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = format!("{:.2}", value.abs());
    let (int_part, frac_part) = match cents.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (cents.as_str(), "00"),
    };
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}.{frac_part}", group_thousands(int_part))
}

fn group_thousands(digits: &str) -> String {
    digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",")
}

/// The spoken/displayed report: three sentences covering price, volume and
/// market cap.  Missing figures read as zero rather than dropping a sentence.
pub fn report_text(asset: &Asset, quote: &Quote) -> String {
    format!(
        "The current price of {} is {}. The 24-hour trading volume is {}, and the market capitalization is {}.",
        asset.name,
        format_usd(quote.price_usd.unwrap_or(0.0)),
        format_usd(quote.volume_24h_usd.unwrap_or(0.0)),
        format_usd(quote.market_cap_usd.unwrap_or(0.0)),
    )
}

/// The three metric tiles shown above the report.
pub fn metrics(quote: &Quote) -> Vec<Metric> {
    vec![
        Metric {
            label: "Price (USD)",
            value: format_usd(quote.price_usd.unwrap_or(0.0)),
        },
        Metric {
            label: "24h Volume (USD)",
            value: format_usd(quote.volume_24h_usd.unwrap_or(0.0)),
        },
        Metric {
            label: "Market Cap (USD)",
            value: format_usd(quote.market_cap_usd.unwrap_or(0.0)),
        },
    ]
}
