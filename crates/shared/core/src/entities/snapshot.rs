use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticker as returned by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    /// Last traded price
    pub last: Decimal,
    /// 24h change in percent
    pub percentage: Option<Decimal>,
    /// 24h volume in the quote asset
    pub quote_volume: Option<Decimal>,
}

/// Market view attached to a proposal, used only for sanity bounds.
///
/// Values are floats: indicators come out of numeric pipelines that can
/// produce NaN or infinities, and those must be representable to be rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: f64,
    #[serde(default)]
    pub change_pct: Option<f64>,
    #[serde(default)]
    pub quote_volume: Option<f64>,
    /// Bounded oscillator, e.g. RSI
    #[serde(default)]
    pub rsi: Option<f64>,
    /// Any other numeric indicator, only checked for finiteness
    #[serde(default)]
    pub indicators: BTreeMap<String, f64>,
}

impl MarketSnapshot {
    pub fn new(price: f64) -> Self {
        Self {
            price,
            ..Default::default()
        }
    }

    pub fn with_rsi(mut self, rsi: f64) -> Self {
        self.rsi = Some(rsi);
        self
    }

    pub fn with_change_pct(mut self, change_pct: f64) -> Self {
        self.change_pct = Some(change_pct);
        self
    }

    pub fn with_quote_volume(mut self, quote_volume: f64) -> Self {
        self.quote_volume = Some(quote_volume);
        self
    }

    pub fn with_indicator(mut self, name: impl Into<String>, value: f64) -> Self {
        self.indicators.insert(name.into(), value);
        self
    }

    /// Build from a gateway ticker. A price that does not fit an f64 becomes NaN
    /// so that it is rejected downstream instead of defaulting to zero.
    pub fn from_ticker(ticker: &Ticker) -> Self {
        Self {
            price: ticker.last.to_f64().unwrap_or(f64::NAN),
            change_pct: ticker.percentage.and_then(|p| p.to_f64()),
            quote_volume: ticker.quote_volume.and_then(|v| v.to_f64()),
            rsi: None,
            indicators: BTreeMap::new(),
        }
    }
}
