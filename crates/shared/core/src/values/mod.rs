use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Monetary amount in the quote asset - uses Decimal for precision
pub type Amount = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Symbol identifier for a tradeable pair (e.g. "BTC/USDT")
pub type Symbol = String;
