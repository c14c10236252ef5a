use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::Venue;
use crate::values::Amount;

/// Balance of a single asset on one venue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    /// Available for trading or transfer
    pub free: Amount,
    /// Free plus locked
    pub total: Amount,
}

impl AssetBalance {
    pub fn new(free: Amount, total: Amount) -> Self {
        Self { free, total }
    }

    /// Balance with nothing locked
    pub fn unlocked(amount: Amount) -> Self {
        Self {
            free: amount,
            total: amount,
        }
    }
}

/// Balances of one venue keyed by asset (`{currency: {free, total}}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(pub HashMap<String, AssetBalance>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, asset: impl Into<String>, balance: AssetBalance) -> Self {
        self.0.insert(asset.into(), balance);
        self
    }

    pub fn get(&self, asset: &str) -> Option<&AssetBalance> {
        self.0.get(asset)
    }

    /// Free amount of an asset, zero when the venue does not hold it
    pub fn free(&self, asset: &str) -> Amount {
        self.0.get(asset).map(|b| b.free).unwrap_or(Decimal::ZERO)
    }

    pub fn total(&self, asset: &str) -> Amount {
        self.0.get(asset).map(|b| b.total).unwrap_or(Decimal::ZERO)
    }
}

/// Free quote-asset funds per venue, refreshed from the gateway.
///
/// Only valid for the call that fetched it; never cached across admissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountBalances {
    pub available: BTreeMap<Venue, Amount>,
}

impl AccountBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, venue: Venue, amount: Amount) {
        self.available.insert(venue, amount);
    }

    pub fn get(&self, venue: Venue) -> Amount {
        self.available.get(&venue).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum across all venues
    pub fn total(&self) -> Amount {
        self.available.values().copied().sum()
    }

    /// Share of the total held by a venue, in percent
    pub fn share_pct(&self, venue: Venue) -> Decimal {
        let total = self.total();
        if total <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.get(venue) / total * Decimal::ONE_HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balances_free_defaults_to_zero() {
        let balances = Balances::new().with_asset("USDT", AssetBalance::new(dec!(90), dec!(100)));
        assert_eq!(balances.free("USDT"), dec!(90));
        assert_eq!(balances.total("USDT"), dec!(100));
        assert_eq!(balances.free("BTC"), Decimal::ZERO);
    }

    #[test]
    fn test_balances_json_shape() {
        let json = r#"{"USDT":{"free":"12.5","total":"20"}}"#;
        let balances: Balances = serde_json::from_str(json).unwrap();
        assert_eq!(balances.free("USDT"), dec!(12.5));
    }

    #[test]
    fn test_account_share() {
        let mut balances = AccountBalances::new();
        balances.set(Venue::Spot, dec!(600));
        balances.set(Venue::Margin, dec!(250));
        balances.set(Venue::Futures, dec!(150));

        assert_eq!(balances.total(), dec!(1000));
        assert_eq!(balances.share_pct(Venue::Spot), dec!(60));
        assert_eq!(balances.share_pct(Venue::Futures), dec!(15));
    }

    #[test]
    fn test_empty_account_share_is_zero() {
        let balances = AccountBalances::new();
        assert_eq!(balances.share_pct(Venue::Spot), Decimal::ZERO);
    }
}
