use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three independent capital pools on the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Spot,
    Margin,
    Futures,
}

impl Venue {
    /// All venues, in allocation order
    pub const ALL: [Venue; 3] = [Venue::Spot, Venue::Margin, Venue::Futures];

    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Spot => "spot",
            Venue::Margin => "margin",
            Venue::Futures => "futures",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Venue::Spot),
            "margin" => Ok(Venue::Margin),
            "futures" | "future" => Ok(Venue::Futures),
            other => Err(format!("unknown venue: {other}")),
        }
    }
}

/// Kind of trade a proposal asks for. Each kind is funded from exactly one venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Spot,
    Margin,
    Futures,
}

impl TradeType {
    /// Venue whose balance funds this kind of trade
    pub fn venue(&self) -> Venue {
        match self {
            TradeType::Spot => Venue::Spot,
            TradeType::Margin => Venue::Margin,
            TradeType::Futures => Venue::Futures,
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.venue().as_str())
    }
}
