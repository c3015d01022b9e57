//! Asset identity and the closed category set.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    AggressiveGrowth,
    DefensiveLowVol,
    Commodities,
    Reits,
    GlobalThematic,
    BondsHedges,
    Crypto,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::AggressiveGrowth,
        Category::DefensiveLowVol,
        Category::Commodities,
        Category::Reits,
        Category::GlobalThematic,
        Category::BondsHedges,
        Category::Crypto,
    ];

    /// Key used in the `[universe]` config section.
    pub fn config_key(self) -> &'static str {
        match self {
            Category::AggressiveGrowth => "aggressive_growth",
            Category::DefensiveLowVol => "defensive_low_vol",
            Category::Commodities => "commodities",
            Category::Reits => "reits",
            Category::GlobalThematic => "global_thematic",
            Category::BondsHedges => "bonds_hedges",
            Category::Crypto => "crypto",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::AggressiveGrowth => "Aggressive Growth",
            Category::DefensiveLowVol => "Defense / Low Vol",
            Category::Commodities => "Commodities",
            Category::Reits => "REITs",
            Category::GlobalThematic => "Global / Thematic",
            Category::BondsHedges => "Bonds / Hedges",
            Category::Crypto => "Crypto",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.config_key() == key || c.label().to_lowercase() == key)
            .ok_or_else(|| UnknownCategory(s.trim().to_string()))
    }
}

/// Immutable identity of a tradable asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Asset {
    pub ticker: String,
    pub category: Category,
}

impl Asset {
    pub fn new(ticker: impl Into<String>, category: Category) -> Self {
        Asset {
            ticker: ticker.into(),
            category,
        }
    }
}
