//! Tiered per-share commission schedule.
//!
//! raw = sum over share bands of (shares in band * band rate)
//! fee = min(max(raw, min_fee), max_pct * notional)
//!
//! The percentage cap is applied last, so it wins over the minimum on very
//! small trades.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionTier {
    /// Upper bound of the band in cumulative shares; `None` is unbounded.
    pub up_to_shares: Option<u64>,
    pub per_share_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommissionModel {
    pub tiers: Vec<CommissionTier>,
    pub min_fee: f64,
    pub max_pct: f64,
}

impl Default for CommissionModel {
    fn default() -> Self {
        CommissionModel {
            tiers: vec![
                CommissionTier {
                    up_to_shares: Some(300_000),
                    per_share_rate: 0.0035,
                },
                CommissionTier {
                    up_to_shares: Some(3_000_000),
                    per_share_rate: 0.0020,
                },
                CommissionTier {
                    up_to_shares: Some(20_000_000),
                    per_share_rate: 0.0015,
                },
                CommissionTier {
                    up_to_shares: Some(100_000_000),
                    per_share_rate: 0.0010,
                },
                CommissionTier {
                    up_to_shares: None,
                    per_share_rate: 0.0005,
                },
            ],
            min_fee: 1.0,
            max_pct: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TierParseError {
    #[error("empty tier")]
    Empty,
    #[error("malformed tier '{0}', expected <shares>:<rate> or *:<rate>")]
    Malformed(String),
    #[error("tier bounds must be strictly increasing")]
    Unordered,
    #[error("only the last tier may be unbounded")]
    UnboundedNotLast,
    #[error("negative rate in tier '{0}'")]
    NegativeRate(String),
}

/// Parses `300000:0.0035, 3000000:0.002, *:0.0005`.
pub fn parse_tiers(input: &str) -> Result<Vec<CommissionTier>, TierParseError> {
    let mut tiers: Vec<CommissionTier> = Vec::new();

    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(TierParseError::Empty);
        }
        let (bound, rate) = token
            .split_once(':')
            .ok_or_else(|| TierParseError::Malformed(token.to_string()))?;
        let per_share_rate: f64 = rate
            .trim()
            .parse()
            .map_err(|_| TierParseError::Malformed(token.to_string()))?;
        if per_share_rate < 0.0 || !per_share_rate.is_finite() {
            return Err(TierParseError::NegativeRate(token.to_string()));
        }
        let up_to_shares = match bound.trim() {
            "*" => None,
            b => Some(
                b.parse::<u64>()
                    .map_err(|_| TierParseError::Malformed(token.to_string()))?,
            ),
        };

        if let Some(last) = tiers.last() {
            match (last.up_to_shares, up_to_shares) {
                (None, _) => return Err(TierParseError::UnboundedNotLast),
                (Some(prev), Some(next)) if next <= prev => return Err(TierParseError::Unordered),
                _ => {}
            }
        }
        tiers.push(CommissionTier {
            up_to_shares,
            per_share_rate,
        });
    }

    Ok(tiers)
}

impl CommissionModel {
    /// Fee for a single executed trade.
    pub fn fee(&self, shares: u64, price: f64) -> f64 {
        if shares == 0 {
            return 0.0;
        }
        let notional = shares as f64 * price.abs();
        let floored = self.per_share_charge(shares).max(self.min_fee);
        floored.min(notional * self.max_pct)
    }

    fn per_share_charge(&self, shares: u64) -> f64 {
        let mut charge = 0.0;
        let mut lower = 0u64;

        for tier in &self.tiers {
            let upper = tier.up_to_shares.unwrap_or(u64::MAX);
            if shares <= lower {
                break;
            }
            let in_band = shares.min(upper).saturating_sub(lower);
            charge += in_band as f64 * tier.per_share_rate;
            lower = lower.max(upper);
        }

        // Shares past the last bounded tier are charged at its rate.
        if shares > lower {
            if let Some(last) = self.tiers.last() {
                charge += (shares - lower) as f64 * last.per_share_rate;
            }
        }
        charge
    }
}
