//! Constrained top-N selection and score-proportional weighting.
//!
//! 1. Drop ineligible scores and non-positive momentum.
//! 2. Rank by ratio descending, ticker ascending on ties.
//! 3. Admit greedily; each admission occupies a `1 / top_n` slot of its
//!    category, and a category may not hold more slots than the cap allows.
//! 4. Weight admitted assets by `ratio / sum(ratio)`.
//! 5. Enforce the cap on the normalized weights by rescale-and-redistribute
//!    (see [`apply_category_caps`]).

use crate::domain::asset::{Asset, Category};
use crate::domain::signal::TickerScore;
use crate::domain::universe::CategoryMap;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Slack tolerated on category totals after normalization.
pub const CAP_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionParams {
    pub top_n: usize,
    pub max_category_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationEntry {
    pub asset: Asset,
    pub ratio: f64,
    pub weight: f64,
}

/// Target weights for one rebalance date, in rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAllocation {
    pub date: NaiveDate,
    pub entries: Vec<AllocationEntry>,
}

impl TargetAllocation {
    pub fn empty(date: NaiveDate) -> Self {
        TargetAllocation {
            date,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    pub fn weight_of(&self, ticker: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.asset.ticker == ticker)
            .map(|e| e.weight)
    }

    pub fn category_weights(&self) -> BTreeMap<Category, f64> {
        let mut totals = BTreeMap::new();
        for entry in &self.entries {
            *totals.entry(entry.asset.category).or_insert(0.0) += entry.weight;
        }
        totals
    }
}

pub fn select(
    date: NaiveDate,
    scores: &[TickerScore],
    categories: &CategoryMap,
    params: &SelectionParams,
) -> TargetAllocation {
    if params.top_n == 0 {
        return TargetAllocation::empty(date);
    }

    let mut ranked: Vec<(Asset, f64)> = scores
        .iter()
        .filter_map(|ts| {
            let score = ts.outcome.score()?;
            if !(score.momentum > 0.0) || !score.ratio.is_finite() || !(score.ratio > 0.0) {
                return None;
            }
            let category = categories.category_of(&ts.ticker)?;
            Some((Asset::new(ts.ticker.clone(), category), score.ratio))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.ticker.cmp(&b.0.ticker)));

    let slot = 1.0 / params.top_n as f64;
    let mut slots_used: BTreeMap<Category, usize> = BTreeMap::new();
    let mut admitted: Vec<(Asset, f64)> = Vec::with_capacity(params.top_n);

    for (asset, ratio) in ranked {
        if admitted.len() >= params.top_n {
            break;
        }
        let used = slots_used.get(&asset.category).copied().unwrap_or(0);
        if (used + 1) as f64 * slot > params.max_category_weight + CAP_EPSILON {
            continue;
        }
        slots_used.insert(asset.category, used + 1);
        admitted.push((asset, ratio));
    }

    let total: f64 = admitted.iter().map(|(_, r)| r).sum();
    if admitted.is_empty() || total <= 0.0 {
        return TargetAllocation::empty(date);
    }

    let mut entries: Vec<AllocationEntry> = admitted
        .into_iter()
        .map(|(asset, ratio)| AllocationEntry {
            asset,
            ratio,
            weight: ratio / total,
        })
        .collect();

    apply_category_caps(&mut entries, params.max_category_weight);

    TargetAllocation { date, entries }
}

/// Scales every category above `cap` down onto the cap and hands the freed
/// weight to the remaining categories pro-rata to their current weights.
/// Repeats until no category is over the cap; a capped category never
/// receives weight again. Weight with nowhere to go is left as cash.
pub fn apply_category_caps(entries: &mut [AllocationEntry], cap: f64) {
    let mut frozen: BTreeSet<Category> = BTreeSet::new();

    loop {
        let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
        for entry in entries.iter() {
            *totals.entry(entry.asset.category).or_insert(0.0) += entry.weight;
        }

        let over: Vec<(Category, f64)> = totals
            .into_iter()
            .filter(|(c, total)| !frozen.contains(c) && *total > cap + CAP_EPSILON)
            .collect();
        if over.is_empty() {
            return;
        }

        let mut freed = 0.0;
        for (category, total) in &over {
            let factor = cap / total;
            for entry in entries.iter_mut().filter(|e| e.asset.category == *category) {
                entry.weight *= factor;
            }
            freed += total - cap;
            frozen.insert(*category);
        }

        let receiving: f64 = entries
            .iter()
            .filter(|e| !frozen.contains(&e.asset.category))
            .map(|e| e.weight)
            .sum();
        if receiving <= 0.0 {
            return;
        }

        for entry in entries
            .iter_mut()
            .filter(|e| !frozen.contains(&e.asset.category))
        {
            entry.weight += freed * entry.weight / receiving;
        }
    }
}
