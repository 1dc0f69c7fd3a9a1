//! Guidance ranker.
//!
//! A stable sort, descending by severity weight (critical=4, high=3,
//! medium=2, low=1). Items of equal severity keep their emission order.
//! Nothing is dropped, merged or deduplicated here; repeated conditions are
//! handled downstream through insight acknowledgement.

use std::collections::BTreeMap;

use crate::types::{GuidanceItem, Module};

/// Rank guidance items by severity.
pub fn rank(mut items: Vec<GuidanceItem>) -> Vec<GuidanceItem> {
    // `sort_by` is stable; do not replace with `sort_unstable_by`.
    items.sort_by(|a, b| b.severity.weight().cmp(&a.severity.weight()));
    items
}

/// Merge several modules' guidance and rank the result.
///
/// Lists are concatenated in module order before ranking, so ties across
/// modules resolve in that order.
pub fn rank_all(by_module: BTreeMap<Module, Vec<GuidanceItem>>) -> Vec<GuidanceItem> {
    rank(by_module.into_values().flatten().collect())
}
