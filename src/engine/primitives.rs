//! Generic grouping and ratio primitives
//!
//! Every report is a thin composition of these: fold records into an
//! accumulator keyed by a grouping dimension, then derive ratios from paired
//! counters. Denominator-zero cases always come back as `None`, never as a
//! NaN or an infinity.

use crate::record::DealRecord;
use std::collections::BTreeMap;

/// Sum a projected value per grouping key
///
/// `key_fn` returning `None` drops the record from the grouping; `value_fn`
/// returning `None` marks a per-record coercion failure and skips only that
/// record's contribution.
pub fn group_sum<'a, K, I, F, G>(records: I, key_fn: F, value_fn: G) -> BTreeMap<K, f64>
where
    K: Ord,
    I: IntoIterator<Item = &'a DealRecord>,
    F: Fn(&DealRecord) -> Option<K>,
    G: Fn(&DealRecord) -> Option<f64>,
{
    let mut totals = BTreeMap::new();
    for record in records {
        let key = match key_fn(record) {
            Some(key) => key,
            None => continue,
        };
        let value = match value_fn(record) {
            Some(value) => value,
            None => continue,
        };
        *totals.entry(key).or_insert(0.0) += value;
    }
    totals
}

/// Count records per grouping key
pub fn group_count<'a, K, I, F>(records: I, key_fn: F) -> BTreeMap<K, u64>
where
    K: Ord,
    I: IntoIterator<Item = &'a DealRecord>,
    F: Fn(&DealRecord) -> Option<K>,
{
    let mut counts = BTreeMap::new();
    for record in records {
        if let Some(key) = key_fn(record) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// `numerator / denominator * 100`, `None` when the denominator is 0
///
/// With `numerator <= denominator` the result stays within [0, 100].
pub fn ratio_pct(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64 * 100.0)
}

/// Percentage change from `previous` to `current`
///
/// `None` when the previous value is 0: the change is undefined there, not
/// infinite.
pub fn pct_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

/// Arg-max over a grouping map
///
/// Empty map yields `None`. Iteration is key-ascending and only a strictly
/// greater value replaces the candidate, so ties resolve to the smallest key.
pub fn top_entry<K, V>(map: &BTreeMap<K, V>) -> Option<(&K, &V)>
where
    K: Ord,
    V: PartialOrd,
{
    let mut best: Option<(&K, &V)> = None;
    for (key, value) in map {
        match best {
            Some((_, best_value)) if *value <= *best_value => {}
            _ => best = Some((key, value)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DealRecord, DealStage};
    use chrono::NaiveDate;

    fn deal(agent: &str, value: f64) -> DealRecord {
        DealRecord {
            close_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            engage_date: None,
            close_value: Some(value),
            deal_stage: DealStage::Won,
            status: None,
            agent: Some(agent.to_string()),
            manager: None,
            account: None,
            product: None,
            sector: None,
            region: None,
            office_location: None,
        }
    }

    #[test]
    fn group_sum_accumulates_per_key() {
        let records = vec![deal("A", 100.0), deal("B", 50.0), deal("A", 25.0)];
        let totals = group_sum(&records, |r| r.agent.clone(), |r| r.close_value);

        assert_eq!(totals.get("A"), Some(&125.0));
        assert_eq!(totals.get("B"), Some(&50.0));
    }

    #[test]
    fn group_sum_skips_coercion_failures_only() {
        let mut bad = deal("A", 0.0);
        bad.close_value = None;
        let records = vec![deal("A", 100.0), bad];

        let totals = group_sum(&records, |r| r.agent.clone(), |r| r.close_value);
        assert_eq!(totals.get("A"), Some(&100.0));
    }

    #[test]
    fn ratio_pct_guards_zero_denominator() {
        assert_eq!(ratio_pct(1, 2), Some(50.0));
        assert_eq!(ratio_pct(0, 0), None);
        assert_eq!(ratio_pct(3, 3), Some(100.0));
    }

    #[test]
    fn pct_change_is_none_for_zero_previous() {
        assert_eq!(pct_change(150.0, 100.0), Some(50.0));
        assert_eq!(pct_change(50.0, 100.0), Some(-50.0));
        assert_eq!(pct_change(100.0, 0.0), None);
    }

    #[test]
    fn top_entry_breaks_ties_by_smallest_key() {
        let mut map = BTreeMap::new();
        assert!(top_entry(&map).is_none());

        map.insert("B".to_string(), 10.0);
        map.insert("A".to_string(), 10.0);
        map.insert("C".to_string(), 5.0);

        let (key, value) = top_entry(&map).unwrap();
        assert_eq!(key, "A");
        assert_eq!(*value, 10.0);
    }
}
