//! Aggregation Engine
//!
//! The shared analytic core behind every report: a date predicate that scopes
//! records by month/day, and a small set of generic grouping/ratio primitives
//! that the query services compose. All functions here are pure over a
//! snapshot slice.

pub mod predicate;
pub mod primitives;

pub use predicate::DatePredicate;
pub use primitives::{group_count, group_sum, pct_change, ratio_pct, top_entry};
