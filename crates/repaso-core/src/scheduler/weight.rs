//! Revisit-urgency weight model.
//!
//! Every active item gets a positive score expressing how urgently it wants
//! to be revisited:
//!
//! - Older items gain priority, but with diminishing returns (sqrt curve).
//! - The longer since the last revisit, the more urgent.
//! - Items with many revisits slowly fade but never disappear.
//! - Items added in the last two days get a short cooldown so they don't
//!   spam immediately.
//! - Minimum weight is always 1.0 -- no item is ever fully silenced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Item;

/// Weight at or above which an item is `High` priority.
pub const HIGH_PRIORITY_THRESHOLD: f64 = 10.0;
/// Weight at or above which an item is `Medium` priority.
pub const MEDIUM_PRIORITY_THRESHOLD: f64 = 4.0;

/// Floor below which no weight ever drops.
const MIN_WEIGHT: f64 = 1.0;
/// Never-revisited items treat urgency as this multiple of their age.
const NEVER_REVISITED_URGENCY_BOOST: f64 = 1.5;
/// Each revisit shrinks the decay factor by this rate: 1 / (1 + rate * n).
const REVISIT_DECAY_RATE: f64 = 0.3;
/// Items younger than this many days get the newness cooldown.
const NEWNESS_WINDOW_DAYS: f64 = 2.0;

/// Coarse urgency bucket derived from the weight via fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_weight(weight: f64) -> Self {
        if weight >= HIGH_PRIORITY_THRESHOLD {
            Priority::High
        } else if weight >= MEDIUM_PRIORITY_THRESHOLD {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Scheduling metadata for one item, computed fresh on every evaluation.
///
/// Magnitudes are rounded for presentation (weight and decay to 2 decimals,
/// day counts to 1); the rounding never feeds back into the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightDetail {
    pub item_id: Uuid,
    pub weight: f64,
    pub days_since_added: f64,
    pub days_since_last_revisit: f64,
    pub times_revisited: u32,
    pub revisit_decay: f64,
    pub is_eligible: bool,
    pub priority: Priority,
}

/// Fractional days from `from` to `to`, clamped to zero for instants in the
/// future.
fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_seconds() as f64 / 86_400.0).max(0.0)
}

/// Days since the last revisit; never-revisited items get the urgency boost.
fn days_since_last_revisit(item: &Item, now: DateTime<Utc>, days_since_added: f64) -> f64 {
    match item.last_revisited_at {
        Some(at) => days_between(at, now),
        None => days_since_added * NEVER_REVISITED_URGENCY_BOOST,
    }
}

/// Compute the selection weight of an item at `now`.
///
/// Deterministic given `(item, now)` -- no hidden state.
pub fn compute_weight(item: &Item, now: DateTime<Utc>) -> f64 {
    let days_since_added = days_between(item.added_at, now);
    let since_last_revisit = days_since_last_revisit(item, now, days_since_added);

    // 1. Base age factor: sqrt so older items gain priority with diminishing returns
    let age_factor = (days_since_added + 1.0).sqrt();

    // 2. Urgency factor: linear -- the longer since last revisit, the higher
    let urgency_factor = since_last_revisit;

    // 3. Revisit decay: items slowly fade with revisits but never reach 0
    //    At 0 revisits: 1.0, at 1: 0.77, at 3: 0.53, at 10: 0.25, at 20: 0.14
    let revisit_decay = 1.0 / (1.0 + REVISIT_DECAY_RATE * f64::from(item.times_revisited));

    // 4. Newness cooldown: day 0: 0.3, day 1: 0.65, day 2+: 1.0
    let newness_factor = if days_since_added < NEWNESS_WINDOW_DAYS {
        0.3 + (days_since_added / NEWNESS_WINDOW_DAYS) * 0.7
    } else {
        1.0
    };

    let weight = (age_factor + urgency_factor) * revisit_decay * newness_factor;

    weight.max(MIN_WEIGHT)
}

/// Whether an item may be selected today given the user's minimum revisit
/// gap. Never-revisited items are always eligible, regardless of threshold.
pub fn is_eligible(item: &Item, now: DateTime<Utc>, min_revisit_days: u32) -> bool {
    match item.last_revisited_at {
        None => true,
        Some(at) => days_between(at, now) >= f64::from(min_revisit_days),
    }
}

/// Compute full scheduling metadata for an item.
///
/// Used by the dry-run diagnostics and the interactive views to show users
/// why/when an item might surface.
pub fn compute_weight_detail(item: &Item, now: DateTime<Utc>, min_revisit_days: u32) -> WeightDetail {
    let days_since_added = days_between(item.added_at, now);
    let since_last_revisit = days_since_last_revisit(item, now, days_since_added);

    let weight = compute_weight(item, now);
    let revisit_decay = 1.0 / (1.0 + REVISIT_DECAY_RATE * f64::from(item.times_revisited));

    WeightDetail {
        item_id: item.id,
        weight: round2(weight),
        days_since_added: round1(days_since_added),
        days_since_last_revisit: round1(since_last_revisit),
        times_revisited: item.times_revisited,
        revisit_decay: round2(revisit_decay),
        is_eligible: is_eligible(item, now, min_revisit_days),
        priority: Priority::from_weight(weight),
    }
}

/// Order-preserving filter down to the items eligible for selection today.
pub fn eligible_items(items: &[Item], min_revisit_days: u32, now: DateTime<Utc>) -> Vec<Item> {
    items
        .iter()
        .filter(|item| is_eligible(item, now, min_revisit_days))
        .cloned()
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
