//! Weighted sampling without replacement, plus seed derivation.
//!
//! One sampling function, two seeds: the interactive "today" view passes
//! [`day_seed`] so the selection is stable for a whole calendar day, while
//! the dispatch sweep passes [`fresh_seed`] so repeated sweeps on the same
//! day need not reselect the same items. That asymmetry is deliberate.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use crate::model::Item;
use crate::scheduler::weight::compute_weight;

/// Deterministic seed for a calendar day: `year * 10000 + month * 100 + day`.
///
/// Same date (any time of day) yields the same seed; a date rollover changes
/// it.
pub fn day_seed(date: NaiveDate) -> u64 {
    date.year() as u64 * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day())
}

/// Time-derived seed for the dispatch path: changes on every call.
pub fn fresh_seed(now: DateTime<Utc>) -> u64 {
    now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_millis()) as u64
}

/// Pick `n` items by weighted randomness without replacement.
///
/// Identical `(items, n, seed)` always yields an identical ordered
/// selection (weights are evaluated at `now`, so `now` is part of the
/// determinism contract too). Callers wanting day-stable output must also
/// present the candidates in a stable order.
///
/// If `n >= items.len()` all items are returned in their original order and
/// no randomness is consumed. The generator is private to the call -- no
/// shared mutable state between concurrent sweeps.
pub fn select_weighted(items: &[Item], n: usize, seed: u64, now: DateTime<Utc>) -> Vec<Item> {
    if items.len() <= n {
        return items.to_vec();
    }

    let mut remaining: Vec<Item> = items.to_vec();
    let mut selected = Vec::with_capacity(n);
    let mut rng = Mcg128Xsl64::seed_from_u64(seed);

    for _ in 0..n {
        if remaining.is_empty() {
            break;
        }

        // Membership changed last round, so total weight is recomputed.
        let total_weight: f64 = remaining.iter().map(|item| compute_weight(item, now)).sum();

        if total_weight <= 0.0 {
            // Defensive fallback; the 1.0 floor means this should not occur.
            let idx = rng.gen_range(0..remaining.len());
            selected.push(remaining.remove(idx));
            continue;
        }

        // Roulette-wheel: walk candidates accumulating weight until the
        // cumulative sum reaches the drawn value.
        let value = rng.gen::<f64>() * total_weight;
        let mut cumulative = 0.0;
        let mut pick = remaining.len() - 1;
        for (idx, item) in remaining.iter().enumerate() {
            cumulative += compute_weight(item, now);
            if cumulative >= value {
                pick = idx;
                break;
            }
        }
        selected.push(remaining.remove(pick));
    }

    selected
}
