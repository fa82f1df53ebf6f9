//! Sweep and dry-run report types.
//!
//! Every non-send must be attributable to a concrete condition so operators
//! can tell "working as intended" from "broken".

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::scheduler::WeightDetail;

/// Why a user did or did not receive a notification during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepDisposition {
    /// Notification delivered and the sent marker persisted.
    Sent,
    /// Already sent today and the sweep was not forced.
    SkippedAlreadySent,
    /// Local time has not reached the profile's `email_time` yet.
    SkippedTooEarly,
    /// The profile's `email_time` did not parse as `HH:MM`.
    SkippedBadEmailTime,
    /// No items cleared the eligibility filter; the user stays unmarked.
    SkippedNoEligible,
    /// Selection came back empty.
    SkippedEmptySelection,
    /// Items could not be fetched for this user.
    FetchFailed,
    /// The notification call failed or timed out.
    SendFailed,
    /// The notification went out but the sent marker did not persist.
    MarkFailed,
}

/// Outcome of processing one user within a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct UserSweepRecord {
    pub user_id: Uuid,
    pub email: String,
    pub disposition: SweepDisposition,
    /// How many items were selected (0 unless selection ran).
    pub selected: usize,
    /// Diagnostic detail for failures and config skips.
    pub detail: Option<String>,
}

/// Aggregate result of one full sweep over all users.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub force: bool,
    pub users_seen: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub records: Vec<UserSweepRecord>,
}

/// Result of a sweep trigger: either the sweep ran, or another sweep was
/// already in flight and this trigger was coalesced (dropped, not queued).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SweepOutcome {
    Completed(SweepSummary),
    Coalesced,
}

/// Gate evaluation for the diagnostics dry run: the condition that would
/// stop a real dispatch right now, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum GateStatus {
    /// All gates pass; a real sweep would proceed to selection.
    Ready,
    AlreadySentToday,
    TooEarly { email_time: String },
    BadEmailTime { raw: String },
}

/// One item in a dry-run report.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunItem {
    pub item_id: Uuid,
    pub title: String,
    pub link: String,
    pub weight: WeightDetail,
    pub selected: bool,
}

/// Full dry-run report for one user: every active item's weight detail,
/// the eligible subset, and the subset the sampler would currently select.
/// Nothing is sent and no state is mutated.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunReport {
    pub user_id: Uuid,
    pub email: String,
    pub items_per_day: u32,
    pub min_revisit_days: u32,
    pub gate: GateStatus,
    pub total_items: usize,
    pub eligible_count: usize,
    pub selected_count: usize,
    pub items: Vec<DryRunItem>,
}
