//! Daily dispatch orchestrator.
//!
//! One sweep walks every registered user, applies the send gates, selects a
//! weighted subset of their eligible items, and hands it to the
//! notification sender. Per user:
//!
//! ```text
//! AlreadySentCheck -> TimeGateCheck -> EligibilityCompute -> Selection
//!     -> Dispatch -> MarkSent
//! ```
//!
//! with early-exit skips from the first three stages. Failures never cross
//! a user boundary: one user's fetch/send/persist error is logged and the
//! sweep moves on. Only a failure to enumerate users aborts a sweep.
//!
//! Sweeps are single-flight: a trigger arriving while a sweep is running is
//! coalesced (dropped), never queued, so an overlong sweep cannot overlap
//! the next timer tick or a manual trigger.

mod report;
mod traits;

pub use report::{
    DryRunItem, DryRunReport, GateStatus, SweepDisposition, SweepOutcome, SweepSummary,
    UserSweepRecord,
};
pub use traits::{ItemRepository, UserDirectory};

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{CoreError, DispatchError};
use crate::model::{Profile, User};
use crate::notify::NotificationSender;
use crate::scheduler::{compute_weight_detail, eligible_items, fresh_seed, select_weighted};

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Composes the scheduling engine with the user directory, item repository,
/// and notification sender. One instance serves every trigger source so the
/// single-flight guard covers them all.
pub struct DispatchOrchestrator {
    users: Arc<dyn UserDirectory>,
    items: Arc<dyn ItemRepository>,
    sender: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    send_timeout: Duration,
    sweep_gate: Mutex<()>,
}

/// Result of the per-user gate checks, shared by the sweep and the dry run.
enum Gate {
    Ready,
    AlreadySent,
    TooEarly(NaiveTime),
    BadEmailTime(String),
}

impl DispatchOrchestrator {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        items: Arc<dyn ItemRepository>,
        sender: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            items,
            sender,
            clock,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            sweep_gate: Mutex::new(()),
        }
    }

    /// Bound the notification call so one hung recipient cannot stall the
    /// rest of the sweep.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Run one full sweep over all users.
    ///
    /// `force` bypasses the already-sent-today check only; the time-of-day
    /// gate still applies even when forced. (Whether force should also
    /// bypass the time gate is an open product question -- current behavior
    /// is intentional and preserved.)
    pub async fn run_sweep(&self, force: bool) -> Result<SweepOutcome, DispatchError> {
        let Ok(_guard) = self.sweep_gate.try_lock() else {
            debug!("sweep already in flight; coalescing trigger");
            return Ok(SweepOutcome::Coalesced);
        };

        let started_at = self.clock.now();
        let users = self
            .users
            .users()
            .await
            .map_err(|e| DispatchError::UserEnumeration(e.to_string()))?;

        let mut records = Vec::with_capacity(users.len());
        let (mut sent, mut skipped, mut failed) = (0usize, 0usize, 0usize);

        for user in &users {
            let record = self.process_user(user, force).await;
            match record.disposition {
                SweepDisposition::Sent => sent += 1,
                SweepDisposition::FetchFailed
                | SweepDisposition::SendFailed
                | SweepDisposition::MarkFailed => failed += 1,
                _ => skipped += 1,
            }
            records.push(record);
        }

        let summary = SweepSummary {
            started_at,
            finished_at: self.clock.now(),
            force,
            users_seen: users.len(),
            sent,
            skipped,
            failed,
            records,
        };
        info!(
            users = summary.users_seen,
            sent, skipped, failed, force, "dispatch sweep complete"
        );
        Ok(SweepOutcome::Completed(summary))
    }

    /// Evaluate the weight model, eligibility, and selection for one user
    /// without sending anything or mutating any state.
    pub async fn dry_run(&self, user_id: uuid::Uuid) -> Result<DryRunReport, CoreError> {
        let users = self
            .users
            .users()
            .await
            .map_err(|e| DispatchError::UserEnumeration(e.to_string()))?;
        let user = users
            .into_iter()
            .find(|u| u.id == user_id)
            .ok_or(DispatchError::UnknownUser { user_id })?;

        let items = self.items.active_items(user.id).await?;
        let now = self.clock.now();
        let items_per_day = user.profile.items_per_day;
        let min_revisit_days = user.profile.min_revisit_days;

        let eligible = eligible_items(&items, min_revisit_days, now);
        let selected = select_weighted(&eligible, items_per_day as usize, fresh_seed(now), now);
        let selected_ids: std::collections::HashSet<uuid::Uuid> =
            selected.iter().map(|i| i.id).collect();

        let gate = match self.check_gates(&user.profile, false) {
            Gate::Ready => GateStatus::Ready,
            Gate::AlreadySent => GateStatus::AlreadySentToday,
            Gate::TooEarly(t) => GateStatus::TooEarly {
                email_time: t.format("%H:%M").to_string(),
            },
            Gate::BadEmailTime(raw) => GateStatus::BadEmailTime { raw },
        };

        let report_items = items
            .iter()
            .map(|item| DryRunItem {
                item_id: item.id,
                title: item.title.clone(),
                link: item.link.clone(),
                weight: compute_weight_detail(item, now, min_revisit_days),
                selected: selected_ids.contains(&item.id),
            })
            .collect();

        Ok(DryRunReport {
            user_id: user.id,
            email: user.email,
            items_per_day,
            min_revisit_days,
            gate,
            total_items: items.len(),
            eligible_count: eligible.len(),
            selected_count: selected.len(),
            items: report_items,
        })
    }

    /// Already-sent and time-of-day gates. The already-sent check is the
    /// only one `force` bypasses.
    fn check_gates(&self, profile: &Profile, force: bool) -> Gate {
        if !force {
            if let Some(last_sent) = profile.last_email_sent_at {
                if self.clock.local_date_of(last_sent) == self.clock.today() {
                    return Gate::AlreadySent;
                }
            }
        }

        if let Some(raw) = profile.email_time.as_deref() {
            match NaiveTime::parse_from_str(raw, "%H:%M") {
                Ok(gate_time) => {
                    if self.clock.time_of_day() < gate_time {
                        return Gate::TooEarly(gate_time);
                    }
                }
                Err(_) => return Gate::BadEmailTime(raw.to_string()),
            }
        }

        Gate::Ready
    }

    async fn process_user(&self, user: &User, force: bool) -> UserSweepRecord {
        let record = |disposition, selected, detail: Option<String>| UserSweepRecord {
            user_id: user.id,
            email: user.email.clone(),
            disposition,
            selected,
            detail,
        };

        match self.check_gates(&user.profile, force) {
            Gate::AlreadySent => {
                return record(SweepDisposition::SkippedAlreadySent, 0, None);
            }
            Gate::TooEarly(gate_time) => {
                return record(
                    SweepDisposition::SkippedTooEarly,
                    0,
                    Some(format!("email_time {}", gate_time.format("%H:%M"))),
                );
            }
            Gate::BadEmailTime(raw) => {
                warn!(user = %user.email, email_time = %raw, "unparseable email_time; skipping user");
                return record(SweepDisposition::SkippedBadEmailTime, 0, Some(raw));
            }
            Gate::Ready => {}
        }

        let items = match self.items.active_items(user.id).await {
            Ok(items) => items,
            Err(e) => {
                warn!(user = %user.email, error = %e, "failed to fetch items; skipping user");
                return record(SweepDisposition::FetchFailed, 0, Some(e.to_string()));
            }
        };

        let now = self.clock.now();
        let eligible = eligible_items(&items, user.profile.min_revisit_days, now);
        if eligible.is_empty() {
            // Intentionally not marked as sent: the user stays eligible for
            // re-evaluation on the next sweep today.
            return record(SweepDisposition::SkippedNoEligible, 0, None);
        }

        let selected = select_weighted(
            &eligible,
            user.profile.items_per_day as usize,
            fresh_seed(now),
            now,
        );
        if selected.is_empty() {
            return record(SweepDisposition::SkippedEmptySelection, 0, None);
        }

        match tokio::time::timeout(self.send_timeout, self.sender.send(&user.email, &selected))
            .await
        {
            Err(_) => {
                let timeout = crate::error::NotifyError::Timeout {
                    timeout_secs: self.send_timeout.as_secs(),
                };
                warn!(user = %user.email, error = %timeout, "notification send timed out");
                record(
                    SweepDisposition::SendFailed,
                    selected.len(),
                    Some(timeout.to_string()),
                )
            }
            Ok(Err(e)) => {
                warn!(user = %user.email, error = %e, "notification send failed");
                record(SweepDisposition::SendFailed, selected.len(), Some(e.to_string()))
            }
            Ok(Ok(())) => {
                match self.users.update_last_sent_at(user.id, self.clock.now()).await {
                    Ok(()) => record(SweepDisposition::Sent, selected.len(), None),
                    Err(e) => {
                        // Notification went out; marker did not persist. The
                        // user remains eligible for retry, keeping delivery
                        // at-least-once with respect to the calendar day.
                        warn!(user = %user.email, error = %e, "failed to persist sent marker");
                        record(
                            SweepDisposition::MarkFailed,
                            selected.len(),
                            Some(e.to_string()),
                        )
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use uuid::Uuid;

    use crate::clock::FixedClock;
    use crate::error::{DatabaseError, NotifyError};
    use crate::model::{Item, Profile};

    struct FakeDirectory {
        users: Vec<User>,
        marks: StdMutex<Vec<(Uuid, DateTime<Utc>)>>,
        fail_enumeration: bool,
        fail_mark: bool,
    }

    impl FakeDirectory {
        fn new(users: Vec<User>) -> Self {
            Self {
                users,
                marks: StdMutex::new(Vec::new()),
                fail_enumeration: false,
                fail_mark: false,
            }
        }

        fn marks(&self) -> Vec<(Uuid, DateTime<Utc>)> {
            self.marks.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn users(&self) -> Result<Vec<User>, DatabaseError> {
            if self.fail_enumeration {
                return Err(DatabaseError::QueryFailed("users table gone".into()));
            }
            Ok(self.users.clone())
        }

        async fn update_last_sent_at(
            &self,
            user_id: Uuid,
            at: DateTime<Utc>,
        ) -> Result<(), DatabaseError> {
            if self.fail_mark {
                return Err(DatabaseError::QueryFailed("disk full".into()));
            }
            self.marks.lock().unwrap().push((user_id, at));
            Ok(())
        }
    }

    struct FakeItems {
        by_user: HashMap<Uuid, Vec<Item>>,
        fail_for: Option<Uuid>,
    }

    #[async_trait]
    impl ItemRepository for FakeItems {
        async fn active_items(&self, user_id: Uuid) -> Result<Vec<Item>, DatabaseError> {
            if self.fail_for == Some(user_id) {
                return Err(DatabaseError::QueryFailed("items query failed".into()));
            }
            Ok(self.by_user.get(&user_id).cloned().unwrap_or_default())
        }
    }

    struct FakeSender {
        sent: StdMutex<Vec<(String, usize)>>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl FakeSender {
        fn new() -> Self {
            Self {
                sent: StdMutex::new(Vec::new()),
                fail: false,
                delay: None,
            }
        }

        fn sent(&self) -> Vec<(String, usize)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSender for FakeSender {
        async fn send(&self, to: &str, items: &[Item]) -> Result<(), NotifyError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(NotifyError::Api {
                    status: 500,
                    message: "provider down".into(),
                });
            }
            self.sent.lock().unwrap().push((to.to_string(), items.len()));
            Ok(())
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    fn make_user(email: &str, profile: Profile) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: String::new(),
            profile,
            created_at: noon() - ChronoDuration::days(365),
        }
    }

    fn stale_items(user_id: Uuid, count: usize, now: DateTime<Utc>) -> Vec<Item> {
        (0..count)
            .map(|i| {
                Item::new(
                    user_id,
                    format!("item {i}"),
                    "https://example.com",
                    now - ChronoDuration::days(30 + i as i64),
                )
            })
            .collect()
    }

    struct Harness {
        directory: Arc<FakeDirectory>,
        sender: Arc<FakeSender>,
        orchestrator: DispatchOrchestrator,
    }

    fn harness(
        users: Vec<User>,
        items: HashMap<Uuid, Vec<Item>>,
        clock: FixedClock,
        sender: FakeSender,
        directory_tweak: impl FnOnce(&mut FakeDirectory),
    ) -> Harness {
        let mut directory = FakeDirectory::new(users);
        directory_tweak(&mut directory);
        let directory = Arc::new(directory);
        let sender = Arc::new(sender);
        let orchestrator = DispatchOrchestrator::new(
            directory.clone(),
            Arc::new(FakeItems {
                by_user: items,
                fail_for: None,
            }),
            sender.clone(),
            Arc::new(clock),
        );
        Harness {
            directory,
            sender,
            orchestrator,
        }
    }

    fn single_record(outcome: &SweepOutcome) -> &UserSweepRecord {
        match outcome {
            SweepOutcome::Completed(summary) => {
                assert_eq!(summary.records.len(), 1);
                &summary.records[0]
            }
            SweepOutcome::Coalesced => panic!("sweep unexpectedly coalesced"),
        }
    }

    #[tokio::test]
    async fn test_already_sent_today_skips_without_side_effects() {
        let now = noon();
        let user = make_user(
            "a@example.com",
            Profile {
                last_email_sent_at: Some(now - ChronoDuration::hours(2)),
                ..Profile::default()
            },
        );
        let items = HashMap::from([(user.id, stale_items(user.id, 3, now))]);
        let h = harness(vec![user], items, FixedClock::new(now), FakeSender::new(), |_| {});

        let outcome = h.orchestrator.run_sweep(false).await.unwrap();
        assert_eq!(
            single_record(&outcome).disposition,
            SweepDisposition::SkippedAlreadySent
        );
        assert!(h.sender.sent().is_empty());
        assert!(h.directory.marks().is_empty());
    }

    #[tokio::test]
    async fn test_force_bypasses_already_sent_check() {
        let now = noon();
        let user = make_user(
            "a@example.com",
            Profile {
                last_email_sent_at: Some(now - ChronoDuration::hours(2)),
                ..Profile::default()
            },
        );
        let items = HashMap::from([(user.id, stale_items(user.id, 3, now))]);
        let h = harness(vec![user], items, FixedClock::new(now), FakeSender::new(), |_| {});

        let outcome = h.orchestrator.run_sweep(true).await.unwrap();
        assert_eq!(single_record(&outcome).disposition, SweepDisposition::Sent);
        assert_eq!(h.sender.sent().len(), 1);
        assert_eq!(h.directory.marks().len(), 1);
    }

    #[tokio::test]
    async fn test_time_gate_blocks_before_email_time() {
        let before = Utc.with_ymd_and_hms(2026, 8, 6, 8, 59, 0).unwrap();
        let user = make_user(
            "a@example.com",
            Profile {
                email_time: Some("09:00".to_string()),
                ..Profile::default()
            },
        );
        let items = HashMap::from([(user.id, stale_items(user.id, 3, before))]);
        let h = harness(
            vec![user],
            items,
            FixedClock::new(before),
            FakeSender::new(),
            |_| {},
        );

        let outcome = h.orchestrator.run_sweep(false).await.unwrap();
        assert_eq!(
            single_record(&outcome).disposition,
            SweepDisposition::SkippedTooEarly
        );
        assert!(h.sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_time_gate_passes_at_email_time() {
        let at = Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap();
        let user = make_user(
            "a@example.com",
            Profile {
                email_time: Some("09:00".to_string()),
                ..Profile::default()
            },
        );
        let items = HashMap::from([(user.id, stale_items(user.id, 3, at))]);
        let h = harness(vec![user], items, FixedClock::new(at), FakeSender::new(), |_| {});

        let outcome = h.orchestrator.run_sweep(false).await.unwrap();
        assert_eq!(single_record(&outcome).disposition, SweepDisposition::Sent);
    }

    #[tokio::test]
    async fn test_time_gate_applies_even_when_forced() {
        let before = Utc.with_ymd_and_hms(2026, 8, 6, 4, 30, 0).unwrap();
        let user = make_user(
            "a@example.com",
            Profile {
                email_time: Some("05:00".to_string()),
                last_email_sent_at: Some(before - ChronoDuration::days(1)),
                ..Profile::default()
            },
        );
        let items = HashMap::from([(user.id, stale_items(user.id, 1, before))]);
        let h = harness(
            vec![user],
            items,
            FixedClock::new(before),
            FakeSender::new(),
            |_| {},
        );

        // Forcing bypasses only the already-sent check, not the time gate.
        let outcome = h.orchestrator.run_sweep(true).await.unwrap();
        assert_eq!(
            single_record(&outcome).disposition,
            SweepDisposition::SkippedTooEarly
        );
    }

    #[tokio::test]
    async fn test_bad_email_time_skips_user_with_warning() {
        let now = noon();
        let user = make_user(
            "a@example.com",
            Profile {
                email_time: Some("9am".to_string()),
                ..Profile::default()
            },
        );
        let items = HashMap::from([(user.id, stale_items(user.id, 1, now))]);
        let h = harness(vec![user], items, FixedClock::new(now), FakeSender::new(), |_| {});

        let outcome = h.orchestrator.run_sweep(false).await.unwrap();
        let record = single_record(&outcome);
        assert_eq!(record.disposition, SweepDisposition::SkippedBadEmailTime);
        assert_eq!(record.detail.as_deref(), Some("9am"));
    }

    #[tokio::test]
    async fn test_no_eligible_items_leaves_user_unmarked() {
        let now = noon();
        let user = make_user("a@example.com", Profile::default());
        // Single item revisited an hour ago: below the 2-day minimum gap.
        let mut item = Item::new(user.id, "fresh", "", now - ChronoDuration::days(30));
        item.last_revisited_at = Some(now - ChronoDuration::hours(1));
        item.times_revisited = 1;
        let items = HashMap::from([(user.id, vec![item])]);
        let h = harness(vec![user], items, FixedClock::new(now), FakeSender::new(), |_| {});

        let outcome = h.orchestrator.run_sweep(false).await.unwrap();
        assert_eq!(
            single_record(&outcome).disposition,
            SweepDisposition::SkippedNoEligible
        );
        assert!(h.directory.marks().is_empty(), "zero-eligible user stays unmarked");
    }

    #[tokio::test]
    async fn test_send_failure_leaves_marker_unchanged() {
        let now = noon();
        let user = make_user("a@example.com", Profile::default());
        let items = HashMap::from([(user.id, stale_items(user.id, 3, now))]);
        let mut sender = FakeSender::new();
        sender.fail = true;
        let h = harness(vec![user], items, FixedClock::new(now), sender, |_| {});

        let outcome = h.orchestrator.run_sweep(false).await.unwrap();
        assert_eq!(
            single_record(&outcome).disposition,
            SweepDisposition::SendFailed
        );
        assert!(h.directory.marks().is_empty(), "failed send must not mark");
    }

    #[tokio::test]
    async fn test_send_timeout_is_a_send_failure() {
        let now = noon();
        let user = make_user("a@example.com", Profile::default());
        let items = HashMap::from([(user.id, stale_items(user.id, 1, now))]);
        let mut sender = FakeSender::new();
        sender.delay = Some(Duration::from_millis(200));

        let directory = Arc::new(FakeDirectory::new(vec![user]));
        let orchestrator = DispatchOrchestrator::new(
            directory.clone(),
            Arc::new(FakeItems {
                by_user: items,
                fail_for: None,
            }),
            Arc::new(sender),
            Arc::new(FixedClock::new(now)),
        )
        .with_send_timeout(Duration::from_millis(10));

        let outcome = orchestrator.run_sweep(false).await.unwrap();
        let record = single_record(&outcome);
        assert_eq!(record.disposition, SweepDisposition::SendFailed);
        assert!(record.detail.as_deref().unwrap_or("").contains("timed out"));
        assert!(directory.marks().is_empty());
    }

    #[tokio::test]
    async fn test_successful_send_marks_user() {
        let now = noon();
        let user = make_user("a@example.com", Profile::default());
        let user_id = user.id;
        let items = HashMap::from([(user_id, stale_items(user_id, 5, now))]);
        let h = harness(vec![user], items, FixedClock::new(now), FakeSender::new(), |_| {});

        let outcome = h.orchestrator.run_sweep(false).await.unwrap();
        let record = single_record(&outcome);
        assert_eq!(record.disposition, SweepDisposition::Sent);
        assert_eq!(record.selected, 3, "items_per_day defaults to 3");

        let marks = h.directory.marks();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0], (user_id, now));
    }

    #[tokio::test]
    async fn test_mark_failure_is_distinguishable() {
        let now = noon();
        let user = make_user("a@example.com", Profile::default());
        let items = HashMap::from([(user.id, stale_items(user.id, 1, now))]);
        let h = harness(vec![user], items, FixedClock::new(now), FakeSender::new(), |d| {
            d.fail_mark = true;
        });

        let outcome = h.orchestrator.run_sweep(false).await.unwrap();
        assert_eq!(
            single_record(&outcome).disposition,
            SweepDisposition::MarkFailed
        );
        assert_eq!(h.sender.sent().len(), 1, "notification did go out");
    }

    #[tokio::test]
    async fn test_per_user_failure_does_not_abort_sweep() {
        let now = noon();
        let broken = make_user("broken@example.com", Profile::default());
        let healthy = make_user("healthy@example.com", Profile::default());
        let items = HashMap::from([(healthy.id, stale_items(healthy.id, 2, now))]);

        let directory = Arc::new(FakeDirectory::new(vec![broken.clone(), healthy.clone()]));
        let sender = Arc::new(FakeSender::new());
        let orchestrator = DispatchOrchestrator::new(
            directory.clone(),
            Arc::new(FakeItems {
                by_user: items,
                fail_for: Some(broken.id),
            }),
            sender.clone(),
            Arc::new(FixedClock::new(now)),
        );

        let outcome = orchestrator.run_sweep(false).await.unwrap();
        let SweepOutcome::Completed(summary) = outcome else {
            panic!("sweep unexpectedly coalesced");
        };
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.sent, 1);
        assert_eq!(sender.sent(), vec![("healthy@example.com".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_user_enumeration_failure_aborts_sweep() {
        let now = noon();
        let h = harness(
            Vec::new(),
            HashMap::new(),
            FixedClock::new(now),
            FakeSender::new(),
            |d| d.fail_enumeration = true,
        );

        let err = h.orchestrator.run_sweep(false).await.unwrap_err();
        assert!(matches!(err, DispatchError::UserEnumeration(_)));
    }

    #[tokio::test]
    async fn test_overlapping_sweeps_coalesce() {
        let now = noon();
        let user = make_user("a@example.com", Profile::default());
        let items = HashMap::from([(user.id, stale_items(user.id, 1, now))]);
        let mut sender = FakeSender::new();
        sender.delay = Some(Duration::from_millis(100));
        let h = harness(vec![user], items, FixedClock::new(now), sender, |_| {});

        let (first, second) =
            tokio::join!(h.orchestrator.run_sweep(false), h.orchestrator.run_sweep(true));

        let outcomes = [first.unwrap(), second.unwrap()];
        let completed = outcomes
            .iter()
            .filter(|o| matches!(o, SweepOutcome::Completed(_)))
            .count();
        let coalesced = outcomes
            .iter()
            .filter(|o| matches!(o, SweepOutcome::Coalesced))
            .count();
        assert_eq!(completed, 1, "exactly one sweep may run");
        assert_eq!(coalesced, 1, "the overlapping trigger is dropped");
        assert_eq!(h.sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_sending() {
        let now = noon();
        let user = make_user("a@example.com", Profile::default());
        let user_id = user.id;
        let mut items = stale_items(user_id, 4, now);
        // One ineligible item: revisited an hour ago.
        items[3].last_revisited_at = Some(now - ChronoDuration::hours(1));
        items[3].times_revisited = 2;
        let map = HashMap::from([(user_id, items)]);
        let h = harness(vec![user], map, FixedClock::new(now), FakeSender::new(), |_| {});

        let report = h.orchestrator.dry_run(user_id).await.unwrap();
        assert_eq!(report.total_items, 4);
        assert_eq!(report.eligible_count, 3);
        assert_eq!(report.selected_count, 3);
        assert_eq!(report.gate, GateStatus::Ready);
        assert_eq!(report.items.iter().filter(|i| i.selected).count(), 3);
        assert!(h.sender.sent().is_empty(), "dry run must not send");
        assert!(h.directory.marks().is_empty(), "dry run must not mark");
    }

    #[tokio::test]
    async fn test_dry_run_unknown_user() {
        let now = noon();
        let h = harness(
            Vec::new(),
            HashMap::new(),
            FixedClock::new(now),
            FakeSender::new(),
            |_| {},
        );

        let err = h.orchestrator.dry_run(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Dispatch(DispatchError::UnknownUser { .. })
        ));
    }

    #[tokio::test]
    async fn test_dry_run_surfaces_gate_condition() {
        let now = noon();
        let user = make_user(
            "a@example.com",
            Profile {
                last_email_sent_at: Some(now - ChronoDuration::hours(1)),
                ..Profile::default()
            },
        );
        let user_id = user.id;
        let map = HashMap::from([(user_id, stale_items(user_id, 2, now))]);
        let h = harness(vec![user], map, FixedClock::new(now), FakeSender::new(), |_| {});

        let report = h.orchestrator.dry_run(user_id).await.unwrap();
        assert_eq!(report.gate, GateStatus::AlreadySentToday);
        // The weight/selection evaluation still runs for observability.
        assert_eq!(report.total_items, 2);
    }
}
