//! # Repaso Core Library
//!
//! Core business logic for Repaso, a spaced-repetition revisit reminder.
//! All operations are available through a standalone CLI binary; this crate
//! carries everything below that surface.
//!
//! ## Architecture
//!
//! - **Scheduling engine**: a pure urgency-weight model, eligibility rules,
//!   and a seeded weighted sampler -- deterministic given `(items, n, seed,
//!   now)`
//! - **Dispatch orchestrator**: the periodic sweep that gates, selects, and
//!   notifies per user, with single-flight coalescing and per-user failure
//!   isolation
//! - **Storage**: SQLite-backed users/items/revisit history and TOML-based
//!   configuration
//! - **Notify**: Resend-compatible email sender with a local simulation mode
//!
//! ## Key Components
//!
//! - [`DispatchOrchestrator`]: sweep state machine behind every trigger
//! - [`Database`]: persistence, doubling as the orchestrator's directory and
//!   repository collaborators
//! - [`Clock`]: injected time source ([`SystemClock`] in production,
//!   [`FixedClock`] in tests)
//! - [`today_focus`]: the day-stable interactive selection view

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod focus;
pub mod model;
pub mod notify;
pub mod scheduler;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dispatch::{
    DispatchOrchestrator, DryRunItem, DryRunReport, GateStatus, ItemRepository, SweepDisposition,
    SweepOutcome, SweepSummary, UserDirectory, UserSweepRecord,
};
pub use error::{ConfigError, CoreError, DatabaseError, DispatchError, NotifyError};
pub use focus::{today_focus, FocusItem, FocusSummary, TodayFocus};
pub use model::{Item, ItemStatus, Profile, RevisitEntry, User};
pub use notify::{EmailSender, NotificationSender};
pub use scheduler::{
    compute_weight, compute_weight_detail, day_seed, eligible_items, fresh_seed, is_eligible,
    select_weighted, Priority, WeightDetail,
};
pub use storage::{data_dir, Config, Database, EmailConfig, ProfileDefaults, RevisitOutcome, SweepConfig};
