//! Dispatch sweep triggers: one-shot run and the periodic daemon.
//!
//! Both paths go through the same orchestrator instance, so the
//! single-flight guard serializes a manual trigger against the timer.

use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use tracing::{error, info};

use repaso_core::{
    Config, Database, DispatchOrchestrator, EmailSender, SweepOutcome, SweepSummary, SystemClock,
};

#[derive(Subcommand)]
pub enum DispatchAction {
    /// Run one sweep over all users and exit
    Run {
        /// Send even to users already emailed today (the time-of-day gate
        /// still applies)
        #[arg(long)]
        force: bool,
    },
    /// Sweep periodically until interrupted
    Daemon {
        /// Seconds between sweeps (defaults to the configured interval)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

pub fn run(action: DispatchAction) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    match action {
        DispatchAction::Run { force } => runtime.block_on(run_once(force)),
        DispatchAction::Daemon { interval_secs } => runtime.block_on(run_daemon(interval_secs)),
    }
}

fn build_orchestrator(config: &Config) -> Result<DispatchOrchestrator, Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let sender = Arc::new(EmailSender::new(&config.email));
    let orchestrator =
        DispatchOrchestrator::new(db.clone(), db, sender, Arc::new(SystemClock))
            .with_send_timeout(Duration::from_secs(config.sweep.send_timeout_secs));
    Ok(orchestrator)
}

async fn run_once(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let orchestrator = build_orchestrator(&config)?;

    match orchestrator.run_sweep(force).await? {
        SweepOutcome::Completed(summary) => print_summary(&summary),
        SweepOutcome::Coalesced => println!("Another sweep is in flight; trigger dropped."),
    }
    Ok(())
}

async fn run_daemon(interval_secs: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    let interval_secs = interval_secs.unwrap_or(config.sweep.interval_secs).max(1);
    let orchestrator = build_orchestrator(&config)?;

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(interval_secs, "dispatch daemon started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Sweep-level failures (cannot enumerate users) are logged;
                // the next tick retries.
                if let Err(e) = orchestrator.run_sweep(false).await {
                    error!(error = %e, "sweep aborted");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("dispatch daemon shutting down");
                break;
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &SweepSummary) {
    for record in &summary.records {
        let label = disposition_label(record.disposition);
        match &record.detail {
            Some(detail) => println!("{:<28} {label} ({detail})", record.email),
            None => println!("{:<28} {label}", record.email),
        }
    }
    println!(
        "{} users: {} sent, {} skipped, {} failed",
        summary.users_seen, summary.sent, summary.skipped, summary.failed
    );
}

fn disposition_label(disposition: repaso_core::SweepDisposition) -> &'static str {
    use repaso_core::SweepDisposition::*;
    match disposition {
        Sent => "sent",
        SkippedAlreadySent => "skipped: already sent today",
        SkippedTooEarly => "skipped: before send time",
        SkippedBadEmailTime => "skipped: invalid email time",
        SkippedNoEligible => "skipped: no eligible items",
        SkippedEmptySelection => "skipped: empty selection",
        FetchFailed => "failed: could not fetch items",
        SendFailed => "failed: send error",
        MarkFailed => "failed: sent but marker not persisted",
    }
}
