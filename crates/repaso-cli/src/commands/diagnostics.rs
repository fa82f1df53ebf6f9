//! Dispatch pipeline diagnostics.

use std::sync::Arc;

use clap::Subcommand;

use repaso_core::{Config, Database, DispatchOrchestrator, EmailSender, SystemClock};

use super::resolve_user;

#[derive(Subcommand)]
pub enum DiagnosticsAction {
    /// Evaluate weights, eligibility, and selection for one user without
    /// sending anything
    DryRun {
        /// Email of the user (optional when only one user exists)
        #[arg(long)]
        user: Option<String>,
    },
}

pub fn run(action: DiagnosticsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DiagnosticsAction::DryRun { user } => dry_run(user.as_deref()),
    }
}

fn dry_run(user: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let target = resolve_user(&db, user)?;

    let config = Config::load()?;
    let orchestrator = DispatchOrchestrator::new(
        db.clone(),
        db,
        Arc::new(EmailSender::new(&config.email)),
        Arc::new(SystemClock),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(orchestrator.dry_run(target.id))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
