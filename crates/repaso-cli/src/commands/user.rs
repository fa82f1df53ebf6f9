//! User and scheduling profile commands.

use chrono::NaiveTime;
use clap::Subcommand;

use repaso_core::{Clock, Config, Database, Profile, SystemClock};

use super::resolve_user;

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a user (profile starts from the configured defaults)
    Add {
        /// Notification email address
        email: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// List registered users
    List,
    /// Update a user's scheduling profile
    Set {
        /// Email of the user (optional when only one user exists)
        #[arg(long)]
        user: Option<String>,
        /// Items selected per daily dispatch
        #[arg(long)]
        items_per_day: Option<u32>,
        /// Minimum days between revisits of the same item
        #[arg(long)]
        min_revisit_days: Option<u32>,
        /// Earliest local send time, HH:MM
        #[arg(long)]
        email_time: Option<String>,
        /// Remove the send-time gate
        #[arg(long)]
        clear_email_time: bool,
    },
}

pub fn run(action: UserAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        UserAction::Add { email, name } => {
            let defaults = Config::load()?.profile_defaults;
            let profile = Profile {
                items_per_day: defaults.items_per_day,
                min_revisit_days: defaults.min_revisit_days,
                email_time: defaults.email_time,
                last_email_sent_at: None,
            };
            let user = db.create_user(&email, &name, profile, SystemClock.now())?;
            println!("User added: {} ({})", user.email, user.id);
            Ok(())
        }
        UserAction::List => {
            let users = db.list_users()?;
            if users.is_empty() {
                println!("No users.");
                return Ok(());
            }
            for user in users {
                let gate = user.profile.email_time.as_deref().unwrap_or("any time");
                println!(
                    "{}  {}  {}/day, min gap {}d, send after {}",
                    user.id,
                    user.email,
                    user.profile.items_per_day,
                    user.profile.min_revisit_days,
                    gate,
                );
            }
            Ok(())
        }
        UserAction::Set {
            user,
            items_per_day,
            min_revisit_days,
            email_time,
            clear_email_time,
        } => {
            let target = resolve_user(&db, user.as_deref())?;
            let mut profile = target.profile.clone();

            if let Some(n) = items_per_day {
                if n == 0 {
                    return Err("--items-per-day must be at least 1".into());
                }
                profile.items_per_day = n;
            }
            if let Some(d) = min_revisit_days {
                profile.min_revisit_days = d;
            }
            if let Some(t) = email_time {
                if NaiveTime::parse_from_str(&t, "%H:%M").is_err() {
                    return Err(format!("--email-time must be HH:MM, got {t}").into());
                }
                profile.email_time = Some(t);
            }
            if clear_email_time {
                profile.email_time = None;
            }

            db.update_profile(target.id, &profile)?;
            println!("Profile updated for {}.", target.email);
            Ok(())
        }
    }
}
