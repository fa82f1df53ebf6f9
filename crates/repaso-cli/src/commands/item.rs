//! Item management commands.

use clap::Subcommand;

use repaso_core::{
    compute_weight_detail, Clock, Database, Item, ItemStatus, RevisitOutcome, SystemClock,
};

use super::{parse_id, resolve_user};

#[derive(Subcommand)]
pub enum ItemAction {
    /// Add a new item
    Add {
        /// Item title
        title: String,
        /// Link to the item (problem page, article, ...)
        #[arg(long, default_value = "")]
        link: String,
        /// Email of the owning user (optional when only one user exists)
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List items, newest first
    List {
        /// Email of the user (optional when only one user exists)
        #[arg(long)]
        user: Option<String>,
        /// Include retired items
        #[arg(long)]
        all: bool,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show one item with weight detail and revisit history
    Show {
        /// Item id
        id: String,
    },
    /// Update item details
    Update {
        /// Item id
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record a revisit (at most once per day)
    Revisit {
        /// Item id
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Retire an item so it stops being scheduled
    Archive {
        /// Item id
        id: String,
    },
    /// Permanently delete an item and its revisit history
    Remove {
        /// Item id
        id: String,
    },
}

pub fn run(action: ItemAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let clock = SystemClock;

    match action {
        ItemAction::Add {
            title,
            link,
            user,
            topic,
            difficulty,
            source,
            notes,
        } => {
            let owner = resolve_user(&db, user.as_deref())?;
            let mut item = Item::new(owner.id, title, link, clock.now());
            item.topic = topic;
            item.difficulty = difficulty;
            if let Some(source) = source {
                item.source = source;
            }
            item.notes = notes;
            db.create_item(&item)?;
            println!("Item added: {} ({})", item.title, item.id);
            Ok(())
        }
        ItemAction::List { user, all, json } => {
            let owner = resolve_user(&db, user.as_deref())?;
            let items = db.list_items(owner.id, all)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
                return Ok(());
            }
            if items.is_empty() {
                println!("No items.");
                return Ok(());
            }
            for item in items {
                let marker = match item.status {
                    ItemStatus::Active => " ",
                    ItemStatus::Retired => "R",
                };
                println!(
                    "{marker} {}  {}  revisits: {}  {}",
                    item.id,
                    item.added_at.format("%Y-%m-%d"),
                    item.times_revisited,
                    item.title,
                );
            }
            Ok(())
        }
        ItemAction::Show { id } => {
            let id = parse_id(&id)?;
            let item = db
                .item_by_id(id)?
                .ok_or_else(|| format!("no item with id {id}"))?;
            let min_revisit_days = db
                .user_by_id(item.user_id)?
                .map(|u| u.profile.min_revisit_days)
                .unwrap_or(2);

            let detail = compute_weight_detail(&item, clock.now(), min_revisit_days);
            println!("{}  [{}]", item.title, item.status.as_str());
            if !item.link.is_empty() {
                println!("  link:       {}", item.link);
            }
            println!("  added:      {}", item.added_at.format("%Y-%m-%d"));
            println!(
                "  weight:     {:.2} ({} priority{})",
                detail.weight,
                detail.priority.as_str(),
                if detail.is_eligible { "" } else { ", not yet eligible" },
            );
            println!(
                "  revisits:   {} (decay {:.2})",
                detail.times_revisited, detail.revisit_decay
            );

            let history = db.revisit_history(id)?;
            if !history.is_empty() {
                println!("  history:");
                for entry in history {
                    match entry.notes {
                        Some(notes) => println!(
                            "    {}  {notes}",
                            entry.revisited_at.format("%Y-%m-%d %H:%M")
                        ),
                        None => println!("    {}", entry.revisited_at.format("%Y-%m-%d %H:%M")),
                    }
                }
            }
            Ok(())
        }
        ItemAction::Update {
            id,
            title,
            link,
            topic,
            difficulty,
            source,
            notes,
        } => {
            let id = parse_id(&id)?;
            let mut item = db
                .item_by_id(id)?
                .ok_or_else(|| format!("no item with id {id}"))?;
            if let Some(title) = title {
                item.title = title;
            }
            if let Some(link) = link {
                item.link = link;
            }
            if topic.is_some() {
                item.topic = topic;
            }
            if difficulty.is_some() {
                item.difficulty = difficulty;
            }
            if let Some(source) = source {
                item.source = source;
            }
            if notes.is_some() {
                item.notes = notes;
            }
            db.update_item(&item)?;
            println!("Item updated.");
            Ok(())
        }
        ItemAction::Revisit { id, notes } => {
            let id = parse_id(&id)?;
            let outcome =
                db.record_revisit(id, notes.as_deref(), clock.now(), clock.day_bounds())?;
            match outcome {
                RevisitOutcome::Recorded => println!("Revisit recorded."),
                RevisitOutcome::AlreadyToday => {
                    println!("Already revisited today. Come back tomorrow!")
                }
            }
            Ok(())
        }
        ItemAction::Archive { id } => {
            db.archive_item(parse_id(&id)?)?;
            println!("Item retired.");
            Ok(())
        }
        ItemAction::Remove { id } => {
            db.delete_item(parse_id(&id)?)?;
            println!("Item deleted.");
            Ok(())
        }
    }
}
