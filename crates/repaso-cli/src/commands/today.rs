//! Today's focus view -- same selection for the whole calendar day.

use repaso_core::{today_focus, Database, SystemClock};

use super::resolve_user;

pub fn run(user: Option<&str>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let owner = resolve_user(&db, user)?;
    let focus = today_focus(&db, &SystemClock, &owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&focus)?);
        return Ok(());
    }

    if focus.items.is_empty() {
        println!("Nothing to focus on today.");
        return Ok(());
    }

    println!("Today's focus for {}:", owner.email);
    for entry in &focus.items {
        let check = if entry.revisited_today { "x" } else { " " };
        println!(
            "[{check}] {}  (weight {:.2}, {})",
            entry.item.title,
            entry.weight.weight,
            entry.weight.priority.as_str(),
        );
        if !entry.item.link.is_empty() {
            println!("      {}", entry.item.link);
        }
    }
    println!(
        "{} of {} done, {} remaining",
        focus.summary.completed, focus.summary.total, focus.summary.remaining
    );
    Ok(())
}
