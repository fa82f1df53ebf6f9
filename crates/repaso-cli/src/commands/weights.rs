//! Weight listing -- every active item's scheduling metadata.

use repaso_core::{compute_weight_detail, Clock, Database, SystemClock, WeightDetail};

use super::resolve_user;

pub fn run(user: Option<&str>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let owner = resolve_user(&db, user)?;
    let now = SystemClock.now();

    let items = db.active_items_stable(owner.id)?;
    let mut rows: Vec<(String, WeightDetail)> = items
        .iter()
        .map(|item| {
            (
                item.title.clone(),
                compute_weight_detail(item, now, owner.profile.min_revisit_days),
            )
        })
        .collect();
    // Highest urgency first.
    rows.sort_by(|a, b| {
        b.1.weight
            .partial_cmp(&a.1.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if json {
        let details: Vec<&WeightDetail> = rows.iter().map(|(_, d)| d).collect();
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No active items.");
        return Ok(());
    }

    println!(
        "{:<8} {:>8} {:>10} {:>8} {:>9}  title",
        "priority", "weight", "age (d)", "gap (d)", "eligible"
    );
    for (title, detail) in rows {
        println!(
            "{:<8} {:>8.2} {:>10.1} {:>8.1} {:>9}  {title}",
            detail.priority.as_str(),
            detail.weight,
            detail.days_since_added,
            detail.days_since_last_revisit,
            if detail.is_eligible { "yes" } else { "no" },
        );
    }
    Ok(())
}
