//! Category breakdown example: read a saved attempt summary and aggregate it.
//!
//! Summaries carry per-section counts only. This groups them by skill
//! category.
//!
//! ```bash
//! cargo run -p gradup-core --example category_breakdown -- gradup-results/attempt-....json
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use gradup_core::model::Category;
use gradup_core::report::AttemptSummary;

#[derive(Default)]
struct Tally {
    total: usize,
    answered: usize,
    flagged: usize,
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(summary_path) = args.get(1) else {
        anyhow::bail!("Usage: category_breakdown <summary.json>");
    };

    let summary = AttemptSummary::load_json(Path::new(summary_path))?;
    println!(
        "Loaded summary: {} ({}, {}s of {}s used)",
        summary.assessment_title,
        summary.end_label(),
        summary.seconds_used,
        summary.duration_secs
    );

    let mut by_category: BTreeMap<Category, Tally> = BTreeMap::new();
    for section in &summary.sections {
        let tally = by_category.entry(section.category).or_default();
        tally.total += section.total;
        tally.answered += section.answered;
        tally.flagged += section.flagged;
    }

    println!("\n{:<15} {:>9} {:>9} {:>8}", "Category", "Answered", "Flagged", "Rate");
    println!("{}", "-".repeat(44));
    for (category, tally) in &by_category {
        let rate = if tally.total == 0 {
            0.0
        } else {
            tally.answered as f64 / tally.total as f64 * 100.0
        };
        println!(
            "{:<15} {:>5}/{:<3} {:>9} {:>7.1}%",
            category.to_string(),
            tally.answered,
            tally.total,
            tally.flagged,
            rate
        );
    }

    let missing: Vec<Category> = Category::ALL
        .into_iter()
        .filter(|c| !by_category.contains_key(c))
        .collect();
    if !missing.is_empty() {
        println!("\nNot covered by this assessment: {missing:?}");
    }

    println!("\nOverall completion: {:.1}%", summary.completion_rate() * 100.0);
    Ok(())
}
