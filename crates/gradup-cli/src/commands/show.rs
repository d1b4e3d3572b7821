//! The `gradup show` command.

use std::path::PathBuf;

use anyhow::Result;

use gradup_core::report::AttemptSummary;

use super::{summary_headline, summary_table};

pub fn execute(report_path: PathBuf, format: String) -> Result<()> {
    let summary = AttemptSummary::load_json(&report_path)?;

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", summary.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            println!("{}", summary_headline(&summary));
            println!("{}", summary_table(&summary));

            if !summary.unanswered.is_empty() {
                println!("\nUnanswered: {}", summary.unanswered.join(", "));
            }
            if !summary.flagged.is_empty() {
                println!("Flagged: {}", summary.flagged.join(", "));
            }
            if !summary.answers.is_empty() {
                println!("\nAnswers:");
                for (key, value) in &summary.answers {
                    println!("  {key} = {value}");
                }
            }
        }
    }

    Ok(())
}
