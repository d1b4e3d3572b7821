//! The `gradup list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gradup_fixtures::config::load_config_from;

pub async fn execute(source_name: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let name = source_name.unwrap_or_else(|| config.default_source.clone());

    let source = config.source(&name)?;
    let assessments = source.list_assessments().await?;

    if assessments.is_empty() {
        println!("Source '{name}' offers no assessments.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Minutes", "Questions", "Difficulty"]);
    for info in &assessments {
        table.add_row(vec![
            Cell::new(&info.id),
            Cell::new(&info.title),
            Cell::new(info.duration_minutes),
            Cell::new(info.question_count),
            Cell::new(info.difficulty),
        ]);
    }

    println!("Source: {name}");
    println!("{table}");

    Ok(())
}
