pub mod init;
pub mod list;
pub mod run;
pub mod show;
pub mod validate;

use comfy_table::{Cell, Table};

use gradup_core::report::AttemptSummary;

/// Per-section table shared by `run` and `show`.
pub(crate) fn summary_table(summary: &AttemptSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Phase", "Section", "Category", "Answered", "Flagged"]);

    for s in &summary.sections {
        table.add_row(vec![
            Cell::new(&s.phase),
            Cell::new(&s.section),
            Cell::new(s.category),
            Cell::new(format!("{}/{}", s.answered, s.total)),
            Cell::new(s.flagged),
        ]);
    }

    table
}

pub(crate) fn summary_headline(summary: &AttemptSummary) -> String {
    format!(
        "{}: {} ({}/{} answered, {} flagged, {}s of {}s used)",
        summary.assessment_title,
        summary.end_label(),
        summary.answered_questions(),
        summary.total_questions(),
        summary.flagged.len(),
        summary.seconds_used,
        summary.duration_secs,
    )
}
