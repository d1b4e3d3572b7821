//! The `gradup validate` command.

use std::path::PathBuf;

use anyhow::Result;

use gradup_core::parser;

pub fn execute(path: PathBuf) -> Result<()> {
    let assessments = if path.is_dir() {
        parser::load_assessment_directory(&path)?
    } else {
        vec![parser::parse_assessment(&path)?]
    };

    let mut total_warnings = 0;

    for assessment in &assessments {
        println!(
            "Assessment: {} ({} phases, {} questions, {} min)",
            assessment.title,
            assessment.phases.len(),
            assessment.question_count(),
            assessment.duration_minutes
        );

        let warnings = parser::validate_assessment(assessment);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All assessments valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
