//! Scripted attempt example: drive an `Attempt` directly as a library.
//!
//! Loads the aptitude sprint, answers every question, and prints the
//! summary once the attempt reaches REPORT.
//!
//! ```bash
//! cargo run -p gradup-core --example scripted_attempt
//! ```

use std::path::Path;
use std::sync::Arc;

use gradup_core::answers::AnswerValue;
use gradup_core::attempt::{Attempt, TraversalPolicy};
use gradup_core::parser;

fn main() -> anyhow::Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assessments/aptitude-sprint.toml");
    let assessment = parser::parse_assessment(&path)?;
    println!(
        "Loaded assessment: {} ({} questions, {} min)",
        assessment.title,
        assessment.question_count(),
        assessment.duration_minutes
    );

    let mut attempt = Attempt::new(Arc::new(assessment), TraversalPolicy::default())?;
    attempt.accept()?;
    attempt.synchronize()?;

    // Answer the current question until the cursor runs off the end.
    // Auto-advance requests are applied straight away instead of waiting.
    let choices = [1, 1, 0];
    for choice in choices {
        let id = attempt.current_question().id.clone();
        attempt.tick();
        match attempt.record_answer(&id, AnswerValue::Choice(choice))? {
            Some(pending) => {
                let step = attempt.auto_advance(&pending)?;
                println!("{id}: choice {choice} -> {step:?}");
            }
            None => println!("{id}: choice {choice}"),
        }
    }

    let summary = attempt.summary()?;
    println!("\n{}", summary.to_markdown());
    Ok(())
}
