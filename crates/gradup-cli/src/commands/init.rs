//! The `gradup init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("gradup.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("assessments").context("failed to create assessments/")?;
    write_if_missing(Path::new("assessments/example.toml"), EXAMPLE_ASSESSMENT)?;

    println!("\nNext steps:");
    println!("  1. Run: gradup validate --assessment assessments/example.toml");
    println!("  2. Run: gradup list --source local");
    println!("  3. Run: gradup run --source local --assessment-id example --script <file>");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradup configuration

default_source = "builtin"
default_assessment = "placement-simulation"
output_dir = "./gradup-results"

[sources.builtin]
type = "builtin"
delay_ms = 800

[sources.local]
type = "directory"
path = "assessments"

# [sources.http]
# type = "http"
# base_url = "https://fixtures.example.com/api"
# api_key = "${GRADUP_API_KEY}"

[policy]
# Delay before a single-choice answer moves on; 0 disables.
auto_advance_ms = 400
allow_cross_phase_retreat = false
"#;

const EXAMPLE_ASSESSMENT: &str = r#"[assessment]
id = "example"
title = "Example Assessment"
description = "A small two-phase assessment to get started"
duration_minutes = 15

[[phases]]
label = "Day 1"
guidelines = ["Answer every question before moving on."]

[[phases.sections]]
label = "Aptitude"
category = "aptitude"

[[phases.sections.questions]]
id = "apt-1"
kind = "multiple_choice"
text = "What is 25% of 80?"
options = [{ text = "15" }, { text = "20", correct = true }, { text = "25" }]

[[phases.sections.questions]]
id = "apt-2"
kind = "free_text"
prompt = "Explain how you would estimate the number of laptops on campus."

[[phases]]
label = "Day 2"

[[phases.sections]]
label = "Project"
category = "project"

[[phases.sections.questions]]
id = "proj-1"
kind = "project"
title = "Library management"
brief = "Design a system for lending books to students."
modules = ["catalog", "loans"]
strategies = ["Monolith", "Microservices"]
justification_prompts = ["Why does your schema fit the lending workflow?"]
"#;
