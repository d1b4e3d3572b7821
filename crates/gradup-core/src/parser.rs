//! TOML assessment parser.
//!
//! Loads assessments from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Assessment, Category, CommSkill, Difficulty, Phase, Question, QuestionContent, Section,
};

/// Intermediate TOML structure for parsing assessment files.
#[derive(Debug, Deserialize)]
struct TomlAssessmentFile {
    assessment: TomlAssessmentHeader,
    #[serde(default)]
    phases: Vec<TomlPhase>,
}

#[derive(Debug, Deserialize)]
struct TomlAssessmentHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    duration_minutes: u32,
    #[serde(default)]
    difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
struct TomlPhase {
    label: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    guidelines: Vec<String>,
    #[serde(default)]
    sections: Vec<TomlSection>,
}

#[derive(Debug, Deserialize)]
struct TomlSection {
    label: String,
    category: Category,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    /// Falls back to the section category.
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    skill: Option<CommSkill>,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(flatten)]
    content: QuestionContent,
}

/// Parse a single TOML file into an `Assessment`.
pub fn parse_assessment(path: &Path) -> Result<Assessment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assessment file: {}", path.display()))?;

    parse_assessment_str(&content, path)
}

/// Parse a TOML string into an `Assessment` (useful for testing).
pub fn parse_assessment_str(content: &str, source_path: &Path) -> Result<Assessment> {
    let parsed: TomlAssessmentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let phases = parsed
        .phases
        .into_iter()
        .enumerate()
        .map(|(index, p)| Phase {
            index,
            label: p.label,
            description: p.description,
            guidelines: p.guidelines,
            sections: p
                .sections
                .into_iter()
                .map(|s| {
                    let section_category = s.category;
                    Section {
                        label: s.label,
                        category: section_category,
                        questions: s
                            .questions
                            .into_iter()
                            .map(|q| Question {
                                id: q.id,
                                category: q.category.unwrap_or(section_category),
                                skill: q.skill,
                                difficulty: q.difficulty,
                                content: q.content,
                            })
                            .collect(),
                    }
                })
                .collect(),
        })
        .collect();

    Ok(Assessment {
        id: parsed.assessment.id,
        title: parsed.assessment.title,
        description: parsed.assessment.description,
        duration_minutes: parsed.assessment.duration_minutes,
        difficulty: parsed.assessment.difficulty,
        phases,
    })
}

/// Recursively load all `.toml` assessment files from a directory.
pub fn load_assessment_directory(dir: &Path) -> Result<Vec<Assessment>> {
    let mut assessments = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            assessments.extend(load_assessment_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_assessment(&path) {
                Ok(a) => assessments.push(a),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(assessments)
}

/// A warning from assessment validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

impl ValidationWarning {
    fn assessment(message: String) -> Self {
        Self {
            question_id: None,
            message,
        }
    }

    fn question(id: &str, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate an assessment for common authoring issues.
pub fn validate_assessment(assessment: &Assessment) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if assessment.duration_minutes == 0 {
        warnings.push(ValidationWarning::assessment(
            "duration_minutes is 0; attempts expire on the first tick".into(),
        ));
    }

    if assessment.phases.is_empty() {
        warnings.push(ValidationWarning::assessment(
            "assessment has no phases".into(),
        ));
    }

    for phase in &assessment.phases {
        if phase.sections.is_empty() {
            warnings.push(ValidationWarning::assessment(format!(
                "phase '{}' has no sections",
                phase.label
            )));
        }
        for section in &phase.sections {
            if section.questions.is_empty() {
                warnings.push(ValidationWarning::assessment(format!(
                    "section '{}' in phase '{}' has no questions",
                    section.label, phase.label
                )));
            }
        }
    }

    let mut seen_ids = HashSet::new();
    for q in assessment.questions() {
        if !seen_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning::question(
                &q.id,
                format!("duplicate question ID: {}", q.id),
            ));
        }

        if !q.content.fits(q.category) {
            warnings.push(ValidationWarning::question(
                &q.id,
                format!(
                    "{} content does not fit category {}",
                    q.content.kind(),
                    q.category
                ),
            ));
        }

        if q.skill.is_some() && q.category != Category::Communication {
            warnings.push(ValidationWarning::question(
                &q.id,
                "skill is only meaningful for communication questions",
            ));
        }

        match &q.content {
            QuestionContent::MultipleChoice { options, .. } => {
                let correct = options.iter().filter(|o| o.correct).count();
                if correct != 1 {
                    warnings.push(ValidationWarning::question(
                        &q.id,
                        format!("multiple_choice should have exactly one correct option, found {correct}"),
                    ));
                }
            }
            QuestionContent::MultiSelect { options, .. } => {
                if options.len() < 2 {
                    warnings.push(ValidationWarning::question(
                        &q.id,
                        "multi_select needs at least two options",
                    ));
                }
            }
            QuestionContent::Project(brief) => {
                if brief.modules.is_empty() {
                    warnings.push(ValidationWarning::question(
                        &q.id,
                        "project has no modules for the pseudocode milestone",
                    ));
                }
                if brief.strategies.is_empty() {
                    warnings.push(ValidationWarning::question(
                        &q.id,
                        "project has no strategies for the strategy milestone",
                    ));
                }
                if brief.justification_prompts.is_empty() {
                    warnings.push(ValidationWarning::question(
                        &q.id,
                        "project has no justification prompts",
                    ));
                }
            }
            QuestionContent::FreeText { .. } | QuestionContent::Code { .. } => {}
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[assessment]
id = "mini-sim"
title = "Mini Simulation"
duration_minutes = 30
difficulty = "medium"

[[phases]]
label = "Day 1"
guidelines = ["Keep your camera on"]

[[phases.sections]]
label = "Aptitude"
category = "aptitude"

[[phases.sections.questions]]
id = "apt-1"
kind = "multiple_choice"
text = "What is 12 x 12?"
options = [{ text = "124" }, { text = "144", correct = true }]

[[phases.sections.questions]]
id = "apt-2"
kind = "multi_select"
difficulty = "hard"
text = "Which numbers are prime?"
options = [{ text = "2", correct = true }, { text = "4" }, { text = "7", correct = true }]

[[phases.sections]]
label = "Coding"
category = "coding"

[[phases.sections.questions]]
id = "code-1"
kind = "code"
statement = "Reverse a linked list"
constraints = ["n <= 10^5"]
samples = [{ input = "1 2 3", output = "3 2 1" }]

[[phases]]
label = "Day 2"

[[phases.sections]]
label = "Project"
category = "project"

[[phases.sections.questions]]
id = "proj-1"
kind = "project"
title = "Library management"
modules = ["catalog", "loans"]
strategies = ["monolith", "microservices"]
justification_prompts = ["Why this schema?"]
"#;

    #[test]
    fn parse_valid_toml() {
        let a = parse_assessment_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(a.id, "mini-sim");
        assert_eq!(a.phases.len(), 2);
        assert_eq!(a.phases[1].index, 1);
        assert_eq!(a.question_count(), 4);

        let apt2 = a.find_question("apt-2").unwrap();
        assert_eq!(apt2.category, Category::Aptitude);
        assert_eq!(apt2.difficulty, Difficulty::Hard);
        assert!(matches!(apt2.content, QuestionContent::MultiSelect { .. }));

        let proj = a.find_question("proj-1").unwrap();
        assert_eq!(proj.project().unwrap().modules.len(), 2);

        assert!(validate_assessment(&a).is_empty());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_assessment_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn parse_unknown_kind_fails() {
        let toml = r#"
[assessment]
id = "x"
title = "X"
duration_minutes = 5

[[phases]]
label = "Only"

[[phases.sections]]
label = "S"
category = "domain"

[[phases.sections.questions]]
id = "q"
kind = "essay_plus"
prompt = "?"
"#;
        assert!(parse_assessment_str(toml, &PathBuf::from("x.toml")).is_err());
    }

    #[test]
    fn validate_reports_authoring_issues() {
        let toml = r#"
[assessment]
id = "issues"
title = "Issues"
duration_minutes = 0

[[phases]]
label = "Day 1"

[[phases.sections]]
label = "Mixed"
category = "technical"

[[phases.sections.questions]]
id = "dup"
kind = "multiple_choice"
text = "?"
options = [{ text = "a" }, { text = "b" }]

[[phases.sections.questions]]
id = "dup"
kind = "code"
statement = "wrong category"

[[phases]]
label = "Day 2"
"#;
        let a = parse_assessment_str(toml, &PathBuf::from("issues.toml")).unwrap();
        let messages: Vec<String> = validate_assessment(&a)
            .into_iter()
            .map(|w| w.message)
            .collect();

        assert!(messages.iter().any(|m| m.contains("duration_minutes is 0")));
        assert!(messages.iter().any(|m| m.contains("duplicate question ID")));
        assert!(messages.iter().any(|m| m.contains("exactly one correct")));
        assert!(messages.iter().any(|m| m.contains("does not fit category")));
        assert!(messages.iter().any(|m| m.contains("has no sections")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "nope = [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let assessments = load_assessment_directory(dir.path()).unwrap();
        assert_eq!(assessments.len(), 1);
        assert_eq!(assessments[0].id, "mini-sim");
    }
}
