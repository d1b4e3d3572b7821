//! Read-only attempt summaries with JSON persistence and markdown output.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answers::AnswerValue;
use crate::attempt::{Attempt, EndReason};
use crate::model::Category;

/// Summary of a finalized attempt. No score is computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub attempt_id: Uuid,
    pub assessment_id: String,
    pub assessment_title: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub end_reason: Option<EndReason>,
    /// Allotted time in seconds.
    pub duration_secs: u32,
    pub seconds_used: u32,
    pub sections: Vec<SectionSummary>,
    /// Question ids with no answer, in traversal order.
    pub unanswered: Vec<String>,
    pub flagged: Vec<String>,
    /// Answers keyed by their composite key.
    pub answers: BTreeMap<String, AnswerValue>,
}

/// Per-section answered/flagged counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    pub phase: String,
    pub section: String,
    pub category: Category,
    pub total: usize,
    pub answered: usize,
    pub flagged: usize,
}

impl AttemptSummary {
    pub(crate) fn from_attempt(attempt: &Attempt) -> Self {
        let assessment = attempt.assessment();

        let sections = assessment
            .phases
            .iter()
            .flat_map(|phase| {
                phase.sections.iter().map(move |section| SectionSummary {
                    phase: phase.label.clone(),
                    section: section.label.clone(),
                    category: section.category,
                    total: section.questions.len(),
                    answered: section
                        .questions
                        .iter()
                        .filter(|q| attempt.is_answered(&q.id))
                        .count(),
                    flagged: section
                        .questions
                        .iter()
                        .filter(|q| attempt.is_flagged(&q.id))
                        .count(),
                })
            })
            .collect();

        let unanswered = assessment
            .questions()
            .filter(|q| !attempt.is_answered(&q.id))
            .map(|q| q.id.clone())
            .collect();

        Self {
            attempt_id: attempt.id(),
            assessment_id: assessment.id.clone(),
            assessment_title: assessment.title.clone(),
            started_at: attempt.started_at(),
            finished_at: attempt.finished_at(),
            end_reason: attempt.end_reason(),
            duration_secs: attempt.timer().total_secs(),
            seconds_used: attempt.timer().elapsed_secs(),
            sections,
            unanswered,
            flagged: attempt.flags().map(str::to_string).collect(),
            answers: attempt.answers().to_flat_map(),
        }
    }

    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.total).sum()
    }

    pub fn answered_questions(&self) -> usize {
        self.sections.iter().map(|s| s.answered).sum()
    }

    /// Fraction of questions with at least one answer.
    pub fn completion_rate(&self) -> f64 {
        match self.total_questions() {
            0 => 0.0,
            total => self.answered_questions() as f64 / total as f64,
        }
    }

    pub fn end_label(&self) -> String {
        self.end_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "in progress".to_string())
    }

    /// Save the summary as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize summary")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        Ok(())
    }

    /// Load a summary from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read summary from {}", path.display()))?;
        let summary: AttemptSummary =
            serde_json::from_str(&content).context("failed to parse summary JSON")?;
        Ok(summary)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.assessment_title));
        md.push_str(&format!(
            "**Result:** {}: {}/{} answered ({:.1}%), {} flagged, {}s of {}s used\n\n",
            self.end_label(),
            self.answered_questions(),
            self.total_questions(),
            self.completion_rate() * 100.0,
            self.flagged.len(),
            self.seconds_used,
            self.duration_secs,
        ));

        md.push_str("| Phase | Section | Category | Answered | Flagged |\n");
        md.push_str("|-------|---------|----------|----------|---------|\n");
        for s in &self.sections {
            md.push_str(&format!(
                "| {} | {} | {} | {}/{} | {} |\n",
                s.phase, s.section, s.category, s.answered, s.total, s.flagged
            ));
        }

        if !self.unanswered.is_empty() {
            md.push_str("\n### Unanswered\n\n");
            for id in &self.unanswered {
                md.push_str(&format!("- {id}\n"));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::attempt::TraversalPolicy;
    use crate::model::fixtures::grid;

    fn finished_summary() -> AttemptSummary {
        let mut attempt =
            Attempt::new(Arc::new(grid(1, 2, 2, 5)), TraversalPolicy::default()).unwrap();
        attempt.accept().unwrap();
        attempt.synchronize().unwrap();
        attempt
            .record_answer("p0s0q0", AnswerValue::Choice(0))
            .unwrap();
        attempt.toggle_flag("p0s1q1").unwrap();
        attempt.tick();
        attempt.tick();
        for _ in 0..4 {
            attempt.next().unwrap();
        }
        attempt.summary().unwrap()
    }

    #[test]
    fn counts_per_section() {
        let summary = finished_summary();
        assert_eq!(summary.total_questions(), 4);
        assert_eq!(summary.answered_questions(), 1);
        assert_eq!(summary.sections[0].answered, 1);
        assert_eq!(summary.sections[1].flagged, 1);
        assert_eq!(summary.unanswered, vec!["p0s0q1", "p0s1q0", "p0s1q1"]);
        assert_eq!(summary.seconds_used, 2);
        assert_eq!(summary.end_reason, Some(EndReason::Completed));
        assert!((summary.completion_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn json_roundtrip() {
        let summary = finished_summary();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.json");

        summary.save_json(&path).unwrap();
        let loaded = AttemptSummary::load_json(&path).unwrap();

        assert_eq!(loaded.attempt_id, summary.attempt_id);
        assert_eq!(loaded.answers.get("p0s0q0"), Some(&AnswerValue::Choice(0)));
    }

    #[test]
    fn markdown_output() {
        let md = finished_summary().to_markdown();
        assert!(md.contains("completed"));
        assert!(md.contains("| Day 1 | Section 1 | aptitude | 1/2 | 0 |"));
        assert!(md.contains("### Unanswered"));
    }
}
