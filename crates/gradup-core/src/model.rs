//! Core data model types for gradup.
//!
//! An [`Assessment`] is a fixed hierarchy of phases, sections and questions.
//! It is loaded once when an attempt starts and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Skill category of a section or question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Aptitude,
    Technical,
    Coding,
    Project,
    Communication,
    Psychometric,
    Domain,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Aptitude,
        Category::Technical,
        Category::Coding,
        Category::Project,
        Category::Communication,
        Category::Psychometric,
        Category::Domain,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Aptitude => "aptitude",
            Category::Technical => "technical",
            Category::Coding => "coding",
            Category::Project => "project",
            Category::Communication => "communication",
            Category::Psychometric => "psychometric",
            Category::Domain => "domain",
        };
        f.write_str(s)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.to_string() == s.to_lowercase())
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Communication sub-skill exercised by a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommSkill {
    Listening,
    Speaking,
    Reading,
    Writing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// One option of a choice question. `correct` is never shown to the taker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// A sample input/output pair for a coding problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleIo {
    pub input: String,
    pub output: String,
}

/// The five fixed sub-tasks of a project question, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Milestone {
    Proposal,
    Schema,
    Pseudocode,
    Strategy,
    Justification,
}

impl Milestone {
    pub const ALL: [Milestone; 5] = [
        Milestone::Proposal,
        Milestone::Schema,
        Milestone::Pseudocode,
        Milestone::Strategy,
        Milestone::Justification,
    ];

    /// Tag used in composite answer keys.
    pub fn tag(&self) -> &'static str {
        match self {
            Milestone::Proposal => "proposal",
            Milestone::Schema => "schema",
            Milestone::Pseudocode => "pseudocode",
            Milestone::Strategy => "strategy",
            Milestone::Justification => "justification",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Milestone::Proposal => "Solution Proposal",
            Milestone::Schema => "Schema",
            Milestone::Pseudocode => "Pseudocode",
            Milestone::Strategy => "Strategy",
            Milestone::Justification => "Justification",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Milestone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Milestone::ALL
            .into_iter()
            .find(|m| m.tag() == s.to_lowercase())
            .ok_or_else(|| format!("unknown milestone: {s}"))
    }
}

/// Material backing the five milestones of a project question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBrief {
    pub title: String,
    #[serde(default)]
    pub brief: String,
    /// One pseudocode answer is expected per module.
    #[serde(default)]
    pub modules: Vec<String>,
    /// Candidate strategies; the strategy milestone picks one.
    #[serde(default)]
    pub strategies: Vec<String>,
    /// One justification answer is expected per prompt.
    #[serde(default)]
    pub justification_prompts: Vec<String>,
}

impl ProjectBrief {
    /// Number of sub-answers a milestone takes, or `None` for single-answer milestones.
    pub fn sub_items(&self, milestone: Milestone) -> Option<usize> {
        match milestone {
            Milestone::Pseudocode => Some(self.modules.len()),
            Milestone::Justification => Some(self.justification_prompts.len()),
            Milestone::Proposal | Milestone::Schema | Milestone::Strategy => None,
        }
    }
}

/// Content payload of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionContent {
    MultipleChoice {
        text: String,
        options: Vec<ChoiceOption>,
    },
    MultiSelect {
        text: String,
        options: Vec<ChoiceOption>,
    },
    FreeText {
        prompt: String,
    },
    Code {
        statement: String,
        #[serde(default)]
        constraints: Vec<String>,
        #[serde(default)]
        samples: Vec<SampleIo>,
    },
    Project(ProjectBrief),
}

impl QuestionContent {
    pub fn kind(&self) -> &'static str {
        match self {
            QuestionContent::MultipleChoice { .. } => "multiple_choice",
            QuestionContent::MultiSelect { .. } => "multi_select",
            QuestionContent::FreeText { .. } => "free_text",
            QuestionContent::Code { .. } => "code",
            QuestionContent::Project(_) => "project",
        }
    }

    /// Headline text shown to the taker.
    pub fn headline(&self) -> &str {
        match self {
            QuestionContent::MultipleChoice { text, .. }
            | QuestionContent::MultiSelect { text, .. } => text,
            QuestionContent::FreeText { prompt } => prompt,
            QuestionContent::Code { statement, .. } => statement,
            QuestionContent::Project(brief) => &brief.title,
        }
    }

    /// Whether this content shape is allowed for the given category.
    pub fn fits(&self, category: Category) -> bool {
        match (self, category) {
            (QuestionContent::Project(_), c) => c == Category::Project,
            (QuestionContent::Code { .. }, c) => c == Category::Coding,
            (_, Category::Project | Category::Coding) => false,
            _ => true,
        }
    }
}

/// The atomic evaluable unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub category: Category,
    #[serde(default)]
    pub skill: Option<CommSkill>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub content: QuestionContent,
}

impl Question {
    /// Single-answer choice questions outside projects move on by themselves.
    pub fn auto_advances(&self) -> bool {
        matches!(self.content, QuestionContent::MultipleChoice { .. })
            && self.category != Category::Project
    }

    pub fn project(&self) -> Option<&ProjectBrief> {
        match &self.content {
            QuestionContent::Project(brief) => Some(brief),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub label: String,
    pub category: Category,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// An ordered top-level grouping, e.g. one day of a multi-day simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Position in the assessment, assigned by [`Assessment::normalized`].
    #[serde(default)]
    pub index: usize,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub guidelines: Vec<String>,
}

/// The configuration an attempt is created from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

impl Assessment {
    /// Reassign phase indices from their order.
    pub fn normalized(mut self) -> Self {
        for (i, phase) in self.phases.iter_mut().enumerate() {
            phase.index = i;
        }
        self
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    /// All questions in traversal order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.phases
            .iter()
            .flat_map(|p| p.sections.iter())
            .flat_map(|s| s.questions.iter())
    }

    pub fn question_count(&self) -> usize {
        self.questions().count()
    }

    pub fn find_question(&self, id: &str) -> Option<&Question> {
        self.questions().find(|q| q.id == id)
    }

    /// Index of the phase that holds a question.
    pub fn phase_of(&self, id: &str) -> Option<usize> {
        self.phases.iter().position(|p| {
            p.sections
                .iter()
                .any(|s| s.questions.iter().any(|q| q.id == id))
        })
    }

    /// The first question id that occurs more than once, if any.
    pub fn duplicate_question_id(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.questions()
            .map(|q| q.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    /// True when every phase has sections and every section has questions.
    pub fn is_traversable(&self) -> bool {
        !self.phases.is_empty()
            && self.phases.iter().all(|p| {
                !p.sections.is_empty() && p.sections.iter().all(|s| !s.questions.is_empty())
            })
    }

    pub fn info(&self) -> AssessmentInfo {
        AssessmentInfo {
            id: self.id.clone(),
            title: self.title.clone(),
            duration_minutes: self.duration_minutes,
            question_count: self.question_count(),
            difficulty: self.difficulty,
        }
    }
}

/// Listing metadata for an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentInfo {
    pub id: String,
    pub title: String,
    pub duration_minutes: u32,
    pub question_count: usize,
    pub difficulty: Difficulty,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn mcq(id: &str) -> Question {
        Question {
            id: id.into(),
            category: Category::Aptitude,
            skill: None,
            difficulty: Difficulty::Easy,
            content: QuestionContent::MultipleChoice {
                text: format!("question {id}"),
                options: vec![
                    ChoiceOption {
                        text: "a".into(),
                        correct: true,
                    },
                    ChoiceOption {
                        text: "b".into(),
                        correct: false,
                    },
                ],
            },
        }
    }

    pub fn free_text(id: &str) -> Question {
        Question {
            id: id.into(),
            category: Category::Communication,
            skill: Some(CommSkill::Writing),
            difficulty: Difficulty::Medium,
            content: QuestionContent::FreeText {
                prompt: "Describe yourself".into(),
            },
        }
    }

    pub fn project(id: &str) -> Question {
        Question {
            id: id.into(),
            category: Category::Project,
            skill: None,
            difficulty: Difficulty::Hard,
            content: QuestionContent::Project(ProjectBrief {
                title: "Library system".into(),
                brief: "Design a library management system".into(),
                modules: vec!["catalog".into(), "loans".into()],
                strategies: vec!["monolith".into(), "services".into()],
                justification_prompts: vec!["why".into()],
            }),
        }
    }

    /// `phases` x `sections` x `questions` grid of MCQs with ids `p{i}s{j}q{k}`.
    pub fn grid(phases: usize, sections: usize, questions: usize, minutes: u32) -> Assessment {
        Assessment {
            id: "grid".into(),
            title: "Grid".into(),
            description: String::new(),
            duration_minutes: minutes,
            difficulty: Difficulty::Medium,
            phases: (0..phases)
                .map(|p| Phase {
                    index: p,
                    label: format!("Day {}", p + 1),
                    description: String::new(),
                    guidelines: vec!["No calculators".into()],
                    sections: (0..sections)
                        .map(|s| Section {
                            label: format!("Section {}", s + 1),
                            category: Category::Aptitude,
                            questions: (0..questions)
                                .map(|q| mcq(&format!("p{p}s{s}q{q}")))
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
