//! Navigation cursor over the phase/section/question hierarchy.
//!
//! The cursor only knows positions. Status changes implied by a move
//! (phase interstitial, finalization) are applied by the attempt.

use serde::{Deserialize, Serialize};

use crate::error::AttemptError;
use crate::model::{Assessment, Phase, Question, Section};

/// A position in the assessment. Ordering is lexicographic over
/// (phase, section, question), which is also traversal order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Cursor {
    pub phase: usize,
    pub section: usize,
    pub question: usize,
}

/// Result of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Next question in the same section.
    Question,
    /// First question of the next section in the same phase.
    Section,
    /// First question of the next phase.
    Phase,
    /// Already on the last question; the cursor did not move.
    Exhausted,
}

/// Result of moving backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    Question,
    Section,
    /// Last question of the previous phase (only with cross-phase retreat).
    Phase,
    /// At a boundary retreat may not cross; the cursor did not move.
    Boundary,
}

impl Cursor {
    pub fn new(phase: usize, section: usize, question: usize) -> Self {
        Self {
            phase,
            section,
            question,
        }
    }

    pub fn is_valid(&self, assessment: &Assessment) -> bool {
        assessment
            .phases
            .get(self.phase)
            .and_then(|p| p.sections.get(self.section))
            .is_some_and(|s| self.question < s.questions.len())
    }

    pub fn phase<'a>(&self, assessment: &'a Assessment) -> &'a Phase {
        &assessment.phases[self.phase]
    }

    pub fn section<'a>(&self, assessment: &'a Assessment) -> &'a Section {
        &self.phase(assessment).sections[self.section]
    }

    pub fn question<'a>(&self, assessment: &'a Assessment) -> &'a Question {
        &self.section(assessment).questions[self.question]
    }

    pub fn advance(&mut self, assessment: &Assessment) -> Advance {
        let phase = self.phase(assessment);
        let section = &phase.sections[self.section];

        if self.question + 1 < section.questions.len() {
            self.question += 1;
            Advance::Question
        } else if self.section + 1 < phase.sections.len() {
            self.section += 1;
            self.question = 0;
            Advance::Section
        } else if self.phase + 1 < assessment.phases.len() {
            *self = Cursor::new(self.phase + 1, 0, 0);
            Advance::Phase
        } else {
            Advance::Exhausted
        }
    }

    pub fn retreat(&mut self, assessment: &Assessment, cross_phase: bool) -> Retreat {
        if self.question > 0 {
            self.question -= 1;
            return Retreat::Question;
        }

        if self.section > 0 {
            self.section -= 1;
            self.question = last_index(self.section(assessment).questions.len());
            return Retreat::Section;
        }

        if cross_phase && self.phase > 0 {
            self.phase -= 1;
            self.section = last_index(self.phase(assessment).sections.len());
            self.question = last_index(self.section(assessment).questions.len());
            return Retreat::Phase;
        }

        Retreat::Boundary
    }

    /// Jump to a question of the current section.
    pub fn select(&mut self, assessment: &Assessment, index: usize) -> Result<(), AttemptError> {
        let len = self.section(assessment).questions.len();
        if index >= len {
            return Err(AttemptError::SelectionOutOfRange { index, len });
        }
        self.question = index;
        Ok(())
    }
}

fn last_index(len: usize) -> usize {
    len.saturating_sub(1)
}
