//! Attempt error types.
//!
//! Cursor moves at sequence boundaries and timer exhaustion are not errors.
//! These variants cover operations the current attempt state does not permit.

use thiserror::Error;

use crate::attempt::AttemptStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The operation is not available in the current status.
    #[error("cannot {action} while the attempt is in {status}")]
    InvalidState {
        action: &'static str,
        status: AttemptStatus,
    },

    /// No question with this id exists in the assessment.
    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    /// The question exists but belongs to a phase other than the current one.
    #[error("question {0} is not part of the current phase")]
    OutsideCurrentPhase(String),

    /// A milestone answer was recorded for a non-project question.
    #[error("question {0} is not a project question")]
    NotAProject(String),

    /// The milestone sub-index is missing, unexpected, or out of range.
    #[error("invalid milestone answer for {question_id}: {reason}")]
    InvalidMilestone { question_id: String, reason: String },

    #[error("question index {index} is out of range for a section of {len} questions")]
    SelectionOutOfRange { index: usize, len: usize },

    /// Two questions of the assessment share an id.
    #[error("assessment {assessment_id} reuses question id {question_id}")]
    DuplicateQuestion {
        assessment_id: String,
        question_id: String,
    },

    /// The assessment has an empty phase, section, or question list.
    #[error("assessment {0} cannot be traversed: it has an empty phase, section, or question list")]
    EmptyStructure(String),
}
