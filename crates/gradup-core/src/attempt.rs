//! Attempt traversal state machine.
//!
//! An [`Attempt`] owns the cursor, countdown, answers and flags for one
//! taker's pass through one assessment. Status only moves forward:
//!
//! ```text
//! INSTRUCTIONS --accept--> PHASE_START --synchronize--> ACTIVE --> REPORT
//!                               ^                          |
//!                               +---- next crosses phase --+
//! ```
//!
//! Cursor exhaustion and timer exhaustion both finalize into REPORT, after
//! which nothing can be mutated.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::Action;
use crate::answers::{AnswerKey, AnswerStore, AnswerValue};
use crate::cursor::{Advance, Cursor, Retreat};
use crate::error::AttemptError;
use crate::model::{Assessment, Milestone, Phase, Question, Section};
use crate::report::AttemptSummary;
use crate::timer::{Countdown, Tick};

/// Delay before a single-choice answer moves to the next question.
pub const DEFAULT_AUTO_ADVANCE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    Instructions,
    PhaseStart,
    Active,
    Report,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::Instructions => write!(f, "INSTRUCTIONS"),
            AttemptStatus::PhaseStart => write!(f, "PHASE_START"),
            AttemptStatus::Active => write!(f, "ACTIVE"),
            AttemptStatus::Report => write!(f, "REPORT"),
        }
    }
}

/// Why an attempt reached REPORT. Only the report view distinguishes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Completed,
    TimeExpired,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Completed => write!(f, "completed"),
            EndReason::TimeExpired => write!(f, "time expired"),
        }
    }
}

/// Navigation policies that vary between deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalPolicy {
    /// Delay before answering a single-choice question advances; `None` disables.
    pub auto_advance: Option<Duration>,
    /// Whether `prev` may move back into an earlier phase.
    pub allow_cross_phase_retreat: bool,
}

impl Default for TraversalPolicy {
    fn default() -> Self {
        Self {
            auto_advance: Some(DEFAULT_AUTO_ADVANCE),
            allow_cross_phase_retreat: false,
        }
    }
}

/// Result of a forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Question,
    Section,
    /// Crossed into the next phase; the attempt is back in PHASE_START.
    Phase,
    /// Moved past the last question; the attempt is in REPORT.
    Completed,
}

/// A pending auto-advance, to be applied after `delay` via
/// [`Attempt::auto_advance`]. It is stale once the cursor leaves `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoAdvance {
    pub from: Cursor,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not ACTIVE; the clock holds.
    Ignored,
    Running(u32),
    /// The clock ran out and the attempt was finalized.
    Expired,
}

/// What applying an [`Action`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Status(AttemptStatus),
    Advanced(Step),
    Retreated(Retreat),
    Selected(Cursor),
    Answered(Option<AutoAdvance>),
    Flagged(bool),
    Ticked(TickOutcome),
}

/// One row of the navigation sidebar for the current section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarEntry {
    pub index: usize,
    pub question_id: String,
    pub answered: bool,
    pub flagged: bool,
    pub current: bool,
}

#[derive(Debug, Clone)]
pub struct Attempt {
    id: Uuid,
    assessment: Arc<Assessment>,
    policy: TraversalPolicy,
    status: AttemptStatus,
    cursor: Cursor,
    timer: Countdown,
    answers: AnswerStore,
    flags: BTreeSet<String>,
    end_reason: Option<EndReason>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Attempt {
    /// Start an attempt in INSTRUCTIONS at the first question.
    pub fn new(assessment: Arc<Assessment>, policy: TraversalPolicy) -> Result<Self, AttemptError> {
        if !assessment.is_traversable() {
            return Err(AttemptError::EmptyStructure(assessment.id.clone()));
        }
        if let Some(question_id) = assessment.duplicate_question_id() {
            return Err(AttemptError::DuplicateQuestion {
                assessment_id: assessment.id.clone(),
                question_id: question_id.to_string(),
            });
        }

        let timer = Countdown::from_minutes(assessment.duration_minutes);
        let id = Uuid::new_v4();
        tracing::debug!(
            attempt = %id,
            assessment = %assessment.id,
            seconds = timer.total_secs(),
            "attempt created"
        );

        Ok(Self {
            id,
            assessment,
            policy,
            status: AttemptStatus::Instructions,
            cursor: Cursor::default(),
            timer,
            answers: AnswerStore::new(),
            flags: BTreeSet::new(),
            end_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        })
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// INSTRUCTIONS → PHASE_START.
    pub fn accept(&mut self) -> Result<(), AttemptError> {
        self.require(AttemptStatus::Instructions, "accept the instructions")?;
        self.set_status(AttemptStatus::PhaseStart);
        Ok(())
    }

    /// PHASE_START → ACTIVE.
    pub fn synchronize(&mut self) -> Result<(), AttemptError> {
        self.require(AttemptStatus::PhaseStart, "start the phase")?;
        self.set_status(AttemptStatus::Active);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Move forward. In REPORT this is a no-op that returns [`Step::Completed`].
    pub fn next(&mut self) -> Result<Step, AttemptError> {
        if self.status == AttemptStatus::Report {
            return Ok(Step::Completed);
        }
        self.require(AttemptStatus::Active, "move forward")?;

        let step = match self.cursor.advance(&self.assessment) {
            Advance::Question => Step::Question,
            Advance::Section => Step::Section,
            Advance::Phase => {
                self.set_status(AttemptStatus::PhaseStart);
                Step::Phase
            }
            Advance::Exhausted => {
                self.finalize(EndReason::Completed);
                Step::Completed
            }
        };
        tracing::debug!(attempt = %self.id, cursor = ?self.cursor, ?step, "next");
        Ok(step)
    }

    /// Move back. In REPORT this is a no-op that returns [`Retreat::Boundary`].
    pub fn prev(&mut self) -> Result<Retreat, AttemptError> {
        if self.status == AttemptStatus::Report {
            return Ok(Retreat::Boundary);
        }
        self.require(AttemptStatus::Active, "move back")?;
        let retreat = self
            .cursor
            .retreat(&self.assessment, self.policy.allow_cross_phase_retreat);
        tracing::debug!(attempt = %self.id, cursor = ?self.cursor, ?retreat, "prev");
        Ok(retreat)
    }

    /// Jump to a question of the current section.
    pub fn select(&mut self, index: usize) -> Result<Cursor, AttemptError> {
        self.require(AttemptStatus::Active, "select a question")?;
        self.cursor.select(&self.assessment, index)?;
        Ok(self.cursor)
    }

    /// Apply a scheduled auto-advance. Returns `None` when it went stale.
    pub fn auto_advance(&mut self, pending: &AutoAdvance) -> Result<Option<Step>, AttemptError> {
        if self.status != AttemptStatus::Active || self.cursor != pending.from {
            tracing::debug!(attempt = %self.id, from = ?pending.from, "auto-advance dropped");
            return Ok(None);
        }
        self.next().map(Some)
    }

    // -----------------------------------------------------------------------
    // Answers and flags
    // -----------------------------------------------------------------------

    /// Record or overwrite the answer to a question of the current phase.
    ///
    /// Returns an [`AutoAdvance`] when the answered question is the current
    /// one, is single-choice outside a project, and the policy enables it.
    pub fn record_answer(
        &mut self,
        question_id: &str,
        value: AnswerValue,
    ) -> Result<Option<AutoAdvance>, AttemptError> {
        self.require(AttemptStatus::Active, "record an answer")?;
        let question = self.question_in_phase(question_id)?;
        let auto = question.auto_advances();
        let is_current = self.current_question().id == question_id;

        self.answers.record(AnswerKey::question(question_id), value);

        Ok(match self.policy.auto_advance {
            Some(delay) if auto && is_current => Some(AutoAdvance {
                from: self.cursor,
                delay,
            }),
            _ => None,
        })
    }

    /// Record one milestone of a project question under its composite key.
    pub fn record_milestone_answer(
        &mut self,
        question_id: &str,
        milestone: Milestone,
        sub_index: Option<usize>,
        value: AnswerValue,
    ) -> Result<AnswerKey, AttemptError> {
        self.require(AttemptStatus::Active, "record a milestone")?;
        let question = self.question_in_phase(question_id)?;
        let brief = question
            .project()
            .ok_or_else(|| AttemptError::NotAProject(question_id.to_string()))?;

        let invalid = |reason: String| AttemptError::InvalidMilestone {
            question_id: question_id.to_string(),
            reason,
        };
        match (brief.sub_items(milestone), sub_index) {
            (None, None) => {}
            (None, Some(_)) => {
                return Err(invalid(format!("{milestone} takes no sub-index")));
            }
            (Some(_), None) => {
                return Err(invalid(format!("{milestone} needs a sub-index")));
            }
            (Some(len), Some(i)) if i >= len => {
                return Err(invalid(format!(
                    "{milestone} sub-index {i} is out of range for {len} items"
                )));
            }
            (Some(_), Some(_)) => {}
        }

        let key = AnswerKey::milestone(question_id, milestone, sub_index);
        self.answers.record(key.clone(), value);
        Ok(key)
    }

    /// Toggle the review-later flag; returns the new state.
    pub fn toggle_flag(&mut self, question_id: &str) -> Result<bool, AttemptError> {
        self.require(AttemptStatus::Active, "flag a question")?;
        self.question_in_phase(question_id)?;

        if self.flags.remove(question_id) {
            Ok(false)
        } else {
            self.flags.insert(question_id.to_string());
            Ok(true)
        }
    }

    // -----------------------------------------------------------------------
    // Timer
    // -----------------------------------------------------------------------

    /// One second of wall time. Only ACTIVE attempts consume it.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != AttemptStatus::Active {
            return TickOutcome::Ignored;
        }
        match self.timer.tick() {
            Tick::Running(remaining) => TickOutcome::Running(remaining),
            Tick::Expired | Tick::Stopped => {
                self.finalize(EndReason::TimeExpired);
                TickOutcome::Expired
            }
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Apply an action. Auto-advance requests are returned, not executed.
    pub fn apply(&mut self, action: &Action) -> Result<ActionOutcome, AttemptError> {
        match action {
            Action::Accept => self.accept().map(|_| ActionOutcome::Status(self.status)),
            Action::Synchronize => self
                .synchronize()
                .map(|_| ActionOutcome::Status(self.status)),
            Action::Next => self.next().map(ActionOutcome::Advanced),
            Action::Prev => self.prev().map(ActionOutcome::Retreated),
            Action::Select { index } => self.select(*index).map(ActionOutcome::Selected),
            Action::Answer { question_id, value } => self
                .record_answer(question_id, value.clone())
                .map(ActionOutcome::Answered),
            Action::Milestone {
                question_id,
                milestone,
                sub_index,
                value,
            } => self
                .record_milestone_answer(question_id, *milestone, *sub_index, value.clone())
                .map(|_| ActionOutcome::Answered(None)),
            Action::Flag { question_id } => {
                self.toggle_flag(question_id).map(ActionOutcome::Flagged)
            }
            Action::Tick { seconds } => {
                let mut outcome = TickOutcome::Ignored;
                for _ in 0..*seconds {
                    outcome = self.tick();
                    if !matches!(outcome, TickOutcome::Running(_)) {
                        break;
                    }
                }
                Ok(ActionOutcome::Ticked(outcome))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn policy(&self) -> &TraversalPolicy {
        &self.policy
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_phase(&self) -> &Phase {
        self.cursor.phase(&self.assessment)
    }

    pub fn current_section(&self) -> &Section {
        self.cursor.section(&self.assessment)
    }

    pub fn current_question(&self) -> &Question {
        self.cursor.question(&self.assessment)
    }

    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    pub fn remaining_secs(&self) -> u32 {
        self.timer.remaining_secs()
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.is_answered(question_id)
    }

    pub fn is_flagged(&self, question_id: &str) -> bool {
        self.flags.contains(question_id)
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Sidebar rows for the current section.
    pub fn sidebar(&self) -> Vec<SidebarEntry> {
        self.current_section()
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| SidebarEntry {
                index,
                question_id: q.id.clone(),
                answered: self.answers.is_answered(&q.id),
                flagged: self.flags.contains(&q.id),
                current: index == self.cursor.question,
            })
            .collect()
    }

    /// Read-only summary; only available once the attempt is in REPORT.
    pub fn summary(&self) -> Result<AttemptSummary, AttemptError> {
        self.require(AttemptStatus::Report, "summarize")?;
        Ok(AttemptSummary::from_attempt(self))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require(&self, status: AttemptStatus, action: &'static str) -> Result<(), AttemptError> {
        if self.status == status {
            Ok(())
        } else {
            Err(AttemptError::InvalidState {
                action,
                status: self.status,
            })
        }
    }

    fn set_status(&mut self, status: AttemptStatus) {
        tracing::debug!(attempt = %self.id, from = %self.status, to = %status, "status change");
        self.status = status;
    }

    fn finalize(&mut self, reason: EndReason) {
        self.set_status(AttemptStatus::Report);
        self.end_reason = Some(reason);
        self.finished_at = Some(Utc::now());
        tracing::info!(
            attempt = %self.id,
            assessment = %self.assessment.id,
            %reason,
            answered = self.answers.len(),
            "attempt finalized"
        );
    }

    fn question_in_phase(&self, question_id: &str) -> Result<&Question, AttemptError> {
        let question = self
            .assessment
            .find_question(question_id)
            .ok_or_else(|| AttemptError::UnknownQuestion(question_id.to_string()))?;
        if self.assessment.phase_of(question_id) != Some(self.cursor.phase) {
            return Err(AttemptError::OutsideCurrentPhase(question_id.to_string()));
        }
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{free_text, grid, project};

    fn start(assessment: Assessment) -> Attempt {
        let mut attempt = Attempt::new(Arc::new(assessment), TraversalPolicy::default()).unwrap();
        attempt.accept().unwrap();
        attempt.synchronize().unwrap();
        attempt
    }

    fn single_section(questions: Vec<Question>) -> Assessment {
        let mut a = grid(1, 1, 1, 10);
        a.phases[0].sections[0].questions = questions;
        a
    }

    #[test]
    fn forward_traversal_is_monotonic_until_report() {
        let mut attempt = start(grid(3, 2, 2, 60));
        let mut last = attempt.cursor();

        loop {
            let step = attempt.next().unwrap();
            if step == Step::Completed {
                break;
            }
            assert!(attempt.cursor() > last);
            last = attempt.cursor();
            if step == Step::Phase {
                assert_eq!(attempt.status(), AttemptStatus::PhaseStart);
                attempt.synchronize().unwrap();
            }
        }

        assert_eq!(attempt.status(), AttemptStatus::Report);
        assert_eq!(attempt.end_reason(), Some(EndReason::Completed));
        assert_eq!(attempt.cursor(), last);
    }

    #[test]
    fn prev_at_first_question_is_noop() {
        let mut attempt = start(grid(2, 2, 2, 10));
        assert_eq!(attempt.prev().unwrap(), Retreat::Boundary);
        assert_eq!(attempt.cursor(), Cursor::default());
        assert_eq!(attempt.status(), AttemptStatus::Active);
    }

    #[test]
    fn timer_forces_report_after_sixty_ticks() {
        let mut attempt = start(grid(1, 1, 5, 1));
        attempt.next().unwrap();

        for _ in 0..59 {
            assert!(matches!(attempt.tick(), TickOutcome::Running(_)));
        }
        assert_eq!(attempt.tick(), TickOutcome::Expired);
        assert_eq!(attempt.status(), AttemptStatus::Report);
        assert_eq!(attempt.end_reason(), Some(EndReason::TimeExpired));
        assert_eq!(attempt.tick(), TickOutcome::Ignored);
    }

    #[test]
    fn clock_holds_outside_active() {
        let mut attempt = Attempt::new(Arc::new(grid(2, 1, 1, 1)), TraversalPolicy::default())
            .unwrap();
        assert_eq!(attempt.tick(), TickOutcome::Ignored);
        attempt.accept().unwrap();
        assert_eq!(attempt.tick(), TickOutcome::Ignored);
        assert_eq!(attempt.remaining_secs(), 60);

        attempt.synchronize().unwrap();
        attempt.tick();
        attempt.next().unwrap();
        assert_eq!(attempt.status(), AttemptStatus::PhaseStart);
        assert_eq!(attempt.tick(), TickOutcome::Ignored);
        assert_eq!(attempt.remaining_secs(), 59);
    }

    #[test]
    fn recording_same_answer_twice_is_idempotent() {
        let mut attempt = start(single_section(vec![free_text("essay")]));
        attempt
            .record_answer("essay", AnswerValue::Text("hi".into()))
            .unwrap();
        attempt
            .record_answer("essay", AnswerValue::Text("hi".into()))
            .unwrap();
        assert_eq!(attempt.answers().len(), 1);
        assert!(attempt.is_answered("essay"));
    }

    #[test]
    fn milestones_aggregate_into_answered() {
        let mut attempt = start(single_section(vec![project("lib")]));
        assert!(!attempt.is_answered("lib"));

        let writes = [
            (Milestone::Proposal, None, "text:shelves and loans"),
            (Milestone::Schema, None, "text:books(id, title)"),
            (Milestone::Pseudocode, Some(0), "text:index catalog"),
            (Milestone::Strategy, None, "choice:1"),
            (Milestone::Justification, Some(0), "text:scales"),
        ];
        for (i, (milestone, sub, value)) in writes.into_iter().enumerate() {
            let key = attempt
                .record_milestone_answer("lib", milestone, sub, value.parse().unwrap())
                .unwrap();
            assert!(key.to_string().starts_with("lib_"));
            assert!(attempt.is_answered("lib"), "after milestone {i}");
        }
        assert_eq!(attempt.answers().entries_for("lib"), 5);
    }

    #[test]
    fn milestone_sub_index_is_checked() {
        let mut attempt = start(single_section(vec![project("lib"), free_text("essay")]));
        let text = || AnswerValue::Text("x".into());

        assert!(matches!(
            attempt.record_milestone_answer("lib", Milestone::Pseudocode, None, text()),
            Err(AttemptError::InvalidMilestone { .. })
        ));
        assert!(matches!(
            attempt.record_milestone_answer("lib", Milestone::Pseudocode, Some(2), text()),
            Err(AttemptError::InvalidMilestone { .. })
        ));
        assert!(matches!(
            attempt.record_milestone_answer("lib", Milestone::Schema, Some(0), text()),
            Err(AttemptError::InvalidMilestone { .. })
        ));
        assert_eq!(
            attempt.record_milestone_answer("essay", Milestone::Schema, None, text()),
            Err(AttemptError::NotAProject("essay".into()))
        );
        assert!(attempt.answers().is_empty());
    }

    #[test]
    fn phase_boundary_resets_cursor_and_forces_interstitial() {
        let mut attempt = start(grid(2, 2, 2, 10));
        for _ in 0..3 {
            attempt.next().unwrap();
            assert_eq!(attempt.status(), AttemptStatus::Active);
        }
        assert_eq!(attempt.next().unwrap(), Step::Phase);
        assert_eq!(attempt.status(), AttemptStatus::PhaseStart);
        assert_eq!(attempt.cursor(), Cursor::new(1, 0, 0));
        assert_eq!(attempt.current_phase().label, "Day 2");
    }

    #[test]
    fn three_question_scenario_ends_in_report() {
        let mut attempt =
            Attempt::new(Arc::new(grid(1, 1, 3, 10)), TraversalPolicy::default()).unwrap();
        assert_eq!(attempt.status(), AttemptStatus::Instructions);
        attempt.accept().unwrap();
        assert_eq!(attempt.status(), AttemptStatus::PhaseStart);
        attempt.synchronize().unwrap();
        assert_eq!(attempt.status(), AttemptStatus::Active);

        assert_eq!(attempt.next().unwrap(), Step::Question);
        assert_eq!(attempt.next().unwrap(), Step::Question);
        assert_eq!(attempt.status(), AttemptStatus::Active);
        assert_eq!(attempt.next().unwrap(), Step::Completed);
        assert_eq!(attempt.status(), AttemptStatus::Report);
    }

    #[test]
    fn report_is_read_only() {
        let mut attempt = start(grid(1, 1, 1, 10));
        attempt.next().unwrap();

        let err = attempt
            .record_answer("p0s0q0", AnswerValue::Choice(0))
            .unwrap_err();
        assert_eq!(
            err,
            AttemptError::InvalidState {
                action: "record an answer",
                status: AttemptStatus::Report
            }
        );
        assert!(attempt.toggle_flag("p0s0q0").is_err());
        assert!(attempt.select(0).is_err());
        assert!(attempt.accept().is_err());
        assert!(attempt.answers().is_empty());
    }

    #[test]
    fn cursor_moves_after_report_are_noops() {
        let mut attempt = start(grid(1, 1, 2, 1));
        for _ in 0..60 {
            attempt.tick();
        }
        assert_eq!(attempt.end_reason(), Some(EndReason::TimeExpired));
        let cursor = attempt.cursor();

        assert_eq!(attempt.next().unwrap(), Step::Completed);
        assert_eq!(attempt.prev().unwrap(), Retreat::Boundary);
        assert_eq!(attempt.cursor(), cursor);
        assert_eq!(attempt.status(), AttemptStatus::Report);
        assert_eq!(attempt.end_reason(), Some(EndReason::TimeExpired));
    }

    #[test]
    fn status_transitions_do_not_go_backwards() {
        let mut attempt =
            Attempt::new(Arc::new(grid(1, 1, 2, 10)), TraversalPolicy::default()).unwrap();
        assert!(attempt.synchronize().is_err());
        assert!(attempt.next().is_err());
        attempt.accept().unwrap();
        assert!(attempt.accept().is_err());
        attempt.synchronize().unwrap();
        assert!(attempt.synchronize().is_err());
    }

    #[test]
    fn choice_answer_requests_auto_advance() {
        let mut attempt = start(grid(1, 1, 3, 10));
        let pending = attempt
            .record_answer("p0s0q0", AnswerValue::Choice(1))
            .unwrap()
            .expect("single choice should auto-advance");
        assert_eq!(pending.delay, DEFAULT_AUTO_ADVANCE);

        assert_eq!(attempt.auto_advance(&pending).unwrap(), Some(Step::Question));
        assert_eq!(attempt.cursor().question, 1);
    }

    #[test]
    fn stale_auto_advance_is_dropped() {
        let mut attempt = start(grid(1, 1, 3, 10));
        let pending = attempt
            .record_answer("p0s0q0", AnswerValue::Choice(1))
            .unwrap()
            .unwrap();
        attempt.next().unwrap();

        assert_eq!(attempt.auto_advance(&pending).unwrap(), None);
        assert_eq!(attempt.cursor().question, 1);
    }

    #[test]
    fn manual_questions_and_disabled_policy_do_not_auto_advance() {
        let mut attempt = start(single_section(vec![free_text("essay"), project("lib")]));
        assert_eq!(
            attempt
                .record_answer("essay", AnswerValue::Text("x".into()))
                .unwrap(),
            None
        );

        let policy = TraversalPolicy {
            auto_advance: None,
            ..TraversalPolicy::default()
        };
        let mut attempt = Attempt::new(Arc::new(grid(1, 1, 2, 10)), policy).unwrap();
        attempt.accept().unwrap();
        attempt.synchronize().unwrap();
        assert_eq!(
            attempt
                .record_answer("p0s0q0", AnswerValue::Choice(0))
                .unwrap(),
            None
        );
    }

    #[test]
    fn answering_a_non_current_question_does_not_auto_advance() {
        let mut attempt = start(grid(1, 1, 3, 10));
        assert_eq!(
            attempt
                .record_answer("p0s0q2", AnswerValue::Choice(0))
                .unwrap(),
            None
        );
        assert!(attempt.is_answered("p0s0q2"));
    }

    #[test]
    fn questions_outside_current_phase_are_rejected() {
        let mut attempt = start(grid(2, 1, 1, 10));
        assert_eq!(
            attempt.record_answer("p1s0q0", AnswerValue::Choice(0)),
            Err(AttemptError::OutsideCurrentPhase("p1s0q0".into()))
        );
        assert_eq!(
            attempt.toggle_flag("nope"),
            Err(AttemptError::UnknownQuestion("nope".into()))
        );
    }

    #[test]
    fn flags_toggle_independently_of_answers() {
        let mut attempt = start(grid(1, 1, 2, 10));
        assert!(attempt.toggle_flag("p0s0q1").unwrap());
        assert!(attempt.is_flagged("p0s0q1"));
        assert!(!attempt.is_answered("p0s0q1"));
        assert!(!attempt.toggle_flag("p0s0q1").unwrap());
        assert!(!attempt.is_flagged("p0s0q1"));
    }

    #[test]
    fn cross_phase_retreat_follows_policy() {
        let policy = TraversalPolicy {
            allow_cross_phase_retreat: true,
            ..TraversalPolicy::default()
        };
        let mut attempt = Attempt::new(Arc::new(grid(2, 1, 2, 10)), policy).unwrap();
        attempt.accept().unwrap();
        attempt.synchronize().unwrap();
        attempt.next().unwrap();
        attempt.next().unwrap();
        attempt.synchronize().unwrap();

        assert_eq!(attempt.prev().unwrap(), Retreat::Phase);
        assert_eq!(attempt.cursor(), Cursor::new(0, 0, 1));
    }

    #[test]
    fn sidebar_marks_current_answered_and_flagged() {
        let mut attempt = start(grid(1, 1, 3, 10));
        attempt
            .record_answer("p0s0q2", AnswerValue::Choice(0))
            .unwrap();
        attempt.toggle_flag("p0s0q1").unwrap();

        let sidebar = attempt.sidebar();
        assert_eq!(sidebar.len(), 3);
        assert!(sidebar[0].current);
        assert!(sidebar[1].flagged && !sidebar[1].answered);
        assert!(sidebar[2].answered && !sidebar[2].current);
    }

    #[test]
    fn apply_tick_stops_at_expiry() {
        let mut attempt = start(grid(1, 1, 2, 1));
        let outcome = attempt.apply(&Action::Tick { seconds: 30 }).unwrap();
        assert_eq!(outcome, ActionOutcome::Ticked(TickOutcome::Running(30)));

        let outcome = attempt.apply(&Action::Tick { seconds: 90 }).unwrap();
        assert_eq!(outcome, ActionOutcome::Ticked(TickOutcome::Expired));
        assert_eq!(attempt.status(), AttemptStatus::Report);
    }

    #[test]
    fn empty_structure_is_rejected() {
        let mut a = grid(1, 1, 1, 10);
        a.phases[0].sections[0].questions.clear();
        assert!(matches!(
            Attempt::new(Arc::new(a), TraversalPolicy::default()),
            Err(AttemptError::EmptyStructure(_))
        ));
    }

    #[test]
    fn question_ids_reused_across_phases_are_rejected() {
        let mut a = grid(2, 1, 1, 10);
        a.phases[1].sections[0].questions[0].id = "p0s0q0".into();
        match Attempt::new(Arc::new(a), TraversalPolicy::default()) {
            Err(AttemptError::DuplicateQuestion { question_id, .. }) => {
                assert_eq!(question_id, "p0s0q0")
            }
            other => panic!("expected DuplicateQuestion, got {other:?}"),
        }
    }

    #[test]
    fn summary_only_in_report() {
        let mut attempt = start(grid(1, 1, 1, 10));
        assert!(attempt.summary().is_err());
        attempt.next().unwrap();
        assert!(attempt.summary().is_ok());
    }
}
