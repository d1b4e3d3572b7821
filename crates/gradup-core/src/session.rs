//! Async driver for a single attempt.
//!
//! Feeds taker actions from a channel into an [`Attempt`], ticks the clock
//! once per second, and applies auto-advance requests after their delay.
//! All state changes happen on the driver's own loop; nothing is shared.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::action::Action;
use crate::attempt::{
    ActionOutcome, Attempt, AttemptStatus, AutoAdvance, Step, TickOutcome,
};
use crate::error::AttemptError;
use crate::report::AttemptSummary;

/// Wall-clock length of one timer tick.
pub const TICK: Duration = Duration::from_secs(1);

/// Progress reporting trait.
pub trait SessionObserver: Send + Sync {
    fn on_action(&self, action: &Action, result: &Result<ActionOutcome, AttemptError>);
    fn on_tick(&self, remaining_secs: u32);
    fn on_auto_advance(&self, step: Step);
    fn on_finalized(&self, summary: &AttemptSummary);
}

/// No-op session observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_action(&self, _: &Action, _: &Result<ActionOutcome, AttemptError>) {}
    fn on_tick(&self, _: u32) {}
    fn on_auto_advance(&self, _: Step) {}
    fn on_finalized(&self, _: &AttemptSummary) {}
}

/// Drive an attempt until it reaches REPORT or the action channel closes.
///
/// Returns the attempt in whatever state it ended in.
pub async fn run_session(
    mut attempt: Attempt,
    mut actions: mpsc::Receiver<Action>,
    observer: &dyn SessionObserver,
) -> Attempt {
    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let advance_timer = time::sleep(Duration::ZERO);
    tokio::pin!(advance_timer);
    let mut pending: Option<AutoAdvance> = None;

    while attempt.status() != AttemptStatus::Report {
        tokio::select! {
            received = actions.recv() => {
                let Some(action) = received else {
                    tracing::debug!(attempt = %attempt.id(), "action channel closed");
                    break;
                };
                let result = attempt.apply(&action);
                if let Ok(ActionOutcome::Answered(Some(request))) = &result {
                    advance_timer.as_mut().reset(Instant::now() + request.delay);
                    pending = Some(*request);
                }
                if let Err(e) = &result {
                    tracing::debug!(attempt = %attempt.id(), %action, "rejected: {e}");
                }
                observer.on_action(&action, &result);
            }
            _ = ticker.tick() => {
                if let TickOutcome::Running(remaining) = attempt.tick() {
                    observer.on_tick(remaining);
                }
            }
            () = &mut advance_timer, if pending.is_some() => {
                if let Some(request) = pending.take() {
                    if let Ok(Some(step)) = attempt.auto_advance(&request) {
                        observer.on_auto_advance(step);
                    }
                }
            }
        }
    }

    if let Ok(summary) = attempt.summary() {
        observer.on_finalized(&summary);
    }
    attempt
}
