//! Taker actions and their line-oriented text form.
//!
//! Scripts hold one action per line; blank lines and `#` comments are
//! skipped:
//!
//! ```text
//! accept
//! sync
//! answer apt-1 choice:2
//! milestone proj-1 pseudocode:0 text:for each book ...
//! flag apt-2
//! next
//! tick 30
//! ```

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::answers::AnswerValue;
use crate::model::Milestone;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Accept the instructions.
    Accept,
    /// Leave the phase interstitial and start answering.
    Synchronize,
    Next,
    Prev,
    /// Jump to a question of the current section.
    Select { index: usize },
    Answer {
        question_id: String,
        value: AnswerValue,
    },
    Milestone {
        question_id: String,
        milestone: Milestone,
        sub_index: Option<usize>,
        value: AnswerValue,
    },
    Flag { question_id: String },
    /// Let this many seconds pass.
    Tick { seconds: u32 },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Accept => "accept",
            Action::Synchronize => "synchronize",
            Action::Next => "next",
            Action::Prev => "prev",
            Action::Select { .. } => "select",
            Action::Answer { .. } => "answer",
            Action::Milestone { .. } => "milestone",
            Action::Flag { .. } => "flag",
            Action::Tick { .. } => "tick",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Accept | Action::Synchronize | Action::Next | Action::Prev => {
                f.write_str(self.name())
            }
            Action::Select { index } => write!(f, "select {index}"),
            Action::Answer { question_id, value } => write!(f, "answer {question_id} {value}"),
            Action::Milestone {
                question_id,
                milestone,
                sub_index,
                value,
            } => {
                write!(f, "milestone {question_id} {milestone}")?;
                if let Some(i) = sub_index {
                    write!(f, ":{i}")?;
                }
                write!(f, " {value}")
            }
            Action::Flag { question_id } => write!(f, "flag {question_id}"),
            Action::Tick { seconds } => write!(f, "tick {seconds}"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();

        match verb.to_lowercase().as_str() {
            "accept" => Ok(Action::Accept),
            "sync" | "synchronize" | "start" => Ok(Action::Synchronize),
            "next" => Ok(Action::Next),
            "prev" | "back" => Ok(Action::Prev),
            "select" | "goto" => {
                let index = rest
                    .parse::<usize>()
                    .map_err(|_| format!("select needs a question index, got '{rest}'"))?;
                Ok(Action::Select { index })
            }
            "flag" => {
                let question_id = required_word(rest, "flag needs a question id")?;
                Ok(Action::Flag {
                    question_id: question_id.to_string(),
                })
            }
            "tick" => {
                let seconds = if rest.is_empty() {
                    1
                } else {
                    rest.parse::<u32>()
                        .map_err(|_| format!("tick needs a number of seconds, got '{rest}'"))?
                };
                Ok(Action::Tick { seconds })
            }
            "answer" => {
                let (question_id, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("answer needs a question id and a value")?;
                Ok(Action::Answer {
                    question_id: question_id.to_string(),
                    value: value.trim_start().parse::<AnswerValue>()?,
                })
            }
            "milestone" => {
                let mut parts = rest.splitn(3, char::is_whitespace);
                let question_id = parts.next().filter(|s| !s.is_empty());
                let target = parts.next();
                let value = parts.next();
                let (Some(question_id), Some(target), Some(value)) = (question_id, target, value)
                else {
                    return Err("milestone needs a question id, a milestone and a value".into());
                };

                let (milestone, sub_index) = match target.split_once(':') {
                    Some((m, i)) => {
                        let i = i
                            .parse::<usize>()
                            .map_err(|_| format!("invalid milestone sub-index: '{i}'"))?;
                        (m.parse::<Milestone>()?, Some(i))
                    }
                    None => (target.parse::<Milestone>()?, None),
                };

                Ok(Action::Milestone {
                    question_id: question_id.to_string(),
                    milestone,
                    sub_index,
                    value: value.trim_start().parse::<AnswerValue>()?,
                })
            }
            "" => Err("empty action".into()),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

fn required_word<'a>(s: &'a str, message: &str) -> Result<&'a str, String> {
    s.split_whitespace()
        .next()
        .ok_or_else(|| message.to_string())
}

/// Parse a script, skipping blank lines and `#` comments.
pub fn parse_script(content: &str) -> Result<Vec<Action>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let t = line.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .map(|(n, line)| {
            line.parse::<Action>()
                .map_err(|e| anyhow::anyhow!("{e}"))
                .with_context(|| format!("line {}: '{}'", n + 1, line.trim()))
        })
        .collect()
}
