//! Answer store keyed by question id and optional milestone.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Milestone;

/// A submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// Index of the chosen option.
    Choice(usize),
    /// Indices of all chosen options.
    Choices(Vec<usize>),
    Text(String),
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Choice(i) => write!(f, "choice:{i}"),
            AnswerValue::Choices(is) => {
                let joined: Vec<String> = is.iter().map(|i| i.to_string()).collect();
                write!(f, "choices:{}", joined.join(","))
            }
            AnswerValue::Text(t) => write!(f, "text:{t}"),
        }
    }
}

/// Parses `choice:N`, `choices:N,M,...` or `text:...`.
impl FromStr for AnswerValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("answer must look like kind:value, got '{s}'"))?;
        let index = |v: &str| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid option index: '{}'", v.trim()))
        };
        match kind.trim() {
            "choice" => Ok(AnswerValue::Choice(index(rest)?)),
            "choices" => rest
                .split(',')
                .filter(|v| !v.trim().is_empty())
                .map(index)
                .collect::<Result<Vec<_>, _>>()
                .map(AnswerValue::Choices),
            "text" => Ok(AnswerValue::Text(rest.to_string())),
            other => Err(format!("unknown answer kind: {other}")),
        }
    }
}

/// Store key: a plain question id, or `{id}_{milestone}[_{sub}]` for projects.
///
/// Derived ordering groups every key of a question after its plain key,
/// which is what [`AnswerStore::is_answered`] relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnswerKey {
    pub question_id: String,
    pub milestone: Option<Milestone>,
    pub sub_index: Option<usize>,
}

impl AnswerKey {
    pub fn question(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            milestone: None,
            sub_index: None,
        }
    }

    pub fn milestone(
        question_id: impl Into<String>,
        milestone: Milestone,
        sub_index: Option<usize>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            milestone: Some(milestone),
            sub_index,
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.question_id)?;
        if let Some(m) = self.milestone {
            write!(f, "_{}", m.tag())?;
        }
        if let Some(i) = self.sub_index {
            write!(f, "_{i}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    entries: BTreeMap<AnswerKey, AnswerValue>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert; returns the value previously stored under the key.
    pub fn record(&mut self, key: AnswerKey, value: AnswerValue) -> Option<AnswerValue> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &AnswerKey) -> Option<&AnswerValue> {
        self.entries.get(key)
    }

    /// True if the plain key or any milestone key of the question exists.
    pub fn is_answered(&self, question_id: &str) -> bool {
        let start = AnswerKey::question(question_id);
        self.entries
            .range((Bound::Included(start), Bound::Unbounded))
            .next()
            .is_some_and(|(k, _)| k.question_id == question_id)
    }

    /// Number of keys stored for a question.
    pub fn entries_for(&self, question_id: &str) -> usize {
        self.entries
            .range((
                Bound::Included(AnswerKey::question(question_id)),
                Bound::Unbounded,
            ))
            .take_while(|(k, _)| k.question_id == question_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnswerKey, &AnswerValue)> {
        self.entries.iter()
    }

    /// Entries keyed by their composite string form.
    pub fn to_flat_map(&self) -> BTreeMap<String, AnswerValue> {
        self.entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}
