use chrono::{DateTime, Utc};
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::utils::bson::{as_integer, render_text};

/// Task identifier as the logger stored it. Question numbers use the same
/// shape through [`QuestionRef`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskRef {
    Number(i64),
    Text(String),
}

impl TaskRef {
    /// Integral numbers become `Number`, any other scalar keeps its text
    /// form. `None` only for null, documents and arrays.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::String(s) => Some(TaskRef::Text(s.clone())),
            other => as_integer(other)
                .map(TaskRef::Number)
                .or_else(|| render_text(other).map(TaskRef::Text)),
        }
    }

    /// Only numeric identifiers take part in the `task` filter.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            TaskRef::Number(n) => Some(*n),
            TaskRef::Text(_) => None,
        }
    }

    /// Name of the answer-key collection for this task.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskRef::Number(n) => write!(f, "{}", n),
            TaskRef::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for TaskRef {
    fn from(value: i64) -> Self {
        TaskRef::Number(value)
    }
}

impl From<&str> for TaskRef {
    fn from(value: &str) -> Self {
        TaskRef::Text(value.to_string())
    }
}

/// Question number inside a task. Normally an integer, but a hand-edited
/// log can carry text, which then only matches a text key entry.
pub type QuestionRef = TaskRef;

/// A log document before windowing: `date` is still the raw logger string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogEntry {
    pub task: TaskRef,
    pub num: QuestionRef,
    #[serde(default)]
    pub answer: Option<String>,
    pub date: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub task: TaskRef,
    pub num: QuestionRef,
    pub answer: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub username: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionColumn {
    Task,
    Num,
    Answer,
    SubmittedAt,
    Username,
    IsCorrect,
}

impl SubmissionColumn {
    pub const ALL: [SubmissionColumn; 6] = [
        SubmissionColumn::Task,
        SubmissionColumn::Num,
        SubmissionColumn::Answer,
        SubmissionColumn::SubmittedAt,
        SubmissionColumn::Username,
        SubmissionColumn::IsCorrect,
    ];

    /// Accepts the field names and the short report headers (`A`, `D`,
    /// `USER`, `True?`). Anything else is not a column.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "task" => Some(SubmissionColumn::Task),
            "num" => Some(SubmissionColumn::Num),
            "answer" | "A" => Some(SubmissionColumn::Answer),
            "submitted_at" | "D" => Some(SubmissionColumn::SubmittedAt),
            "username" | "USER" => Some(SubmissionColumn::Username),
            "is_correct" | "True?" => Some(SubmissionColumn::IsCorrect),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionColumn::Task => "task",
            SubmissionColumn::Num => "num",
            SubmissionColumn::Answer => "answer",
            SubmissionColumn::SubmittedAt => "submitted_at",
            SubmissionColumn::Username => "username",
            SubmissionColumn::IsCorrect => "is_correct",
        }
    }

    /// Orders two records in the requested direction. Missing values go
    /// last either way.
    pub fn compare(&self, a: &SubmissionRecord, b: &SubmissionRecord, ascending: bool) -> Ordering {
        let directed = |ordering: Ordering| {
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        };

        match self {
            SubmissionColumn::Task => directed(a.task.cmp(&b.task)),
            SubmissionColumn::Num => directed(a.num.cmp(&b.num)),
            SubmissionColumn::Answer => nulls_last(&a.answer, &b.answer, directed),
            SubmissionColumn::SubmittedAt => directed(a.submitted_at.cmp(&b.submitted_at)),
            SubmissionColumn::Username => nulls_last(&a.username, &b.username, directed),
            SubmissionColumn::IsCorrect => directed(a.is_correct.cmp(&b.is_correct)),
        }
    }

    pub fn cell(&self, record: &SubmissionRecord) -> String {
        match self {
            SubmissionColumn::Task => record.task.to_string(),
            SubmissionColumn::Num => record.num.to_string(),
            SubmissionColumn::Answer => record.answer.clone().unwrap_or_default(),
            SubmissionColumn::SubmittedAt => {
                record.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string()
            }
            SubmissionColumn::Username => record.username.clone().unwrap_or_default(),
            SubmissionColumn::IsCorrect => record.is_correct.to_string(),
        }
    }
}

fn nulls_last<T: Ord>(
    a: &Option<T>,
    b: &Option<T>,
    directed: impl Fn(Ordering) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
