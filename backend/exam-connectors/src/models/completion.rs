use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the `Main` table: a student finished question `num` of a
/// subject variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub student_id: i64,
    pub subject: i64,
    pub variant: i64,
    pub num: i64,
}

impl CompletionRecord {
    pub fn new(student_id: i64, subject: i64, variant: i64, num: i64) -> Self {
        Self {
            student_id,
            subject,
            variant,
            num,
        }
    }

    /// Bind order for the `(StudentID, Subject, variant, num)` placeholders.
    pub fn params(&self) -> [SqlValue; 4] {
        [
            SqlValue::Int(self.student_id),
            SqlValue::Int(self.subject),
            SqlValue::Int(self.variant),
            SqlValue::Int(self.num),
        ]
    }
}

/// A bound parameter or a decoded column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

pub type SqlRow = Vec<SqlValue>;

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}
