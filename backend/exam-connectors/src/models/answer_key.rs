use std::collections::HashMap;

use super::{QuestionRef, TaskRef};

/// Expected answers per task collection, keyed by question number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerKey {
    tasks: HashMap<String, HashMap<QuestionRef, String>>,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        task: impl Into<String>,
        num: impl Into<QuestionRef>,
        answer: impl Into<String>,
    ) {
        self.tasks
            .entry(task.into())
            .or_default()
            .insert(num.into(), answer.into());
    }

    /// Registers a task even when its collection holds no usable documents.
    pub fn insert_task(&mut self, task: impl Into<String>, answers: HashMap<QuestionRef, String>) {
        self.tasks.insert(task.into(), answers);
    }

    /// Numbers only match numbers and text only matches text, so `"1"` in a
    /// log never hits a key entry stored as `1`.
    pub fn expected(&self, task: &str, num: &QuestionRef) -> Option<&str> {
        self.tasks
            .get(task)
            .and_then(|answers| answers.get(num))
            .map(String::as_str)
    }

    /// True only when a key entry exists and matches the answer exactly.
    pub fn is_correct(&self, task: &TaskRef, num: &QuestionRef, answer: Option<&str>) -> bool {
        match (self.expected(&task.key(), num), answer) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn answer_count(&self) -> usize {
        self.tasks.values().map(HashMap::len).sum()
    }
}
