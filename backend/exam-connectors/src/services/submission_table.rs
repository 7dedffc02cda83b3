use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::models::{SubmissionColumn, SubmissionRecord};

lazy_static! {
    /// Placeholder answers typed while testing the bot.
    static ref EXCLUSION_MARKER: Regex = Regex::new(r"(?i)QWE").unwrap();
}

pub fn is_excluded(answer: Option<&str>) -> bool {
    answer.is_some_and(|text| EXCLUSION_MARKER.is_match(text))
}

/// Reconciled submissions. Row position is the row index; nothing mutates
/// a table once it is built, views are copies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubmissionTable {
    rows: Vec<SubmissionRecord>,
}

impl SubmissionTable {
    /// Drops marker rows and keeps the rest in their original order.
    pub fn from_records(records: impl IntoIterator<Item = SubmissionRecord>) -> Self {
        let rows = records
            .into_iter()
            .filter(|record| !is_excluded(record.answer.as_deref()))
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[SubmissionRecord] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubmissionRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SubmissionRecord> {
        self.rows.get(index)
    }

    pub fn head(&self, n: usize) -> SubmissionTable {
        SubmissionTable {
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn filter(&self, filter: &SubmissionFilter) -> SubmissionTable {
        let user = filter
            .user
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(str::to_lowercase);

        let task = filter.task.as_deref().and_then(|raw| match raw.trim().parse::<i64>() {
            Ok(task) => Some(task),
            Err(_) => {
                tracing::warn!(task = raw, "Task filter must be a number, ignoring it");
                None
            }
        });

        let mut rows: Vec<SubmissionRecord> = self
            .rows
            .iter()
            .filter(|r| {
                user.as_ref().map_or(true, |u| {
                    r.username.as_deref().is_some_and(|name| name.to_lowercase() == *u)
                })
            })
            .filter(|r| task.map_or(true, |t| r.task.as_number() == Some(t)))
            .filter(|r| filter.correct.map_or(true, |c| r.is_correct == c))
            .cloned()
            .collect();

        if let Some(column) = filter.sort_column.as_deref().and_then(SubmissionColumn::parse) {
            // sort_by is stable, ties keep table order
            rows.sort_by(|a, b| column.compare(a, b, filter.ascending));
        }

        SubmissionTable { rows }
    }
}

impl<'a> IntoIterator for &'a SubmissionTable {
    type Item = &'a SubmissionRecord;
    type IntoIter = std::slice::Iter<'a, SubmissionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for SubmissionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid: Vec<Vec<String>> = Vec::with_capacity(self.rows.len() + 1);

        let mut header = vec![String::new()];
        header.extend(SubmissionColumn::ALL.iter().map(|c| c.as_str().to_string()));
        grid.push(header);

        for (index, record) in self.rows.iter().enumerate() {
            let mut line = vec![index.to_string()];
            line.extend(SubmissionColumn::ALL.iter().map(|c| c.cell(record)));
            grid.push(line);
        }

        let widths: Vec<usize> = (0..grid[0].len())
            .map(|col| {
                grid.iter()
                    .map(|line| line[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for line in &grid {
            let rendered = line
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:>width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(f, "{}", rendered.trim_end())?;
        }

        if self.rows.is_empty() {
            writeln!(f, "(no rows)")?;
        }

        Ok(())
    }
}

/// Ad-hoc view over a [`SubmissionTable`]. Every constraint is optional;
/// `ascending` only matters together with a recognised `sort_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFilter {
    pub user: Option<String>,
    pub task: Option<String>,
    pub correct: Option<bool>,
    pub sort_column: Option<String>,
    pub ascending: bool,
}

impl Default for SubmissionFilter {
    fn default() -> Self {
        Self {
            user: None,
            task: None,
            correct: None,
            sort_column: None,
            ascending: true,
        }
    }
}

impl SubmissionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn task(mut self, task: impl ToString) -> Self {
        self.task = Some(task.to_string());
        self
    }

    pub fn correct(mut self, correct: bool) -> Self {
        self.correct = Some(correct);
        self
    }

    pub fn sort_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.sort_column = Some(column.into());
        self.ascending = ascending;
        self
    }
}
