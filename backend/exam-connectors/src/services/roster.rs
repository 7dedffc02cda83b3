use anyhow::{anyhow, Context, Result};

use crate::services::object_storage::ObjectSource;

pub const ROSTER_KEY: &str = "students/student_tasks.csv";
pub const ROSTER_COLUMN: &str = "Student";

/// Student identifiers from the roster file, in file order.
pub async fn student_names<S>(storage: &S) -> Result<Vec<String>>
where
    S: ObjectSource + ?Sized,
{
    let bytes = storage
        .get_object(ROSTER_KEY)
        .await
        .with_context(|| format!("Failed to fetch roster {}", ROSTER_KEY))?;
    let text = String::from_utf8(bytes).context("Roster is not valid UTF-8")?;
    parse_roster(&text)
}

pub fn parse_roster(text: &str) -> Result<Vec<String>> {
    let mut lines = text
        .trim_start_matches('\u{feff}')
        .lines()
        .filter(|line| !line.trim().is_empty());

    let header = lines.next().ok_or_else(|| anyhow!("Roster is empty"))?;
    let column = split_csv_line(header)
        .iter()
        .position(|name| name.trim() == ROSTER_COLUMN)
        .ok_or_else(|| anyhow!("Roster has no {} column", ROSTER_COLUMN))?;

    Ok(lines
        .map(|line| {
            split_csv_line(line)
                .into_iter()
                .nth(column)
                .unwrap_or_default()
        })
        .collect())
}

/// Splits one CSV record; double quotes group commas and `""` is a literal quote.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}
