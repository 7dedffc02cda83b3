use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    Client, Database,
};
use tracing::{debug, error, info};

use crate::{
    config::MongoSettings,
    error::ConnectorError,
    models::{AnswerKey, QuestionRef, RawLogEntry, SubmissionRecord, TaskRef},
    services::{
        object_storage::ObjectSource,
        roster,
        submission_table::{SubmissionFilter, SubmissionTable},
    },
    utils::{
        bson::{get_rendered, render_text},
        time::{
            adjusted_timestamp, bson_to_chrono, chrono_to_bson, submission_cutoff,
            LOG_OFFSET_HOURS,
        },
    },
};

pub const LOGS_COLLECTION: &str = "logs";

/// Opens a client for one logical database and pings it, so an unreachable
/// server shows up here instead of on the first query.
pub async fn connect_mongo(
    settings: &MongoSettings,
    database: &str,
) -> Result<Client, ConnectorError> {
    let uri = settings.uri(database);

    let attempt = async {
        let client = Client::with_uri_str(&uri).await?;
        client.database(database).run_command(doc! { "ping": 1 }).await?;
        Ok::<_, mongodb::error::Error>(client)
    }
    .await;

    attempt.map_err(|source| {
        error!(database, error = %source, "MongoDB connection error");
        ConnectorError::MongoConnection {
            database: database.to_string(),
            source,
        }
    })
}

/// Aggregation over `logs`: shift the logged date, keep what is newer than
/// `cutoff`, project the report columns.
pub fn submission_pipeline(cutoff: DateTime<Utc>) -> Vec<Document> {
    vec![
        doc! {
            "$addFields": {
                "A": "$answer",
                "D": {
                    "$dateAdd": {
                        "startDate": {
                            "$dateFromString": {
                                "dateString": "$date",
                                "format": "%Y-%m-%d %H-%M-%S"
                            }
                        },
                        "unit": "hour",
                        "amount": LOG_OFFSET_HOURS
                    }
                },
                "USER": "$username"
            }
        },
        doc! { "$match": { "D": { "$gt": chrono_to_bson(cutoff) } } },
        doc! { "$project": { "_id": 0, "task": 1, "num": 1, "A": 1, "D": 1, "USER": 1 } },
    ]
}

pub struct LogReconciliationService {
    answer_key: AnswerKey,
    table: SubmissionTable,
}

impl LogReconciliationService {
    /// Connects to both databases and builds the table once.
    pub async fn connect(settings: &MongoSettings) -> Result<Self> {
        let log_client = connect_mongo(settings, &settings.log_database).await?;
        let answers_client = connect_mongo(settings, &settings.answers_database).await?;

        let answers_db = answers_client.database(&settings.answers_database);
        let log_db = log_client.database(&settings.log_database);

        let answer_key = load_answer_key(&answers_db).await?;
        info!(
            tasks = answer_key.task_count(),
            answers = answer_key.answer_count(),
            "Answer key loaded"
        );

        let records = load_submissions(&log_db, &answer_key, submission_cutoff()).await?;
        let table = SubmissionTable::from_records(records);
        info!(rows = table.len(), "Submission table ready");

        Ok(Self { answer_key, table })
    }

    /// Builds the same table from raw log entries, applying the date offset
    /// and the cutoff locally.
    pub fn from_logs(
        answer_key: AnswerKey,
        logs: impl IntoIterator<Item = RawLogEntry>,
    ) -> Result<Self> {
        let cutoff = submission_cutoff();
        let mut records = Vec::new();

        for entry in logs {
            if let Some(record) = reconcile_log(entry, &answer_key, cutoff)? {
                records.push(record);
            }
        }

        Ok(Self {
            table: SubmissionTable::from_records(records),
            answer_key,
        })
    }

    pub fn table(&self) -> &SubmissionTable {
        &self.table
    }

    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer_key
    }

    pub fn filter(&self, filter: &SubmissionFilter) -> SubmissionTable {
        self.table.filter(filter)
    }

    pub async fn student_names<S>(&self, storage: &S) -> Result<Vec<String>>
    where
        S: ObjectSource + ?Sized,
    {
        roster::student_names(storage).await
    }
}

async fn load_answer_key(db: &Database) -> Result<AnswerKey> {
    let mut key = AnswerKey::new();

    let names = db
        .list_collection_names()
        .await
        .context("Failed to list answer key collections")?;

    for name in names {
        let mut cursor = db
            .collection::<Document>(&name)
            .find(doc! {})
            .projection(doc! { "num": 1, "ans": 1 })
            .await
            .with_context(|| format!("Failed to query answer key collection {}", name))?;

        let mut answers = HashMap::new();
        while let Some(entry) = cursor
            .try_next()
            .await
            .with_context(|| format!("Answer key cursor failure in {}", name))?
        {
            if let Some((num, text)) = answer_entry(&name, &entry)? {
                answers.insert(num, text);
            }
        }

        key.insert_task(name, answers);
    }

    Ok(key)
}

/// One answer-key document. Missing `num` or `ans` is an error; values with
/// no usable form (null, nested documents) are skipped.
fn answer_entry(collection: &str, entry: &Document) -> Result<Option<(QuestionRef, String)>> {
    let num = entry
        .get("num")
        .with_context(|| format!("Answer key document in {} has no num", collection))?;
    let ans = entry
        .get("ans")
        .with_context(|| format!("Answer key document in {} has no ans", collection))?;

    match (QuestionRef::from_bson(num), render_text(ans)) {
        (Some(num), Some(text)) => Ok(Some((num, text))),
        _ => {
            debug!(collection, num = %num, "Skipping unusable answer key entry");
            Ok(None)
        }
    }
}

async fn load_submissions(
    db: &Database,
    key: &AnswerKey,
    cutoff: DateTime<Utc>,
) -> Result<Vec<SubmissionRecord>> {
    let mut cursor = db
        .collection::<Document>(LOGS_COLLECTION)
        .aggregate(submission_pipeline(cutoff))
        .await
        .context("Failed to aggregate submission logs")?;

    let mut records = Vec::new();
    while let Some(projected) = cursor
        .try_next()
        .await
        .context("Submission log cursor failure")?
    {
        records.push(reconcile_projected(&projected, key)?);
    }

    Ok(records)
}

/// Grades one document produced by [`submission_pipeline`]. Only `task` and
/// `num` are required; a missing user or answer leaves the cell empty and
/// non-text answers are carried as their text form.
pub fn reconcile_projected(projected: &Document, key: &AnswerKey) -> Result<SubmissionRecord> {
    let task = projected
        .get("task")
        .and_then(TaskRef::from_bson)
        .context("Submission log entry has no usable task")?;
    let num = projected
        .get("num")
        .and_then(QuestionRef::from_bson)
        .context("Submission log entry has no usable num")?;
    let submitted_at = projected
        .get_datetime("D")
        .map(|d| bson_to_chrono(*d))
        .context("Submission log entry has no adjusted date")?;
    let username = get_rendered(projected, "USER");
    let answer = get_rendered(projected, "A");

    let is_correct = key.is_correct(&task, &num, answer.as_deref());

    Ok(SubmissionRecord {
        task,
        num,
        answer,
        submitted_at,
        username,
        is_correct,
    })
}

/// Grades a raw log entry, or returns `None` when its adjusted date is not
/// after `cutoff`.
pub fn reconcile_log(
    entry: RawLogEntry,
    key: &AnswerKey,
    cutoff: DateTime<Utc>,
) -> Result<Option<SubmissionRecord>> {
    let submitted_at = adjusted_timestamp(&entry.date)?;
    if submitted_at <= cutoff {
        return Ok(None);
    }

    let is_correct = key.is_correct(&entry.task, &entry.num, entry.answer.as_deref());

    Ok(Some(SubmissionRecord {
        task: entry.task,
        num: entry.num,
        answer: entry.answer,
        submitted_at,
        username: entry.username,
        is_correct,
    }))
}
