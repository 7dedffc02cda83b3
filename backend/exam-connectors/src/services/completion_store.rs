use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{
    mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow},
    query::Query,
    Column, ConnectOptions, Connection, MySql, Row, TypeInfo, ValueRef,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::CompletionStoreSettings,
    error::ConnectorError,
    models::{CompletionRecord, SqlRow, SqlValue},
};

pub const INSERT_COMPLETION: &str =
    "INSERT INTO Main (StudentID, Subject, variant, num) VALUES (?, ?, ?, ?)";

/// Reads back only the key columns, so extra columns on `Main` never reach
/// the row decoder.
pub const SELECT_COMPLETION: &str = "SELECT StudentID, Subject, variant, num FROM Main \
     WHERE StudentID = ? AND Subject = ? AND variant = ? AND num = ?";

/// Statement execution against one open session. Values are always bound as
/// parameters, never spliced into the SQL text.
#[async_trait]
pub trait SqlExecutor: Send {
    async fn execute_query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>>;

    /// Runs a write statement and commits it on its own.
    async fn execute_commit(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

pub struct MySqlSession {
    conn: MySqlConnection,
}

impl MySqlSession {
    pub async fn connect(settings: &CompletionStoreSettings) -> Result<Self, ConnectorError> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);

        let secs = settings.connect_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), options.connect()).await {
            Ok(Ok(conn)) => {
                debug!(host = %settings.host, database = %settings.database, "MySQL session opened");
                Ok(Self { conn })
            }
            Ok(Err(source)) => {
                error!(host = %settings.host, error = %source, "MySQL connection error");
                Err(ConnectorError::SqlConnection {
                    host: settings.host.clone(),
                    port: settings.port,
                    source,
                })
            }
            Err(_) => {
                error!(host = %settings.host, secs, "MySQL connection timed out");
                Err(ConnectorError::SqlTimeout {
                    host: settings.host.clone(),
                    port: settings.port,
                    secs,
                })
            }
        }
    }
}

#[async_trait]
impl SqlExecutor for MySqlSession {
    async fn execute_query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&mut self.conn)
            .await
            .with_context(|| format!("Query failed: {}", sql))?;

        rows.iter().map(decode_row).collect()
    }

    async fn execute_commit(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let mut tx = self
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let result = bind_all(sqlx::query(sql), params)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Statement failed: {}", sql))?;

        tx.commit().await.context("Failed to commit statement")?;
        Ok(result.rows_affected())
    }

    async fn close(mut self) -> Result<()> {
        // prepared statements first, then the connection itself
        self.conn
            .clear_cached_statements()
            .await
            .context("Failed to release prepared statements")?;
        self.conn
            .close()
            .await
            .context("Failed to close MySQL connection")?;
        debug!("MySQL session closed");
        Ok(())
    }
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

fn decode_row(row: &MySqlRow) -> Result<SqlRow> {
    (0..row.len()).map(|index| decode_column(row, index)).collect()
}

fn decode_column(row: &MySqlRow, index: usize) -> Result<SqlValue> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SqlValue::Null);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Ok(SqlValue::Int(v));
    }
    if let Ok(v) = row.try_get::<u64, _>(index) {
        if let Ok(v) = i64::try_from(v) {
            return Ok(SqlValue::Int(v));
        }
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Ok(SqlValue::Float(v));
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Ok(SqlValue::Text(v));
    }

    let column = row.column(index);
    Err(anyhow!(
        "Unsupported type {} in column {}",
        column.type_info().name(),
        column.name()
    ))
}

/// Completion bookkeeping over any [`SqlExecutor`].
pub struct CompletionRepository<E> {
    executor: E,
}

impl<E: SqlExecutor> CompletionRepository<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    pub async fn execute_query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        self.executor.execute_query(sql, params).await
    }

    pub async fn execute_commit(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.executor.execute_commit(sql, params).await
    }

    /// One insert and one commit per question number. A failure midway
    /// leaves the earlier numbers committed.
    pub async fn insert_record(
        &mut self,
        student_id: i64,
        subject: i64,
        variant: i64,
        nums: &[i64],
    ) -> Result<()> {
        for &num in nums {
            let record = CompletionRecord::new(student_id, subject, variant, num);
            debug!(?record, "Inserting completion record");
            self.execute_commit(INSERT_COMPLETION, &record.params())
                .await
                .with_context(|| format!("Failed to insert completion {:?}", record))?;
        }
        Ok(())
    }

    /// Returns `true` when it is safe to insert: none of `nums` is recorded
    /// yet. Stops at the first recorded number and returns `false`.
    pub async fn check_record_exists(
        &mut self,
        student_id: i64,
        subject: i64,
        variant: i64,
        nums: &[i64],
    ) -> Result<bool> {
        for &num in nums {
            let record = CompletionRecord::new(student_id, subject, variant, num);
            let rows = self
                .execute_query(SELECT_COMPLETION, &record.params())
                .await?;

            if !rows.is_empty() {
                info!(
                    "Num {} in Variant {} for Student {} is already done",
                    num, variant, student_id
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Runs `body` with a repository over `executor` and closes the executor
/// afterwards, whether `body` succeeded or not.
pub async fn scoped<E, T, F>(executor: E, body: F) -> Result<T>
where
    E: SqlExecutor,
    F: for<'r> FnOnce(&'r mut CompletionRepository<E>) -> BoxFuture<'r, Result<T>>,
{
    let mut repo = CompletionRepository::new(executor);
    let outcome = body(&mut repo).await;

    if let Err(err) = repo.into_inner().close().await {
        warn!(error = %err, "Failed to close completion store session");
    }

    outcome
}

pub struct CompletionStore;

impl CompletionStore {
    /// Opens a MySQL session for the duration of `body`.
    ///
    /// ```ignore
    /// let fresh = CompletionStore::with_session(&settings, |repo| {
    ///     Box::pin(async move { repo.check_record_exists(42, 1, 7, &[3, 4]).await })
    /// })
    /// .await?;
    /// ```
    pub async fn with_session<T, F>(settings: &CompletionStoreSettings, body: F) -> Result<T>
    where
        F: for<'r> FnOnce(&'r mut CompletionRepository<MySqlSession>) -> BoxFuture<'r, Result<T>>,
    {
        let session = MySqlSession::connect(settings).await?;
        scoped(session, body).await
    }
}
