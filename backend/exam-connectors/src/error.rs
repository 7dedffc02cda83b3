use thiserror::Error;

/// Connection-level failures. A connector never hands out a half-open handle:
/// construction either yields a usable client or one of these.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("MongoDB connection to database '{database}' failed: {source}")]
    MongoConnection {
        database: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("MySQL connection to {host}:{port} failed: {source}")]
    SqlConnection {
        host: String,
        port: u16,
        #[source]
        source: sqlx::Error,
    },

    #[error("MySQL connection to {host}:{port} timed out after {secs}s")]
    SqlTimeout { host: String, port: u16, secs: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<config::ConfigError> for ConnectorError {
    fn from(err: config::ConfigError) -> Self {
        ConnectorError::Config(err.to_string())
    }
}
