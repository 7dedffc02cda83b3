//! Connectors for the exam-preparation bot's stores: the submission log
//! reconciliation over MongoDB and the task completion table in MySQL.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{CompletionStoreSettings, Config, MongoSettings, ObjectStorageSettings};
pub use error::ConnectorError;
pub use services::{
    CompletionRepository, CompletionStore, LogReconciliationService, ObjectSource,
    ObjectStorageClient, SubmissionFilter, SubmissionTable,
};
