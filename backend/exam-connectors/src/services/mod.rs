pub mod completion_store;
pub mod log_reconciliation;
pub mod object_storage;
pub mod roster;
pub mod submission_table;

pub use completion_store::{
    scoped, CompletionRepository, CompletionStore, MySqlSession, SqlExecutor,
};
pub use log_reconciliation::LogReconciliationService;
pub use object_storage::{ObjectSource, ObjectStorageClient};
pub use submission_table::{SubmissionFilter, SubmissionTable};
