pub mod answer_key;
pub mod completion;
pub mod submission;

pub use answer_key::AnswerKey;
pub use completion::{CompletionRecord, SqlRow, SqlValue};
pub use submission::{QuestionRef, RawLogEntry, SubmissionColumn, SubmissionRecord, TaskRef};
