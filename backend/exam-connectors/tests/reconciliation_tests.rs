mod common;

use common::{answer_key, init_tracing, log};
use exam_connectors::{
    models::{RawLogEntry, TaskRef},
    LogReconciliationService, SubmissionFilter,
};

fn service(logs: Vec<RawLogEntry>) -> LogReconciliationService {
    let key = answer_key(&[("5", 1, "B"), ("5", 2, "17"), ("7", 1, "ab")]);
    LogReconciliationService::from_logs(key, logs).expect("logs should reconcile")
}

fn sample() -> LogReconciliationService {
    service(vec![
        log(5, 1, "B", "2024-09-02 10-00-00", "Alice"),
        log(5, 2, "18", "2024-09-03 10-00-00", "alice"),
        log(7, 1, "ab", "2024-09-01 09-00-00", "bob"),
        log(7, 1, "AB", "2024-09-04 10-00-00", "bob"),
        log(5, 1, "B", "2024-08-20 10-00-00", "carol"),
        log(5, 1, "qWe123", "2024-09-05 10-00-00", "alice"),
    ])
}

#[test]
fn test_answer_key_example() {
    init_tracing();
    let service = service(vec![
        log(5, 1, "B", "2024-09-02 10-00-00", "ruslan_24_25"),
        log(5, 1, "QWE_test", "2024-09-02 11-00-00", "ruslan_24_25"),
    ]);

    let table = service.table();
    assert_eq!(table.len(), 1);
    let row = table.get(0).unwrap();
    assert!(row.is_correct);
    assert_eq!(row.answer.as_deref(), Some("B"));
}

#[test]
fn test_rows_before_cutoff_are_excluded() {
    let service = sample();
    let cutoff = exam_connectors::utils::time::submission_cutoff();

    assert!(service.table().iter().all(|r| r.submitted_at > cutoff));
    assert!(service.table().iter().all(|r| r.username.as_deref() != Some("carol")));
}

#[test]
fn test_offset_decides_the_boundary() {
    let service = service(vec![
        // lands exactly on the cutoff after +3h
        log(5, 1, "B", "2024-08-31 21-00-00", "edge"),
        // one second later
        log(5, 1, "B", "2024-08-31 21-00-01", "edge"),
    ]);
    assert_eq!(service.table().len(), 1);
}

#[test]
fn test_marker_excluded_in_any_case() {
    let service = sample();
    assert!(service.table().iter().all(|r| !r
        .answer
        .as_deref()
        .unwrap_or_default()
        .to_uppercase()
        .contains("QWE")));
    assert_eq!(service.table().len(), 4);
}

#[test]
fn test_correctness_matches_answer_key() {
    let service = sample();
    let key = service.answer_key();

    for row in service.table() {
        let expected = key.expected(&row.task.key(), &row.num);
        assert_eq!(
            row.is_correct,
            expected.is_some() && expected == row.answer.as_deref()
        );
    }

    let flags: Vec<bool> = service.table().iter().map(|r| r.is_correct).collect();
    assert_eq!(flags, vec![true, false, true, false]);
}

#[test]
fn test_unknown_task_or_question_is_incorrect() {
    let service = service(vec![
        log(9, 1, "B", "2024-09-02 10-00-00", "u"),
        log(5, 3, "B", "2024-09-02 10-00-00", "u"),
    ]);
    assert!(service.table().iter().all(|r| !r.is_correct));
}

#[test]
fn test_text_task_uses_same_answer_key() {
    let mut entry = log(5, 1, "B", "2024-09-02 10-00-00", "u");
    entry.task = TaskRef::Text("5".into());
    let service = service(vec![entry]);

    assert!(service.table().get(0).unwrap().is_correct);
    // the numeric task filter only sees numeric identifiers
    assert!(service.filter(&SubmissionFilter::new().task(5)).is_empty());
}

#[test]
fn test_loose_log_entries_still_become_rows() {
    let mut text_num = log(5, 1, "B", "2024-09-02 10-00-00", "u");
    text_num.num = "1".into();
    let mut anonymous = log(5, 1, "B", "2024-09-02 11-00-00", "u");
    anonymous.username = None;

    let service = service(vec![text_num, anonymous]);
    let rows = service.table().rows();

    assert_eq!(rows.len(), 2);
    assert!(!rows[0].is_correct);
    assert!(rows[1].is_correct);
    assert_eq!(rows[1].username, None);
}

#[test]
fn test_user_filter_is_case_insensitive() {
    let service = sample();
    let a = service.filter(&SubmissionFilter::new().user("Alice"));
    let b = service.filter(&SubmissionFilter::new().user("alice"));
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
}

#[test]
fn test_non_numeric_task_does_not_fail() {
    init_tracing();
    let service = sample();
    assert_eq!(
        service.filter(&SubmissionFilter::new().task("abc")),
        service.filter(&SubmissionFilter::new())
    );
}

#[test]
fn test_unknown_sort_column_keeps_order() {
    let service = sample();
    let view = service.filter(&SubmissionFilter::new().sort_by("nonexistent", false));
    assert_eq!(&view, service.table());
}

#[test]
fn test_combined_filter_and_sort() {
    let service = sample();
    let view = service.filter(
        &SubmissionFilter::new()
            .user("BOB")
            .task("7")
            .correct(false)
            .sort_by("D", false),
    );
    assert_eq!(view.len(), 1);
    assert_eq!(view.get(0).unwrap().answer.as_deref(), Some("AB"));
}

#[test]
fn test_views_never_mutate_the_table() {
    let service = sample();
    let before = service.table().clone();

    let _ = service.filter(&SubmissionFilter::new().sort_by("username", false));
    let _ = service.filter(&SubmissionFilter::new().correct(true));

    assert_eq!(service.table(), &before);
}

#[test]
fn test_malformed_date_is_an_error() {
    let key = answer_key(&[("5", 1, "B")]);
    let result = LogReconciliationService::from_logs(
        key,
        vec![log(5, 1, "B", "02.09.2024 10:00", "u")],
    );
    assert!(result.is_err());
}

#[test]
fn test_table_serialises_as_rows() {
    let service = sample();
    let json = serde_json::to_value(service.table().head(1)).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["task"], 5);
    assert_eq!(rows[0]["is_correct"], true);
}
