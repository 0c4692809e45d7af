use editor_core_diff::{
    ChangeType, DifferConfig, LineDiffer, RangeDifference, StaticReference, TextDocument,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn synchronized(reference: &str, working: &str) -> (LineDiffer, TextDocument) {
    let document = TextDocument::new(working);
    let differ = LineDiffer::with_config(DifferConfig::default().with_debounce(Duration::ZERO));
    differ.set_reference_provider(Arc::new(StaticReference::new(reference)));
    differ.connect(&document).unwrap();
    assert!(differ.wait_until_synchronized(TIMEOUT));
    (differ, document)
}

fn change_types(differ: &LineDiffer, lines: usize) -> Vec<ChangeType> {
    (0..lines)
        .map(|line| differ.line_info(line).expect("line info").change_type())
        .collect()
}

#[test]
fn test_identical_documents() {
    let (differ, _document) = synchronized("a\nb\nc", "a\nb\nc");
    assert_eq!(
        differ.differences(),
        vec![RangeDifference::no_change(0, 0, 3)]
    );
    assert_eq!(change_types(&differ, 3), vec![ChangeType::Unchanged; 3]);
    assert!(differ.line_info(3).is_none());
}

#[test]
fn test_changed_line() {
    let (differ, _document) = synchronized("a\nb\nc", "a\nx\nc");
    assert_eq!(
        differ.differences(),
        vec![
            RangeDifference::no_change(0, 0, 1),
            RangeDifference::change(1, 1, 1, 1),
            RangeDifference::no_change(2, 2, 1),
        ]
    );
    let info = differ.line_info(1).unwrap();
    assert_eq!(info.change_type(), ChangeType::Changed);
    assert_eq!(info.original_text(), vec!["b".to_string()]);
    assert_eq!(info.reference_line(), Some(1));
}

#[test]
fn test_inserted_line_and_revert() {
    let (differ, document) = synchronized("a\nb\nc", "a\nb\nc");
    // Offsets in "a\nb\nc": 3 is the '\n' after "b".
    document.insert(3, "\ny").unwrap();
    assert_eq!(document.text(), "a\nb\ny\nc");

    let info = differ.line_info(2).unwrap();
    assert_eq!(info.change_type(), ChangeType::Added);
    assert_eq!(info.difference(), RangeDifference::change(2, 0, 2, 1));
    assert!(info.original_text().is_empty());

    differ.revert_line(2).unwrap();
    assert_eq!(document.text(), "a\nb\nc");
    assert_eq!(
        differ.differences(),
        vec![RangeDifference::no_change(0, 0, 3)]
    );
}

#[test]
fn test_insertion_into_repeated_lines_lands_at_end_of_run() {
    let (differ, document) = synchronized("r\nr\nr", "r\nr\nr");
    // Insert another "r" at line 1.
    document.insert(2, "r\n").unwrap();
    assert_eq!(document.text(), "r\nr\nr\nr");

    assert_eq!(
        change_types(&differ, 4),
        vec![
            ChangeType::Unchanged,
            ChangeType::Unchanged,
            ChangeType::Unchanged,
            ChangeType::Added,
        ]
    );
}

#[test]
fn test_insertion_into_long_repeated_run_matches_full_diff() {
    let mut text = String::new();
    for i in 0..20 {
        text.push_str(&format!("head {i}\n"));
    }
    for _ in 0..10 {
        text.push_str("same\n");
    }
    for i in 0..20 {
        text.push_str(&format!("tail {i}\n"));
    }
    let (differ, document) = synchronized(&text, &text);

    let offset = text.find("same").unwrap() + "same\n".len();
    document.insert(offset, "same\n").unwrap();

    let (full, _full_document) = synchronized(&text, &document.text());
    assert_eq!(differ.differences(), full.differences());
    assert_eq!(
        differ.line_info(30).unwrap().change_type(),
        ChangeType::Added
    );
}

#[test]
fn test_deleted_lines_are_reported_on_neighbors() {
    let (differ, _document) = synchronized("a\nb\nc\nd\ne", "a\nb\ne");
    let above = differ.line_info(1).unwrap();
    assert_eq!(above.change_type(), ChangeType::Unchanged);
    assert_eq!(above.removed_lines_below(), 2);
    assert_eq!(above.original_text(), vec!["c".to_string(), "d".to_string()]);

    let below = differ.line_info(2).unwrap();
    assert_eq!(below.removed_lines_above(), 2);
    assert_eq!(below.removed_lines_below(), 0);
}

#[test]
fn test_sequential_queries_walk_all_lines() {
    let reference: String = (0..100).map(|i| format!("line {i}\n")).collect();
    let working = reference.replace("line 50\n", "changed\n");
    let (differ, _document) = synchronized(&reference, &working);

    let changed: Vec<usize> = (0..101)
        .filter(|line| differ.line_info(*line).unwrap().has_changes())
        .collect();
    assert_eq!(changed, vec![50]);
    // Backwards access falls back to a search.
    assert_eq!(
        differ.line_info(3).unwrap().change_type(),
        ChangeType::Unchanged
    );
}
