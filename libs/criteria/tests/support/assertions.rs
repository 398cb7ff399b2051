use serde_json::Value;
use venture_criteria::{filter_records, Condition};

/// `id` of every record matched by `condition`, in input order.
pub fn matching_ids(condition: &Condition, records: &[Value]) -> Vec<i64> {
    filter_records(condition, records)
        .into_iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect()
}

/// Assert that `condition` matches exactly the records with `expected` ids
pub fn assert_matches_ids(condition: &Condition, records: &[Value], expected: &[i64]) {
    let actual = matching_ids(condition, records);
    assert_eq!(
        actual, expected,
        "condition {:?} matched {:?}, expected {:?}",
        condition, actual, expected
    );
}
