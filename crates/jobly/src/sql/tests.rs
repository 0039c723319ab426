use super::*;
use pretty_assertions::assert_eq;

fn debug_values(values: &[Param]) -> Vec<String> {
    values.iter().map(|v| format!("{v:?}")).collect()
}

#[test]
fn builds_placeholders_in_order() {
    let mut q = sql("SELECT * FROM jobs WHERE a = ");
    q.push_bind(1).push(" AND b = ").push_bind("x");

    assert_eq!(q.to_sql(), "SELECT * FROM jobs WHERE a = $1 AND b = $2");
    assert_eq!(q.params_ref().len(), 2);
}

#[test]
fn can_compose_fragments() {
    let mut w = Sql::empty();
    w.push(" WHERE id = ").push_bind(42);

    let mut q = sql("SELECT * FROM jobs");
    q.push_sql(w);

    assert_eq!(q.to_sql(), "SELECT * FROM jobs WHERE id = $1");
    assert_eq!(q.param_count(), 1);
}

#[test]
fn spliced_fragments_are_renumbered() {
    let mut tail = Sql::empty();
    tail.push_bind("b").push(" AND c = ").push_bind("c");

    let mut q = sql("SELECT * FROM t WHERE a = ");
    q.push_bind("a").push(" AND b = ").push_sql(tail);

    assert_eq!(q.to_sql(), "SELECT * FROM t WHERE a = $1 AND b = $2 AND c = $3");
    assert_eq!(debug_values(q.params()), vec![r#""a""#, r#""b""#, r#""c""#]);
}

#[test]
fn placeholders_past_nine_use_two_digits() {
    let mut q = Sql::empty();
    for i in 0..11_i32 {
        if i > 0 {
            q.push(",");
        }
        q.push_bind(i);
    }
    assert!(q.to_sql().ends_with("$9,$10,$11"));
}

#[test]
fn query_keeps_sql_verbatim() {
    let q = query("SELECT * FROM jobs WHERE id = $1").bind(7_i32);
    assert_eq!(q.sql(), "SELECT * FROM jobs WHERE id = $1");
    assert_eq!(debug_values(q.params()), vec!["7"]);
}

// ==================== sql_for_partial_update ====================

#[test]
fn partial_update_translates_field_names() {
    let changes = Changes::new().set("firstName", "test");
    let update = sql_for_partial_update(changes, &[("firstName", "first_name")]).unwrap();

    assert_eq!(update.set_cols, r#""first_name"=$1"#);
    assert_eq!(debug_values(&update.values), vec![r#""test""#]);
}

#[test]
fn partial_update_falls_back_to_external_names() {
    let changes = Changes::new().set("age", 69_i32).set("dept", "test");
    let update = sql_for_partial_update(changes, &[]).unwrap();

    assert_eq!(update.set_cols, r#""age"=$1, "dept"=$2"#);
    assert_eq!(debug_values(&update.values), vec!["69", r#""test""#]);
}

#[test]
fn partial_update_rejects_empty_changes() {
    let err = sql_for_partial_update(Changes::new(), &[("firstName", "first_name")]).unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn partial_update_keeps_explicit_nulls() {
    let changes = Changes::new()
        .set("title", "New")
        .set("salary", None::<i32>)
        .set("equity", None::<rust_decimal::Decimal>);
    let update = sql_for_partial_update(changes, &[]).unwrap();

    assert_eq!(update.set_cols, r#""title"=$1, "salary"=$2, "equity"=$3"#);
    assert_eq!(debug_values(&update.values), vec![r#""New""#, "None", "None"]);
}

#[test]
fn partial_update_positions_follow_insertion_order() {
    let changes = Changes::new()
        .set("z", 1_i32)
        .set("a", 2_i32)
        .set("m", 3_i32)
        .set("b", 4_i32);
    let update = sql_for_partial_update(changes, &[("m", "mid")]).unwrap();

    let assignments: Vec<&str> = update.set_cols.split(", ").collect();
    assert_eq!(assignments, vec![r#""z"=$1"#, r#""a"=$2"#, r#""mid"=$3"#, r#""b"=$4"#]);
    assert_eq!(update.values.len(), 4);
    assert_eq!(update.next_placeholder(), 5);
}

#[test]
fn setting_a_field_twice_keeps_first_position() {
    let mut changes = Changes::new();
    changes.push("title", "a").push("salary", 1_i32).push("title", "b");
    assert_eq!(changes.fields().collect::<Vec<_>>(), vec!["title", "salary"]);

    let update = sql_for_partial_update(changes, &[]).unwrap();
    assert_eq!(debug_values(&update.values), vec![r#""b""#, "1"]);
}

#[test]
fn push_opt_skips_absent_values() {
    let mut changes = Changes::new();
    changes
        .push_opt("title", Some("CEO"))
        .push_opt("salary", None::<i32>);
    assert_eq!(changes.len(), 1);
}

#[test]
fn into_update_binds_key_last() {
    let changes = Changes::new().set("numEmployees", 10_i32).set("name", "C1");
    let q = sql_for_partial_update(changes, &[("numEmployees", "num_employees")])
        .unwrap()
        .into_update("companies", "handle", "c1", "handle, name");

    assert_eq!(
        q.sql(),
        r#"UPDATE companies SET "num_employees"=$1, "name"=$2 WHERE handle = $3 RETURNING handle, name"#
    );
    assert_eq!(debug_values(q.params()), vec!["10", r#""C1""#, r#""c1""#]);
}
