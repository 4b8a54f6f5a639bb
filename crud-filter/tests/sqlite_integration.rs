//! Runs generated SQL against an in-memory `SQLite` database.
//!
//! Validates that compiled filters, sort keys and page windows are accepted
//! by a real engine and select the expected rows, and exercises the record
//! checker through a rusqlite-backed store.

use crud_filter::prelude::*;
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};

// =============================================================================
// Fixtures
// =============================================================================

const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        age INTEGER NOT NULL,
        status TEXT NOT NULL,
        tags TEXT NOT NULL
    );
    INSERT INTO users VALUES (1, 'Alice', 'alice@example.com', 30, '1', 'rust,go');
    INSERT INTO users VALUES (2, 'Bob', 'bob@example.com', 17, '2', 'go');
    INSERT INTO users VALUES (3, 'Carol', 'carol@example.com', 45, '3', 'rust');
    INSERT INTO users VALUES (4, 'Dave', NULL, 25, '1', '');
    INSERT INTO users VALUES (5, 'Alan', 'alan@example.com', 65, '2', 'python,rust');
";

fn setup() -> Connection {
    // RUST_LOG=crud_filter=debug shows rejected descriptors and checker queries
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
}

fn to_sqlite(value: &Value) -> SqlValue {
    match value {
        Value::Null | Value::Array(_) => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
    }
}

fn from_sqlite(value: SqlValue) -> Value {
    match value {
        SqlValue::Null | SqlValue::Blob(_) => Value::Null,
        SqlValue::Integer(i) => Value::Int(i),
        SqlValue::Real(f) => Value::Float(f),
        SqlValue::Text(s) => Value::String(s),
    }
}

/// Execute the query and collect the `id` column.
fn ids(conn: &Connection, query: &SelectBuilder<Sqlite>) -> Vec<i64> {
    let result = query.build();
    let mut stmt = conn
        .prepare(&result.sql)
        .unwrap_or_else(|e| panic!("SQLite rejected `{}`: {e}", result.sql));
    let rows = stmt
        .query_map(params_from_iter(result.params.iter().map(to_sqlite)), |row| {
            row.get::<_, i64>("id")
        })
        .unwrap();
    rows.collect::<Result<Vec<_>, _>>().unwrap()
}

fn json_value(s: &str) -> json::Value {
    json::from_str(s).unwrap()
}

/// Compile a raw filter onto a `users` query ordered by id.
fn filtered(raw: &str, mode: FilterMode, allowed: &[&str]) -> SelectBuilder<Sqlite> {
    let filter = parse_filter(&json_value(raw), mode, &AllowedFields::new(allowed)).unwrap();
    let mut query = SelectBuilder::new(Sqlite, "users");
    compile_filter(&filter, &mut query).unwrap();
    query.order_by("id", SortDir::Asc);
    query
}

fn structured(raw: &str) -> Vec<i64> {
    ids(&setup(), &filtered(raw, FilterMode::Structured, &[]))
}

fn templated(raw: &str, allowed: &[&str]) -> Vec<i64> {
    ids(&setup(), &filtered(raw, FilterMode::Templated, allowed))
}

// =============================================================================
// Structured Filters
// =============================================================================

#[test]
fn test_structured_comparison_and_membership() {
    assert_eq!(
        structured(r#"{"age": ["gte", 18], "status": ["in", "1,2"]}"#),
        vec![1, 4, 5]
    );
    assert_eq!(structured(r#"{"status": ["not_in", ["1", "3"]]}"#), vec![2, 5]);
}

#[test]
fn test_structured_numeric_strings() {
    assert_eq!(structured(r#"{"age": ["lt", "18"]}"#), vec![2]);
}

#[test]
fn test_structured_like() {
    assert_eq!(structured(r#"{"name": ["like", "Al"]}"#), vec![1, 5]);
    assert_eq!(structured(r#"{"name": ["not_like", "a"]}"#), vec![2]);
}

#[test]
fn test_structured_or_logic() {
    assert_eq!(
        structured(r#"{"age": ["lt", 18], "name": ["eq", "Carol"], "_logic": "or"}"#),
        vec![2, 3]
    );
}

#[test]
fn test_structured_between() {
    assert_eq!(structured(r#"{"age": ["between", [25, 45]]}"#), vec![1, 3, 4]);
    assert_eq!(structured(r#"{"age": ["not_between", [25, 45]]}"#), vec![2, 5]);
}

#[test]
fn test_structured_find_in_set() {
    assert_eq!(structured(r#"{"tags": ["find_in_set", "rust"]}"#), vec![1, 3, 5]);
    assert_eq!(structured(r#"{"tags": ["find_in_set", "go"]}"#), vec![1, 2]);
}

#[test]
fn test_empty_filter_selects_everything() {
    assert_eq!(structured("{}"), vec![1, 2, 3, 4, 5]);
}

// =============================================================================
// Templated Filters
// =============================================================================

#[test]
fn test_templated_grouping() {
    let raw = r#"{
        "fields": {"age": ["gt", 20], "age#2": ["lt", 50], "name": ["eq", "Bob"]},
        "template": "(age {age} and age {age#2}) or name {name}"
    }"#;
    assert_eq!(templated(raw, &["age", "name"]), vec![1, 2, 3, 4]);
}

#[test]
fn test_templated_membership_and_range() {
    let raw = r#"{
        "fields": {"id": ["in", [1, 3, 5]], "age": ["between", [30, 60]]},
        "template": "id {id} and age {age}"
    }"#;
    assert_eq!(templated(raw, &["id", "age"]), vec![1, 3]);
}

#[test]
fn test_templated_find_in_set_and_quoting() {
    let raw = r#"{
        "fields": {"tags": ["find_in_set", "python"], "name": ["like", "o'b"]},
        "template": "{tags} or name {name}"
    }"#;
    assert_eq!(templated(raw, &["tags", "name"]), vec![5]);
}

#[test]
fn test_templated_find_in_set_rejects_leading_column() {
    let raw = json_value(
        r#"{"fields": {"tags": ["find_in_set", "python"]}, "template": "tags {tags}"}"#,
    );
    let err = parse_filter(&raw, FilterMode::Templated, &AllowedFields::new(&["tags"]))
        .unwrap_err();
    assert_eq!(err, FilterError::SetColumnRepeated { field: "tags".into() });
}

#[test]
fn test_numeric_looking_text_matches_in_both_modes() {
    let conn = setup();
    conn.execute_batch(
        "INSERT INTO users VALUES (6, 'Eve', NULL, 33, '007', '');
         INSERT INTO users VALUES (7, 'Finn', NULL, 40, '7', '');",
    )
    .unwrap();

    let structured = filtered(r#"{"status": ["eq", "007"]}"#, FilterMode::Structured, &[]);
    let templated = filtered(
        r#"{"fields": {"status": ["eq", "007"]}, "template": "status {status}"}"#,
        FilterMode::Templated,
        &["status"],
    );
    assert_eq!(ids(&conn, &structured), vec![6]);
    assert_eq!(ids(&conn, &templated), vec![6]);

    let templated = filtered(
        r#"{"fields": {"status": ["in", "007,3"]}, "template": "status {status}"}"#,
        FilterMode::Templated,
        &["status"],
    );
    assert_eq!(ids(&conn, &templated), vec![3, 6]);
}

// =============================================================================
// Order and Page
// =============================================================================

#[test]
fn test_list_query_windows() {
    let conn = setup();
    let allowed = AllowedFields::new(&["id", "name", "age"]);

    let page = |number: u32| {
        let raw = json_value(&format!(
            r#"{{"fields": "id,name", "filter": {{"age": ["gte", 18]}},
                "order": [{{"field": "age", "order": "desc"}}], "page": [{number}, 2]}}"#
        ));
        let list = ListQuery::from_json(&raw, FilterMode::Structured, &allowed, &Limits::new())
            .unwrap();
        let mut query = SelectBuilder::new(Sqlite, "users");
        list.apply(&mut query).unwrap();
        ids(&conn, &query)
    };

    assert_eq!(page(1), vec![5, 3]);
    assert_eq!(page(2), vec![1, 4]);
    assert!(page(3).is_empty());
}

#[test]
fn test_multi_field_order() {
    let order = parse_order(&json_value(
        r#"[{"field": "status", "order": "asc"}, {"field": "age", "order": "desc"}]"#,
    ))
    .unwrap();
    let mut query = SelectBuilder::new(Sqlite, "users");
    apply_order(&order, &mut query);
    assert_eq!(ids(&setup(), &query), vec![1, 4, 5, 2, 3]);
}

// =============================================================================
// Record Checker
// =============================================================================

struct SqliteStore {
    conn: Connection,
}

impl RecordStore for SqliteStore {
    type Query = SelectBuilder<Sqlite>;
    type Error = rusqlite::Error;

    fn query(&self, table: &str) -> Result<Self::Query, Self::Error> {
        Ok(SelectBuilder::new(Sqlite, table))
    }

    fn find_one(&self, query: Self::Query) -> Result<Option<Record>, Self::Error> {
        let result = query.build();
        let mut stmt = self.conn.prepare(&result.sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(result.params.iter().map(to_sqlite)))?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut record = Record::new();
        for (idx, column) in columns.iter().enumerate() {
            record.insert(column.as_str(), from_sqlite(row.get(idx)?));
        }
        Ok(Some(record))
    }
}

fn store() -> SqliteStore {
    SqliteStore { conn: setup() }
}

fn email_is(email: &str) -> StructuredFilter {
    StructuredFilter::new().with("email", Operator::Eq, Operand::scalar(email))
}

#[test]
fn test_verify_not_exists() {
    let store = store();
    let checker = RecordChecker::new(&store);

    let err = checker
        .verify_not_exists("users", &email_is("alice@example.com"))
        .unwrap_err();
    assert!(matches!(err, ExistenceError::DataExists));
    assert_eq!(err.to_envelope().code, -20_110_002);

    assert!(
        checker
            .verify_not_exists("users", &email_is("nobody@example.com"))
            .is_ok()
    );
}

#[test]
fn test_verify_exists() {
    let store = store();
    let checker = RecordChecker::new(&store);

    assert!(checker.verify_exists("users", &email_is("bob@example.com")).is_ok());
    let err = checker
        .verify_exists("users", &email_is("nobody@example.com"))
        .unwrap_err();
    assert!(matches!(err, ExistenceError::NoRecordsExist));
}

#[test]
fn test_verify_unique() {
    let store = store();
    let checker = RecordChecker::new(&store);
    let data = Record::new()
        .with("email", "alice@example.com")
        .with("name", "Alice");

    // Updating Alice herself
    assert!(checker.verify_unique("users", &Value::Int(1), "email", &data).is_ok());
    assert!(
        checker
            .verify_unique("users", &Value::from("1"), "email,name", &data)
            .is_ok()
    );

    // Another record taking Alice's email
    let err = checker
        .verify_unique("users", &Value::Int(2), "email", &data)
        .unwrap_err();
    assert!(matches!(
        err,
        ExistenceError::FieldAlreadyExists { ref fields } if fields == "email"
    ));
    assert_eq!(err.code(), ErrorCode::CodeAlreadyExists);

    // The combination does not exist
    let data = data.with("name", "Bob");
    assert!(
        checker
            .verify_unique("users", &Value::Int(2), "email,name", &data)
            .is_ok()
    );
}

#[test]
fn test_verify_unique_skips_blank_values() {
    let store = store();
    let data = Record::new().with("email", "").with("name", "0");
    assert!(
        RecordChecker::new(&store)
            .verify_unique("users", &Value::Int(99), "email, name", &data)
            .is_ok()
    );
}

#[test]
fn test_store_errors_surface() {
    let store = store();
    let err = RecordChecker::new(&store)
        .verify_exists("missing_table", &email_is("a@b.c"))
        .unwrap_err();
    assert!(matches!(err, ExistenceError::Store(_)));
    assert_eq!(err.code(), ErrorCode::Internal);
}
