//! Snapshot tests of rendered SQL.
//!
//! To update snapshots after intentional changes:
//! ```bash
//! cargo insta test --accept
//! ```

use crud_filter::prelude::*;
use crud_filter::Dialect;
use insta::assert_snapshot;

fn raw(s: &str) -> json::Value {
    json::from_str(s).unwrap()
}

fn render<D: Dialect>(dialect: D, filter: &str, mode: FilterMode, allowed: &[&str]) -> String {
    let filter = parse_filter(&raw(filter), mode, &AllowedFields::new(allowed)).unwrap();
    let mut query = SelectBuilder::new(dialect, "users");
    compile_filter(&filter, &mut query).unwrap();
    query.build().sql
}

const STRUCTURED: &str = r#"{
    "age": ["between", [18, 65]],
    "name": ["like", "al"],
    "status": ["not_in", "3,4"],
    "tags": ["find_in_set", "rust"]
}"#;

#[test]
fn snapshot_structured_postgres() {
    assert_snapshot!(
        render(Postgres, STRUCTURED, FilterMode::Structured, &[]),
        @"SELECT * FROM users WHERE (age BETWEEN $1 AND $2 AND name LIKE $3 AND status != ALL($4) AND $5 = ANY(string_to_array(tags, ',')))"
    );
}

#[test]
fn snapshot_structured_sqlite() {
    assert_snapshot!(
        render(Sqlite, STRUCTURED, FilterMode::Structured, &[]),
        @"SELECT * FROM users WHERE (age BETWEEN ?1 AND ?2 AND name LIKE ?3 AND status NOT IN (?4, ?5) AND instr(',' || tags || ',', ',' || ?6 || ',') > 0)"
    );
}

#[test]
fn snapshot_structured_mysql() {
    assert_snapshot!(
        render(MySql, STRUCTURED, FilterMode::Structured, &[]),
        @"SELECT * FROM users WHERE (age BETWEEN ? AND ? AND name LIKE ? AND status NOT IN (?, ?) AND FIND_IN_SET(?, tags))"
    );
}

#[test]
fn snapshot_structured_or() {
    assert_snapshot!(
        render(
            Postgres,
            r#"{"age": ["lte", 12], "name": ["neq", "root"], "_logic": "or"}"#,
            FilterMode::Structured,
            &[],
        ),
        @"SELECT * FROM users WHERE (age <= $1 OR name <> $2)"
    );
}

const TEMPLATED: &str = r#"{
    "fields": {
        "age": ["not_between", [18, "65"]],
        "name": ["eq", "O'Brien"],
        "name#2": ["not_like", "x"],
        "tags": ["find_in_set", "rust"]
    },
    "template": "(age {age} or name {name}) and (name {name#2} or {tags})"
}"#;

#[test]
fn snapshot_templated_postgres() {
    assert_snapshot!(
        render(Postgres, TEMPLATED, FilterMode::Templated, &["age", "name", "tags"]),
        @"SELECT * FROM users WHERE ((age NOT BETWEEN 18 AND '65' or name = 'O''Brien') and (name NOT LIKE '%x%' or 'rust' = ANY(string_to_array(tags, ','))))"
    );
}

#[test]
fn snapshot_templated_mysql() {
    assert_snapshot!(
        render(MySql, TEMPLATED, FilterMode::Templated, &["age", "name", "tags"]),
        @"SELECT * FROM users WHERE ((age NOT BETWEEN 18 AND '65' or name = 'O''Brien') and (name NOT LIKE '%x%' or FIND_IN_SET('rust', tags)))"
    );
}

#[test]
fn snapshot_list_query() {
    let list = ListQuery::from_json(
        &raw(
            r#"{
                "fields": ["id", "name", "created_at"],
                "filter": {"status": ["in", [1, 2]]},
                "order": [{"field": "created_at", "order": "desc"}, {"field": "id", "order": "asc"}],
                "page": ["4", 25]
            }"#,
        ),
        FilterMode::Structured,
        &AllowedFields::default(),
        &Limits::new(),
    )
    .unwrap();

    let mut query = SelectBuilder::new(Sqlite, "posts");
    list.apply(&mut query).unwrap();
    assert_snapshot!(
        query.build().sql,
        @"SELECT id, name, created_at FROM posts WHERE status IN (?1, ?2) ORDER BY created_at DESC, id ASC LIMIT 25 OFFSET 75"
    );
}

#[test]
fn snapshot_error_envelopes() {
    let filter_err = parse_filter(
        &raw(r#"{"age": ["between", [1]]}"#),
        FilterMode::Structured,
        &AllowedFields::default(),
    )
    .unwrap_err();
    assert_snapshot!(
        filter_err.to_envelope().to_json(),
        @r#"{"code":-20110005,"msg":"The age field query parameter must be an array with a length equal to 2.","data":["age"]}"#
    );

    let payload_err = ensure_update_fields(&Record::new().with("id", 1)).unwrap_err();
    assert_snapshot!(payload_err.to_envelope().code.to_string(), @"-400000");
}
