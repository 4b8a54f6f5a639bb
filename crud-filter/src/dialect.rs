//! SQL dialect implementations for Postgres, `SQLite` and `MySQL`.
//!
//! Each dialect handles the specific syntax differences between databases:
//! parameter placeholders, membership lists, string literal escaping and the
//! comma-separated set membership test.

use crate::types::Value;

/// SQL dialect trait for database-specific syntax.
pub trait Dialect: Clone + Copy {
    /// Format a parameter placeholder (e.g., `$1` for Postgres, `?1` for `SQLite`).
    fn param(&self, idx: usize) -> String;

    /// Format an IN clause with multiple values.
    /// Returns the SQL fragment and the parameters it binds.
    fn in_clause(&self, field: &str, values: &[Value], start_idx: usize) -> (String, Vec<Value>);

    /// Format a NOT IN clause.
    fn not_in_clause(
        &self,
        field: &str,
        values: &[Value],
        start_idx: usize,
    ) -> (String, Vec<Value>);

    /// Test whether `needle` (a placeholder or literal) is a member of the
    /// comma-separated set stored in `column`.
    fn find_in_set(&self, needle: &str, column: &str) -> String;

    /// Quote a string literal for direct inclusion in SQL text.
    fn quote_literal(&self, text: &str) -> String {
        quote_standard(text)
    }
}

/// Standard SQL string literal: single quotes, embedded quotes doubled.
pub(crate) fn quote_standard(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn expanded_list(
    field: &str,
    keyword: &str,
    values: &[Value],
    placeholder: impl Fn(usize) -> String,
    start_idx: usize,
) -> (String, Vec<Value>) {
    let placeholders: Vec<String> = (0..values.len())
        .map(|i| placeholder(start_idx + i))
        .collect();
    let sql = format!("{} {} ({})", field, keyword, placeholders.join(", "));
    (sql, values.to_vec())
}

/// Postgres dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    #[inline]
    fn param(&self, idx: usize) -> String {
        format!("${idx}")
    }

    fn in_clause(&self, field: &str, values: &[Value], start_idx: usize) -> (String, Vec<Value>) {
        // Postgres: field = ANY($1) with array parameter
        let sql = format!("{field} = ANY(${start_idx})");
        (sql, vec![Value::Array(values.to_vec())])
    }

    fn not_in_clause(
        &self,
        field: &str,
        values: &[Value],
        start_idx: usize,
    ) -> (String, Vec<Value>) {
        let sql = format!("{field} != ALL(${start_idx})");
        (sql, vec![Value::Array(values.to_vec())])
    }

    #[inline]
    fn find_in_set(&self, needle: &str, column: &str) -> String {
        format!("{needle} = ANY(string_to_array({column}, ','))")
    }
}

/// `SQLite` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    #[inline]
    fn param(&self, idx: usize) -> String {
        format!("?{idx}")
    }

    fn in_clause(&self, field: &str, values: &[Value], start_idx: usize) -> (String, Vec<Value>) {
        // SQLite: field IN (?1, ?2, ?3) with expanded parameters
        expanded_list(field, "IN", values, |i| self.param(i), start_idx)
    }

    fn not_in_clause(
        &self,
        field: &str,
        values: &[Value],
        start_idx: usize,
    ) -> (String, Vec<Value>) {
        expanded_list(field, "NOT IN", values, |i| self.param(i), start_idx)
    }

    #[inline]
    fn find_in_set(&self, needle: &str, column: &str) -> String {
        format!("instr(',' || {column} || ',', ',' || {needle} || ',') > 0")
    }
}

/// `MySQL` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    #[inline]
    fn param(&self, _idx: usize) -> String {
        // MySQL placeholders are positional only
        "?".to_string()
    }

    fn in_clause(&self, field: &str, values: &[Value], start_idx: usize) -> (String, Vec<Value>) {
        expanded_list(field, "IN", values, |i| self.param(i), start_idx)
    }

    fn not_in_clause(
        &self,
        field: &str,
        values: &[Value],
        start_idx: usize,
    ) -> (String, Vec<Value>) {
        expanded_list(field, "NOT IN", values, |i| self.param(i), start_idx)
    }

    #[inline]
    fn find_in_set(&self, needle: &str, column: &str) -> String {
        format!("FIND_IN_SET({needle}, {column})")
    }

    fn quote_literal(&self, text: &str) -> String {
        // Backslash is an escape character in MySQL string literals
        quote_standard(&text.replace('\\', "\\\\"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params() {
        assert_eq!(Postgres.param(1), "$1");
        assert_eq!(Postgres.param(10), "$10");
        assert_eq!(Sqlite.param(1), "?1");
        assert_eq!(Sqlite.param(10), "?10");
        assert_eq!(MySql.param(3), "?");
    }

    #[test]
    fn test_postgres_in_clause() {
        let values = vec![Value::String("a".into()), Value::String("b".into())];
        let (sql, params) = Postgres.in_clause("status", &values, 1);

        assert_eq!(sql, "status = ANY($1)");
        assert_eq!(params.len(), 1); // Single array param
    }

    #[test]
    fn test_postgres_not_in_clause() {
        let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        let (sql, params) = Postgres.not_in_clause("id", &values, 4);

        assert_eq!(sql, "id != ALL($4)");
        assert_eq!(params, vec![Value::Array(values)]);
    }

    #[test]
    fn test_sqlite_in_clause() {
        let values = vec![Value::String("a".into()), Value::String("b".into())];
        let (sql, params) = Sqlite.in_clause("status", &values, 1);

        assert_eq!(sql, "status IN (?1, ?2)");
        assert_eq!(params.len(), 2); // Expanded params
    }

    #[test]
    fn test_sqlite_not_in_clause_with_offset() {
        let values = vec![Value::Int(1), Value::Int(2)];
        let (sql, params) = Sqlite.not_in_clause("id", &values, 5);

        assert_eq!(sql, "id NOT IN (?5, ?6)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_mysql_in_clause() {
        let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        let (sql, params) = MySql.in_clause("status", &values, 1);

        assert_eq!(sql, "status IN (?, ?, ?)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_find_in_set() {
        assert_eq!(
            Postgres.find_in_set("$1", "tags"),
            "$1 = ANY(string_to_array(tags, ','))"
        );
        assert_eq!(
            Sqlite.find_in_set("?1", "tags"),
            "instr(',' || tags || ',', ',' || ?1 || ',') > 0"
        );
        assert_eq!(MySql.find_in_set("?", "tags"), "FIND_IN_SET(?, tags)");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(Postgres.quote_literal("it's"), "'it''s'");
        assert_eq!(Sqlite.quote_literal("plain"), "'plain'");
        assert_eq!(MySql.quote_literal(r"a\' OR 1=1"), r"'a\\'' OR 1=1'");
    }
}
