//! SELECT query builder.

use crate::dialect::Dialect;
use crate::types::{Logic, Predicate, SortDir, SortField, Value};
use crate::validate::assert_valid_sql_identifier;

use super::QueryBuilder;
use super::predicate::build_group_impl;

/// Query result with SQL and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
enum WhereGroup {
    Predicates(Vec<Predicate>, Logic),
    Raw(String),
}

/// Parameterized `SELECT` builder with dialect support.
///
/// ```
/// use crud_filter::{Logic, Operator, Predicate, QueryBuilder, SelectBuilder, SortDir, Sqlite, Value};
///
/// let mut query = SelectBuilder::new(Sqlite, "users");
/// query.select(&["id", "name"]);
/// query.where_predicates(
///     vec![Predicate { field: "age".into(), op: Operator::Gt, value: Value::Int(18) }],
///     Logic::And,
/// );
/// query.order_by("name", SortDir::Asc);
/// query.limit_offset(20, 40);
///
/// let result = query.build();
/// assert_eq!(
///     result.sql,
///     "SELECT id, name FROM users WHERE age > ?1 ORDER BY name ASC LIMIT 20 OFFSET 40"
/// );
/// assert_eq!(result.params, vec![Value::Int(18)]);
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder<D: Dialect> {
    dialect: D,
    table: String,
    fields: Vec<String>,
    groups: Vec<WhereGroup>,
    sorts: Vec<SortField>,
    limit: Option<u32>,
    offset: Option<u64>,
}

impl<D: Dialect> SelectBuilder<D> {
    /// Create a new query builder for the given table.
    ///
    /// # Panics
    ///
    /// Panics if the table name is not a valid SQL identifier.
    pub fn new(dialect: D, table: impl Into<String>) -> Self {
        let table = table.into();
        assert_valid_sql_identifier(&table, "table");
        Self {
            dialect,
            table,
            fields: Vec::new(),
            groups: Vec::new(),
            sorts: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// The table being queried.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Build the SQL query and parameters.
    pub fn build(&self) -> QueryResult {
        let mut sql = String::new();
        let mut params = Vec::new();
        let mut param_idx = 1usize;

        let select_str = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        sql.push_str(&format!("SELECT {} FROM {}", select_str, self.table));

        if !self.groups.is_empty() {
            let mut conditions = Vec::with_capacity(self.groups.len());
            for group in &self.groups {
                match group {
                    WhereGroup::Predicates(predicates, logic) => {
                        let (condition, new_params, new_idx) =
                            build_group_impl(&self.dialect, predicates, *logic, param_idx);
                        conditions.push(condition);
                        params.extend(new_params);
                        param_idx = new_idx;
                    },
                    WhereGroup::Raw(expr) => conditions.push(format!("({expr})")),
                }
            }
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if !self.sorts.is_empty() {
            let sort_parts: Vec<String> = self
                .sorts
                .iter()
                .map(|s| format!("{} {}", s.field, s.dir.sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&sort_parts.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        QueryResult { sql, params }
    }
}

impl<D: Dialect> QueryBuilder for SelectBuilder<D> {
    /// # Panics
    ///
    /// Panics if any column name is not a valid SQL identifier.
    fn select(&mut self, columns: &[&str]) {
        for column in columns {
            assert_valid_sql_identifier(column, "field");
        }
        self.fields = columns.iter().map(|s| (*s).to_string()).collect();
    }

    /// # Panics
    ///
    /// Panics if any predicate field is not a valid SQL identifier, or if a
    /// range or membership predicate does not carry its bounds or members.
    fn where_predicates(&mut self, predicates: Vec<Predicate>, logic: Logic) {
        if predicates.is_empty() {
            return;
        }
        for predicate in &predicates {
            assert_valid_sql_identifier(&predicate.field, "filter field");
            assert!(
                predicate.is_well_formed(),
                "Malformed {} predicate on {}",
                predicate.op,
                predicate.field
            );
        }
        self.groups.push(WhereGroup::Predicates(predicates, logic));
    }

    fn where_raw(&mut self, expr: String) {
        if !expr.trim().is_empty() {
            self.groups.push(WhereGroup::Raw(expr));
        }
    }

    /// # Panics
    ///
    /// Panics if the field name is not a valid SQL identifier.
    fn order_by(&mut self, field: &str, dir: SortDir) {
        assert_valid_sql_identifier(field, "sort field");
        self.sorts.push(SortField::new(field, dir));
    }

    fn limit_offset(&mut self, limit: u32, offset: u64) {
        self.limit = Some(limit);
        self.offset = Some(offset);
    }

    fn quote_literal(&self, text: &str) -> String {
        self.dialect.quote_literal(text)
    }

    fn find_in_set_sql(&self, needle: &str, column: &str) -> String {
        self.dialect.find_in_set(needle, column)
    }
}
