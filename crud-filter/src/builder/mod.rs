//! Query builder capability and the bundled SQL implementation.
//!
//! Compilation never talks to a database. It writes onto a [`QueryBuilder`],
//! which a record store (or an ORM adapter) turns into an executable query.
//! [`SelectBuilder`] renders parameterized `SELECT` statements for the
//! Postgres, `SQLite` and `MySQL` dialects; [`QueryPlan`] only records what
//! was asked of it.

mod plan;
mod predicate;
mod select;

pub use plan::QueryPlan;
pub use select::{QueryResult, SelectBuilder};

use crate::dialect::quote_standard;
use crate::types::{Logic, Predicate, SortDir};

/// Sink for compiled selections, filters, sort keys and page windows.
///
/// Calls accumulate: every `where_*` call adds one group that is AND-ed with
/// the groups before it, and `order_by` calls append sort keys in order.
pub trait QueryBuilder {
    /// Restrict the selected columns.
    fn select(&mut self, columns: &[&str]);

    /// Add structured predicates combined with `logic`.
    fn where_predicates(&mut self, predicates: Vec<Predicate>, logic: Logic);

    /// Add a raw boolean expression produced by a templated filter.
    fn where_raw(&mut self, expr: String);

    /// Append a sort key.
    fn order_by(&mut self, field: &str, dir: SortDir);

    /// Set the row window.
    fn limit_offset(&mut self, limit: u32, offset: u64);

    /// Quote a string for a raw expression. Standard SQL by default.
    fn quote_literal(&self, text: &str) -> String {
        quote_standard(text)
    }

    /// Raw set-membership test of `needle` against a comma-separated
    /// `column`. `FIND_IN_SET` by default.
    fn find_in_set_sql(&self, needle: &str, column: &str) -> String {
        format!("FIND_IN_SET({needle}, {column})")
    }
}

impl<B: QueryBuilder + ?Sized> QueryBuilder for &mut B {
    fn select(&mut self, columns: &[&str]) {
        (**self).select(columns);
    }

    fn where_predicates(&mut self, predicates: Vec<Predicate>, logic: Logic) {
        (**self).where_predicates(predicates, logic);
    }

    fn where_raw(&mut self, expr: String) {
        (**self).where_raw(expr);
    }

    fn order_by(&mut self, field: &str, dir: SortDir) {
        (**self).order_by(field, dir);
    }

    fn limit_offset(&mut self, limit: u32, offset: u64) {
        (**self).limit_offset(limit, offset);
    }

    fn quote_literal(&self, text: &str) -> String {
        (**self).quote_literal(text)
    }

    fn find_in_set_sql(&self, needle: &str, column: &str) -> String {
        (**self).find_in_set_sql(needle, column)
    }
}
