//! A builder that records calls instead of rendering SQL.

use crate::types::{Logic, Predicate, SortDir, SortField};

use super::QueryBuilder;

/// Everything written onto a builder, in call order per clause.
///
/// Useful for record stores backed by something other than SQL, and for
/// asserting what a compilation step produced.
///
/// ```
/// use crud_filter::{QueryBuilder, QueryPlan, SortDir};
///
/// let mut plan = QueryPlan::default();
/// plan.order_by("name", SortDir::Asc);
/// plan.limit_offset(20, 0);
///
/// assert_eq!(plan.sorts.len(), 1);
/// assert_eq!(plan.limit, Some(20));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPlan {
    /// Selected columns; empty means all.
    pub columns: Vec<String>,
    /// Structured predicate groups with their combinator.
    pub predicates: Vec<(Vec<Predicate>, Logic)>,
    /// Raw boolean expressions.
    pub raw: Vec<String>,
    /// Sort keys.
    pub sorts: Vec<SortField>,
    /// Row limit.
    pub limit: Option<u32>,
    /// Row offset.
    pub offset: Option<u64>,
}

impl QueryPlan {
    /// Whether no filter was added.
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty() && self.raw.is_empty()
    }
}

impl QueryBuilder for QueryPlan {
    fn select(&mut self, columns: &[&str]) {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
    }

    fn where_predicates(&mut self, predicates: Vec<Predicate>, logic: Logic) {
        self.predicates.push((predicates, logic));
    }

    fn where_raw(&mut self, expr: String) {
        self.raw.push(expr);
    }

    fn order_by(&mut self, field: &str, dir: SortDir) {
        self.sorts.push(SortField::new(field, dir));
    }

    fn limit_offset(&mut self, limit: u32, offset: u64) {
        self.limit = Some(limit);
        self.offset = Some(offset);
    }
}
