//! Predicate rendering shared by the SQL builder.

use crate::dialect::Dialect;
use crate::operator::Operator;
use crate::types::{Logic, Predicate, Value};

/// Render a group of predicates joined by `logic`.
///
/// A group of more than one predicate is parenthesized so it can be AND-ed
/// with other groups without changing its meaning.
pub(super) fn build_group_impl<D: Dialect>(
    dialect: &D,
    predicates: &[Predicate],
    logic: Logic,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    let mut idx = start_idx;
    let mut all_params = Vec::new();
    let mut conditions = Vec::with_capacity(predicates.len());

    for predicate in predicates {
        let (condition, params, new_idx) = build_predicate_impl(dialect, predicate, idx);
        conditions.push(condition);
        all_params.extend(params);
        idx = new_idx;
    }

    let sql = match conditions.len() {
        1 => conditions.concat(),
        _ => format!("({})", conditions.join(&format!(" {} ", logic.sql()))),
    };

    (sql, all_params, idx)
}

/// Render a single predicate.
pub(super) fn build_predicate_impl<D: Dialect>(
    dialect: &D,
    predicate: &Predicate,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    debug_assert!(predicate.is_well_formed(), "malformed predicate {predicate:?}");
    let field = &predicate.field;
    let idx = start_idx;

    match (predicate.op, &predicate.value) {
        // NULL handling
        (Operator::Eq, Value::Null) => (format!("{field} IS NULL"), vec![], idx),
        (Operator::Neq, Value::Null) => (format!("{field} IS NOT NULL"), vec![], idx),

        // Membership
        (Operator::In, Value::Array(values)) => {
            let (sql, params) = dialect.in_clause(field, values, idx);
            let new_idx = idx + params.len();
            (sql, params, new_idx)
        },
        (Operator::NotIn, Value::Array(values)) => {
            let (sql, params) = dialect.not_in_clause(field, values, idx);
            let new_idx = idx + params.len();
            (sql, params, new_idx)
        },

        // Inclusive ranges take exactly two bounds
        (op @ (Operator::Between | Operator::NotBetween), Value::Array(values)) => {
            let sql = format!(
                "{} {} {} AND {}",
                field,
                op.sql(),
                dialect.param(idx),
                dialect.param(idx + 1)
            );
            (sql, values.clone(), idx + 2)
        },

        (Operator::FindInSet, value) => {
            let sql = dialect.find_in_set(&dialect.param(idx), field);
            (sql, vec![value.clone()], idx + 1)
        },

        // Comparisons and LIKE patterns
        (op, value) => {
            let sql = format!("{} {} {}", field, op.sql(), dialect.param(idx));
            (sql, vec![value.clone()], idx + 1)
        },
    }
}
