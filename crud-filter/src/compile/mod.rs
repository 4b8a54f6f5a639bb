//! Filter compilation.
//!
//! A structured filter becomes one predicate group on the builder. A
//! templated filter becomes one raw boolean expression: each condition is
//! rendered as a literal fragment (`= 5`, `IN (1,2,3)`) and substituted for
//! its `{key}` placeholder.

mod template;

use std::collections::HashMap;

use crate::builder::QueryBuilder;
use crate::error::{CompileError, Coded};
use crate::types::{FilterDescriptor, StructuredFilter, TemplatedFilter};

/// Write a validated filter onto `builder`.
///
/// Empty filters add nothing. Compiling the same descriptor twice produces
/// identical output.
///
/// # Example
///
/// ```
/// use crud_filter::{
///     AllowedFields, FilterMode, QueryBuilder, SelectBuilder, Sqlite, Value, compile_filter, json,
///     parse_filter,
/// };
///
/// let raw: json::Value = json::from_str(r#"{"age": ["gt", 18], "name": ["eq", "Al"]}"#).unwrap();
/// let filter = parse_filter(&raw, FilterMode::Structured, &AllowedFields::default()).unwrap();
///
/// let mut query = SelectBuilder::new(Sqlite, "users");
/// compile_filter(&filter, &mut query).unwrap();
///
/// let result = query.build();
/// assert_eq!(result.sql, "SELECT * FROM users WHERE (age > ?1 AND name = ?2)");
/// assert_eq!(result.params, vec![Value::Int(18), Value::String("Al".into())]);
/// ```
pub fn compile_filter<B: QueryBuilder + ?Sized>(
    filter: &FilterDescriptor,
    builder: &mut B,
) -> Result<(), CompileError> {
    let compiled = match filter {
        FilterDescriptor::Structured(filter) => compile_structured(filter, builder),
        FilterDescriptor::Templated(filter) => compile_templated(filter, builder),
    };

    compiled.inspect_err(|err| {
        tracing::debug!(code = %err.code(), field = err.field(), error = %err, "filter did not compile");
    })
}

pub(crate) fn compile_structured<B: QueryBuilder + ?Sized>(
    filter: &StructuredFilter,
    builder: &mut B,
) -> Result<(), CompileError> {
    if filter.is_empty() {
        return Ok(());
    }

    let predicates = filter
        .conditions
        .iter()
        .map(|c| c.op.predicate(&c.field, &c.operand))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        predicates = predicates.len(),
        logic = filter.logic.sql(),
        "compiled structured filter"
    );
    builder.where_predicates(predicates, filter.logic);
    Ok(())
}

fn compile_templated<B: QueryBuilder + ?Sized>(
    filter: &TemplatedFilter,
    builder: &mut B,
) -> Result<(), CompileError> {
    if filter.is_empty() {
        return Ok(());
    }

    let mut fragments = HashMap::with_capacity(filter.fields.len());
    for condition in &filter.fields {
        let fragment = condition
            .op
            .fragment(condition.column(), &condition.operand, &*builder)?;
        fragments.insert(condition.field.as_str(), fragment);
    }

    let expr = template::substitute(&filter.template, &fragments)?;

    let unused: Vec<&str> = fragments
        .keys()
        .copied()
        .filter(|key| !filter.template.contains(&format!("{{{key}}}")))
        .collect();
    if !unused.is_empty() {
        tracing::debug!(?unused, "template leaves filter fields unused");
    }

    builder.where_raw(expr);
    Ok(())
}
