//! Order descriptor validation and application.

use miniserde::json::{Object, Value as JsonValue};

use super::column::is_valid_sql_identifier;
use crate::builder::QueryBuilder;
use crate::error::{Coded, OrderError};
use crate::limits::Limits;
use crate::types::{AllowedFields, OrderDescriptor, SortDir, SortField};

/// Parse an order descriptor under the process limits.
///
/// `null` and `[]` are both the empty order. Each entry is
/// `{"field": "...", "order": "asc" | "desc"}`; `direction` is accepted in
/// place of `order`.
///
/// ```
/// use crud_filter::{SortDir, json, parse_order};
///
/// let raw: json::Value =
///     json::from_str(r#"[{"field": "created_at", "order": "DESC"}, {"field": "id", "direction": "asc"}]"#)
///         .unwrap();
/// let order = parse_order(&raw).unwrap();
/// assert_eq!(order.fields()[0].dir, SortDir::Desc);
/// assert_eq!(order.fields()[1].field, "id");
/// ```
pub fn parse_order(raw: &JsonValue) -> Result<OrderDescriptor, OrderError> {
    OrderDescriptor::from_json(raw, &Limits::from_env())
}

/// Validate an order descriptor under the process limits.
pub fn validate_order(raw: &JsonValue) -> Result<(), OrderError> {
    parse_order(raw).map(drop)
}

/// Add each sort key to the builder, primary key first.
pub fn apply_order<B: QueryBuilder + ?Sized>(order: &OrderDescriptor, builder: &mut B) {
    for sort in order.fields() {
        builder.order_by(&sort.field, sort.dir);
    }
}

fn log_rejection(err: &OrderError) {
    tracing::debug!(code = %err.code(), field = err.field(), error = %err, "order rejected");
}

impl OrderDescriptor {
    /// Parse an order descriptor under explicit limits.
    pub fn from_json(raw: &JsonValue, limits: &Limits) -> Result<Self, OrderError> {
        let entries = match raw {
            JsonValue::Null => return Ok(Self::default()),
            JsonValue::Array(entries) => entries,
            _ => return Err(OrderError::NotAnArray).inspect_err(log_rejection),
        };

        let max = limits.order_fields_limit();
        if entries.len() > max {
            return Err(OrderError::TooManyFields { max }).inspect_err(log_rejection);
        }

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .inspect_err(log_rejection)
    }

    /// Parse a `name,-created_at` sort string; a `-` prefix sorts
    /// descending. Blank segments are skipped.
    pub fn parse_sort_string(
        sort: &str,
        allowed: &AllowedFields,
        limits: &Limits,
    ) -> Result<Self, OrderError> {
        let mut fields = Vec::new();

        for part in sort.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, dir) = match part.strip_prefix('-') {
                Some(stripped) => (stripped, SortDir::Desc),
                None => (part, SortDir::Asc),
            };
            if !is_valid_sql_identifier(field) {
                return Err(OrderError::InvalidFieldName {
                    field: field.to_string(),
                });
            }
            fields.push(SortField::new(field, dir));
        }

        let max = limits.order_fields_limit();
        if fields.len() > max {
            return Err(OrderError::TooManyFields { max });
        }

        let order = Self(fields);
        order.check_allowed(allowed)?;
        Ok(order)
    }

    /// Reject sort keys outside `allowed`; an empty set allows any.
    pub fn check_allowed(&self, allowed: &AllowedFields) -> Result<(), OrderError> {
        if allowed.is_empty() {
            return Ok(());
        }
        match self.fields().iter().find(|s| !allowed.contains(&s.field)) {
            Some(sort) => Err(OrderError::FieldNotAllowed {
                field: sort.field.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn parse_entry(index: usize, entry: &JsonValue) -> Result<SortField, OrderError> {
    let JsonValue::Object(entry) = entry else {
        return Err(OrderError::MalformedEntry { index });
    };

    let field = string_key(entry, "field")
        .filter(|f| !f.is_empty())
        .ok_or(OrderError::MalformedEntry { index })?;
    let dir = string_key(entry, "order")
        .or_else(|| string_key(entry, "direction"))
        .and_then(SortDir::parse)
        .ok_or(OrderError::MalformedEntry { index })?;

    if !is_valid_sql_identifier(field) {
        return Err(OrderError::InvalidFieldName {
            field: field.to_string(),
        });
    }

    Ok(SortField::new(field, dir))
}

fn string_key<'a>(entry: &'a Object, key: &str) -> Option<&'a str> {
    match entry.get(key) {
        Some(JsonValue::String(s)) => Some(s.as_str()),
        _ => None,
    }
}
