//! Filter descriptor validation.
//!
//! Raw descriptors arrive as JSON from the transport layer. Parsing turns
//! them into a typed [`FilterDescriptor`], coercing operands to the shape
//! their operator needs; validation then checks field names, the allowed
//! set and (for templates) the character allowlist. Both stop at the first
//! violation.

use std::collections::HashSet;

use miniserde::json::{Object, Value as JsonValue};

use super::column::is_valid_sql_identifier;
use super::template::{check_template, placeholder_follows_column};
use crate::error::{Coded, FilterError};
use crate::operator::{OperandKind, Operator};
use crate::types::{
    AllowedFields, Condition, FilterDescriptor, FilterMode, Logic, Operand, Scalar,
    StructuredFilter, TemplatedFilter, strip_suffix,
};

/// Reserved structured-mode key holding the global combinator.
pub const LOGIC_KEY: &str = "_logic";

/// Parse and validate a raw filter descriptor.
///
/// # Example
///
/// ```
/// use crud_filter::{AllowedFields, FilterDescriptor, FilterMode, Logic, json, parse_filter};
///
/// let raw: json::Value =
///     json::from_str(r#"{"age": ["gt", "18"], "name": ["like", "Al"], "_logic": "or"}"#).unwrap();
/// let filter = parse_filter(&raw, FilterMode::Structured, &AllowedFields::default()).unwrap();
///
/// let FilterDescriptor::Structured(filter) = filter else { unreachable!() };
/// assert_eq!(filter.logic, Logic::Or);
/// assert_eq!(filter.conditions.len(), 2);
/// ```
pub fn parse_filter(
    raw: &JsonValue,
    mode: FilterMode,
    allowed: &AllowedFields,
) -> Result<FilterDescriptor, FilterError> {
    let parsed = match mode {
        FilterMode::Structured => parse_structured(raw).map(FilterDescriptor::Structured),
        FilterMode::Templated => parse_templated(raw).map(FilterDescriptor::Templated),
    };

    parsed
        .and_then(|descriptor| descriptor.validate(allowed).map(|()| descriptor))
        .inspect_err(log_rejection)
}

/// Validate a raw filter descriptor without keeping the parsed form.
pub fn validate_filter(
    raw: &JsonValue,
    mode: FilterMode,
    allowed: &AllowedFields,
) -> Result<(), FilterError> {
    parse_filter(raw, mode, allowed).map(drop)
}

fn log_rejection(err: &FilterError) {
    tracing::debug!(code = %err.code(), field = err.field(), error = %err, "filter rejected");
}

fn parse_structured(raw: &JsonValue) -> Result<StructuredFilter, FilterError> {
    let obj = as_object(raw)?;
    let mut filter = StructuredFilter::new();

    for (key, value) in obj.iter() {
        if key == LOGIC_KEY {
            filter.logic = match value {
                JsonValue::String(token) => Logic::from_token(token),
                _ => None,
            }
            .ok_or(FilterError::InvalidLogic)?;
            continue;
        }
        filter.conditions.push(parse_condition(key, value)?);
    }

    Ok(filter)
}

fn parse_templated(raw: &JsonValue) -> Result<TemplatedFilter, FilterError> {
    let obj = as_object(raw)?;
    if obj.is_empty() {
        return Ok(TemplatedFilter::default());
    }

    let template = match obj.get("template") {
        Some(JsonValue::String(template)) => template.clone(),
        Some(JsonValue::Null) | None => String::new(),
        Some(_) => return Err(FilterError::TemplateNotString),
    };
    let fields = match obj.get("fields") {
        Some(JsonValue::Object(fields)) if !fields.is_empty() => fields,
        _ => return Err(FilterError::MissingTemplateParts),
    };
    if template.trim().is_empty() {
        return Err(FilterError::MissingTemplateParts);
    }

    let mut filter = TemplatedFilter::new(template);
    for (key, value) in fields.iter() {
        filter.fields.push(parse_condition(key, value)?);
    }
    Ok(filter)
}

fn as_object(raw: &JsonValue) -> Result<&Object, FilterError> {
    match raw {
        JsonValue::Object(obj) => Ok(obj),
        _ => Err(FilterError::NotAnObject),
    }
}

/// Parse one `[operator, operand]` entry.
fn parse_condition(field: &str, raw: &JsonValue) -> Result<Condition, FilterError> {
    let malformed = || FilterError::MalformedCondition {
        field: field.to_string(),
    };

    let JsonValue::Array(entry) = raw else {
        return Err(malformed());
    };
    let [token, operand] = entry.as_slice() else {
        return Err(malformed());
    };
    let JsonValue::String(token) = token else {
        return Err(malformed());
    };

    let op = Operator::from_token(token).ok_or_else(|| FilterError::UnknownOperator {
        field: field.to_string(),
        token: token.clone(),
    })?;
    let operand = parse_operand(field, op, operand)?;

    Ok(Condition::new(field, op, operand))
}

fn parse_operand(field: &str, op: Operator, raw: &JsonValue) -> Result<Operand, FilterError> {
    let field = || field.to_string();

    match op.operand_kind() {
        OperandKind::Numeric => Scalar::from_json(raw)
            .and_then(|s| s.to_number())
            .map(Operand::Scalar)
            .ok_or_else(|| FilterError::ExpectedNumber { field: field() }),
        OperandKind::Text => Scalar::from_json(raw)
            .map(Operand::Scalar)
            .ok_or_else(|| FilterError::ExpectedNumberOrString { field: field() }),
        OperandKind::Pair => match raw {
            JsonValue::Array(items) => match items.as_slice() {
                [low, high] => Scalar::from_json(low)
                    .zip(Scalar::from_json(high))
                    .map(|(low, high)| Operand::Pair(low, high)),
                _ => None,
            },
            _ => None,
        }
        .ok_or_else(|| FilterError::ExpectedPair { field: field() }),
        OperandKind::List => match raw {
            JsonValue::String(csv) => Some(Operand::csv(csv)),
            JsonValue::Array(items) => items
                .iter()
                .map(Scalar::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Operand::List),
            _ => None,
        }
        .ok_or_else(|| FilterError::ExpectedList { field: field() }),
    }
}

/// Check an operand against the shape its operator accepts.
fn check_operand(condition: &Condition) -> Result<(), FilterError> {
    let field = || condition.field.clone();

    match (condition.op.operand_kind(), &condition.operand) {
        (OperandKind::Numeric, Operand::Scalar(s)) if s.is_numeric() => Ok(()),
        (OperandKind::Numeric, _) => Err(FilterError::ExpectedNumber { field: field() }),
        (OperandKind::Text, Operand::Scalar(_)) => Ok(()),
        (OperandKind::Text, _) => Err(FilterError::ExpectedNumberOrString { field: field() }),
        (OperandKind::Pair, Operand::Pair(..)) => Ok(()),
        (OperandKind::Pair, _) => Err(FilterError::ExpectedPair { field: field() }),
        (OperandKind::List, Operand::List(items)) if !items.is_empty() => Ok(()),
        (OperandKind::List, _) => Err(FilterError::ExpectedList { field: field() }),
    }
}

/// Whether `key` is a column name with an optional `#n` suffix.
fn is_valid_template_key(key: &str) -> bool {
    match key.split_once('#') {
        Some((column, suffix)) => {
            is_valid_sql_identifier(column)
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_digit())
        },
        None => is_valid_sql_identifier(key),
    }
}

impl FilterDescriptor {
    /// Validate a typed descriptor against the caller's allowed fields.
    ///
    /// Hand-built descriptors go through the same checks as parsed ones.
    pub fn validate(&self, allowed: &AllowedFields) -> Result<(), FilterError> {
        match self {
            Self::Structured(filter) => filter.validate(allowed),
            Self::Templated(filter) => filter.validate(allowed),
        }
    }
}

impl StructuredFilter {
    /// Validate field names and operands. An empty allowed set permits any
    /// valid column name.
    pub fn validate(&self, allowed: &AllowedFields) -> Result<(), FilterError> {
        let mut seen = HashSet::with_capacity(self.conditions.len());

        for condition in &self.conditions {
            let field = condition.field.as_str();
            if !is_valid_sql_identifier(field) {
                return Err(FilterError::InvalidFieldName {
                    field: field.to_string(),
                });
            }
            if !allowed.is_empty() && !allowed.contains(field) {
                return Err(FilterError::FieldNotAllowed {
                    field: field.to_string(),
                });
            }
            if !seen.insert(field) {
                return Err(FilterError::DuplicateField {
                    field: field.to_string(),
                });
            }
            check_operand(condition)?;
        }

        Ok(())
    }
}

impl TemplatedFilter {
    /// Validate keys, operands and the template allowlist. A non-empty
    /// templated filter needs a non-empty allowed set.
    pub fn validate(&self, allowed: &AllowedFields) -> Result<(), FilterError> {
        if self.is_empty() {
            return Ok(());
        }
        if allowed.is_empty() {
            return Err(FilterError::FieldsNotSpecified);
        }
        if self.fields.is_empty() || self.template.trim().is_empty() {
            return Err(FilterError::MissingTemplateParts);
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for condition in &self.fields {
            let key = condition.field.as_str();
            if !is_valid_template_key(key) {
                return Err(FilterError::InvalidFieldName {
                    field: key.to_string(),
                });
            }
            if !allowed.contains(strip_suffix(key)) {
                return Err(FilterError::FieldNotAllowed {
                    field: key.to_string(),
                });
            }
            if !seen.insert(key) {
                return Err(FilterError::DuplicateField {
                    field: key.to_string(),
                });
            }
            check_operand(condition)?;
        }

        check_template(&self.template, allowed)?;

        // find_in_set fragments already name their column
        let repeated = self.fields.iter().find(|c| {
            c.op == Operator::FindInSet
                && placeholder_follows_column(&self.template, &c.field, c.column())
        });
        match repeated {
            Some(condition) => Err(FilterError::SetColumnRepeated {
                field: condition.field.clone(),
            }),
            None => Ok(()),
        }
    }
}
